// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper acting as the remote (authoritative) record store.
//!
//! Documents live at `users/{uid}` with fields `email`, `last_latitude`
//! and `last_longitude`.

use crate::db::{collections, RecordStore};
use crate::error::StoreError;
use crate::models::{PositionFix, UserRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stored shape of a user document (the uid is the document ID).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    email: String,
    #[serde(default)]
    last_latitude: f64,
    #[serde(default)]
    last_longitude: f64,
}

/// Field-masked location write.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocationFields {
    last_latitude: f64,
    last_longitude: f64,
}

const LOCATION_FIELD_MASK: [&str; 2] = ["last_latitude", "last_longitude"];

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation fails with [`StoreError::Offline`].
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or(StoreError::Offline)
    }
}

fn map_firestore_error(uid: &str, err: firestore::errors::FirestoreError) -> StoreError {
    match err {
        firestore::errors::FirestoreError::DataNotFoundError(_) => {
            StoreError::NotFound(uid.to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}

#[async_trait]
impl RecordStore for FirestoreDb {
    fn name(&self) -> &'static str {
        "firestore"
    }

    /// Write a fresh `users/{uid}` document, replacing anything already there.
    async fn create_record(&self, email: &str, uid: &str) -> Result<(), StoreError> {
        let doc = UserDocument {
            email: email.to_string(),
            last_latitude: 0.0,
            last_longitude: 0.0,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| map_firestore_error(uid, e))?;

        tracing::debug!(uid, "Created Firestore user document");
        Ok(())
    }

    /// Update only the location fields; requires the document to exist.
    async fn update_location(&self, uid: &str, fix: PositionFix) -> Result<(), StoreError> {
        let fields = LocationFields {
            last_latitude: fix.latitude,
            last_longitude: fix.longitude,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(LOCATION_FIELD_MASK)
            .in_col(collections::USERS)
            .precondition(firestore::FirestoreWritePrecondition::Exists(true))
            .document_id(uid)
            .object(&fields)
            .execute()
            .await
            .map_err(|e| map_firestore_error(uid, e))?;

        Ok(())
    }

    async fn get_record(&self, uid: &str) -> Result<UserRecord, StoreError> {
        let doc: Option<UserDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| map_firestore_error(uid, e))?;

        let doc = doc.ok_or_else(|| StoreError::NotFound(uid.to_string()))?;

        Ok(UserRecord {
            uid: uid.to_string(),
            email: doc.email,
            last_latitude: doc.last_latitude,
            last_longitude: doc.last_longitude,
        })
    }
}

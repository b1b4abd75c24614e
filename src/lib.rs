// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Location-Sync: authenticate a user, track device location, and keep the
//! user's record in step across a remote and an on-device store.
//!
//! This crate provides the synchronization and flow-orchestration core; the
//! platform sensor, identity provider and presentation are collaborators.

pub mod config;
pub mod db;
pub mod error;
pub mod flows;
pub mod models;
pub mod services;

use config::Config;
use db::{FirestoreDb, LocalStore};
use flows::{AuthEvent, AuthFlowController, LocationEvent, LocationFlowController};
use services::sensor::SharedSensor;
use services::{AnalyticsSink, IdentityClient, IdentityProvider, SyncCoordinator};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Process-wide services, assembled once at startup and passed down.
pub struct AppState {
    pub config: Config,
    pub identity: IdentityClient,
    pub sync: SyncCoordinator,
    pub analytics: Arc<dyn AnalyticsSink>,
}

impl AppState {
    /// Connect to Firestore and open the local store.
    pub async fn connect(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Result<Self, error::StoreError> {
        let remote = FirestoreDb::new(&config.gcp_project_id).await?;
        let local = LocalStore::open(&config.local_db_path)?;

        Ok(Self {
            identity: IdentityClient::new(provider),
            sync: SyncCoordinator::new(Arc::new(remote), Arc::new(local)),
            analytics,
            config,
        })
    }

    pub fn auth_flow(&self) -> (AuthFlowController, UnboundedReceiver<AuthEvent>) {
        AuthFlowController::new(
            self.identity.clone(),
            self.sync.clone(),
            self.analytics.clone(),
        )
    }

    pub fn location_flow(
        &self,
        sensor: SharedSensor,
    ) -> (LocationFlowController, UnboundedReceiver<LocationEvent>) {
        LocationFlowController::new(
            self.identity.clone(),
            self.sync.clone(),
            sensor,
            self.analytics.clone(),
            self.config.distance_filter_meters,
        )
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-device record store backed by SQLite.

use crate::db::RecordStore;
use crate::error::StoreError;
use crate::models::{PositionFix, UserRecord};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite-backed local store. Cloning shares the same connection.
#[derive(Clone)]
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Opened local store");
        Self::with_connection(conn)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Local("connection lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.lock()?.execute(
            "CREATE TABLE IF NOT EXISTS users (
                uid TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                last_latitude REAL NOT NULL DEFAULT 0.0,
                last_longitude REAL NOT NULL DEFAULT 0.0,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store.lock()?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Aborted(e.to_string()))?
    }

    /// Synchronous existence check by primary key.
    pub fn contains(&self, uid: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .lock()?
            .query_row("SELECT 1 FROM users WHERE uid = ?1", params![uid], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }
}

/// Row modification time, RFC3339 with a `Z` suffix.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl RecordStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    /// Insert a new row. Fails if the uid already has one.
    async fn create_record(&self, email: &str, uid: &str) -> Result<(), StoreError> {
        let (email, uid) = (email.to_string(), uid.to_string());
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO users (uid, email, last_latitude, last_longitude, updated_at)
                 VALUES (?1, ?2, 0.0, 0.0, ?3)",
                params![uid, email, timestamp()],
            )?;
            tracing::debug!(uid = %uid, "Created local user row");
            Ok(())
        })
        .await
    }

    async fn update_location(&self, uid: &str, fix: PositionFix) -> Result<(), StoreError> {
        let uid = uid.to_string();
        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET last_latitude = ?2, last_longitude = ?3, updated_at = ?4
                 WHERE uid = ?1",
                params![uid, fix.latitude, fix.longitude, timestamp()],
            )?;

            if changed == 0 {
                return Err(StoreError::NotFound(uid));
            }
            Ok(())
        })
        .await
    }

    async fn get_record(&self, uid: &str) -> Result<UserRecord, StoreError> {
        let uid = uid.to_string();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT uid, email, last_latitude, last_longitude FROM users WHERE uid = ?1",
                params![uid],
                |row| {
                    Ok(UserRecord {
                        uid: row.get(0)?,
                        email: row.get(1)?,
                        last_latitude: row.get(2)?,
                        last_longitude: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound(uid))
        })
        .await
    }

    async fn has_record(&self, uid: &str) -> Result<bool, StoreError> {
        let store = self.clone();
        let uid = uid.to_string();
        tokio::task::spawn_blocking(move || store.contains(&uid))
            .await
            .map_err(|e| StoreError::Aborted(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_read_back() {
        let store = LocalStore::open_in_memory().unwrap();
        assert!(!store.contains("uid-1").unwrap());

        store.create_record("user@test.com", "uid-1").await.unwrap();

        assert!(store.contains("uid-1").unwrap());
        let record = store.get_record("uid-1").await.unwrap();
        assert_eq!(record, UserRecord::new("uid-1", "user@test.com"));
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let store = LocalStore::open_in_memory().unwrap();
        store.create_record("user@test.com", "uid-1").await.unwrap();

        let err = store
            .create_record("user@test.com", "uid-1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Local(_)));
    }

    #[tokio::test]
    async fn test_update_location_requires_record() {
        let store = LocalStore::open_in_memory().unwrap();
        let fix = PositionFix::new(-22.903539, -43.209587);

        let err = store.update_location("missing", fix).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("missing".to_string()));
        assert!(!store.contains("missing").unwrap());

        store.create_record("user@test.com", "uid-1").await.unwrap();
        store.update_location("uid-1", fix).await.unwrap();

        let record = store.get_record("uid-1").await.unwrap();
        assert_eq!(record.last_fix(), Some(fix));
        assert_eq!(record.email, "user@test.com");
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(
            store.get_record("nobody").await.unwrap_err(),
            StoreError::NotFound("nobody".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_writes_share_connection() {
        let store = LocalStore::open_in_memory().unwrap();
        for i in 0..8 {
            store
                .create_record("user@test.com", &format!("uid-{}", i))
                .await
                .unwrap();
        }

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let fix = PositionFix::new(f64::from(i) + 1.0, 2.0);
                    store.update_location(&format!("uid-{}", i), fix).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let record = store.get_record("uid-7").await.unwrap();
        assert_eq!(record.last_fix(), Some(PositionFix::new(8.0, 2.0)));
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Keeps a user's record consistent across the remote and local stores.
//!
//! Neither store knows about the other. The coordinator decides which store
//! gets a create after authentication, fans location fixes out to both, and
//! reads the last known location back from the remote store.
//!
//! Writes are spawned in the background. Each returns a [`WriteHandle`] the
//! caller may await or drop; failures are logged, never retried.

use crate::db::RecordStore;
use crate::error::{LookupError, StoreError};
use crate::models::{Identity, PositionFix};
use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Kind of background write, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    UpdateLocation,
}

/// Handle to one background store write.
#[derive(Debug)]
pub struct WriteHandle {
    pub store: &'static str,
    pub op: WriteOp,
    handle: JoinHandle<Result<(), StoreError>>,
}

impl WriteHandle {
    /// Wait for the write to finish.
    pub async fn wait(self) -> Result<(), StoreError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(StoreError::Aborted(e.to_string())),
        }
    }
}

/// The background writes triggered by one logical event.
#[derive(Debug, Default)]
pub struct WriteSet {
    handles: Vec<WriteHandle>,
}

impl WriteSet {
    fn push(&mut self, handle: WriteHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stores targeted, in spawn order.
    pub fn stores(&self) -> Vec<&'static str> {
        self.handles.iter().map(|h| h.store).collect()
    }

    /// Wait for every write; results are in spawn order.
    pub async fn wait(self) -> Vec<Result<(), StoreError>> {
        join_all(self.handles.into_iter().map(WriteHandle::wait)).await
    }
}

/// Creates still in flight, keyed by store and uid. A location write for the
/// same pair waits for the create to settle before it runs.
#[derive(Clone, Default)]
struct PendingCreates {
    inner: Arc<DashMap<(&'static str, String), watch::Receiver<bool>>>,
}

impl PendingCreates {
    fn begin(&self, store: &'static str, uid: &str) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        self.inner.insert((store, uid.to_string()), rx);
        tx
    }

    fn finish(&self, store: &'static str, uid: &str, done: watch::Sender<bool>) {
        self.inner.remove(&(store, uid.to_string()));
        done.send_replace(true);
    }

    async fn settled(&self, store: &'static str, uid: &str) {
        let pending = self
            .inner
            .get(&(store, uid.to_string()))
            .map(|entry| entry.value().clone());

        if let Some(mut rx) = pending {
            tracing::debug!(store, uid, "Waiting for pending create");
            // A dropped sender means the create task was aborted.
            let _ = rx.wait_for(|done| *done).await;
        }
    }
}

#[derive(Clone)]
pub struct SyncCoordinator {
    remote: Arc<dyn RecordStore>,
    local: Arc<dyn RecordStore>,
    pending: PendingCreates,
}

impl SyncCoordinator {
    pub fn new(remote: Arc<dyn RecordStore>, local: Arc<dyn RecordStore>) -> Self {
        Self {
            remote,
            local,
            pending: PendingCreates::default(),
        }
    }

    /// New account: always create remotely; create locally unless the
    /// device already has a row for this uid.
    pub async fn on_register(&self, identity: &Identity, email: &str) -> WriteSet {
        let mut writes = WriteSet::default();
        writes.push(self.spawn_create(&self.remote, email, &identity.uid));
        if let Some(handle) = self.create_local_if_absent(identity, email).await {
            writes.push(handle);
        }
        writes
    }

    /// Existing account: never re-create remotely; create locally on the
    /// first login from this device.
    pub async fn on_login(&self, identity: &Identity, email: &str) -> WriteSet {
        let mut writes = WriteSet::default();
        if let Some(handle) = self.create_local_if_absent(identity, email).await {
            writes.push(handle);
        }
        writes
    }

    async fn create_local_if_absent(
        &self,
        identity: &Identity,
        email: &str,
    ) -> Option<WriteHandle> {
        match self.local.has_record(&identity.uid).await {
            Ok(true) => {
                tracing::debug!(uid = %identity.uid, "Local record already present");
                None
            }
            Ok(false) => Some(self.spawn_create(&self.local, email, &identity.uid)),
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "Local existence check failed, skipping create");
                None
            }
        }
    }

    /// Fan a fix out to both stores. Each write runs after any create still
    /// pending for the same store and uid.
    pub fn record_fix(&self, uid: &str, fix: PositionFix) -> WriteSet {
        let mut writes = WriteSet::default();
        writes.push(self.spawn_update(&self.remote, uid, fix));
        writes.push(self.spawn_update(&self.local, uid, fix));
        writes
    }

    /// Read the last known location from the remote store. A record still
    /// holding the zero/zero sentinel yields [`LookupError::NoLastLocation`].
    pub async fn load_last_known_location(&self, uid: &str) -> Result<PositionFix, LookupError> {
        let record = self.remote.get_record(uid).await?;
        record.last_fix().ok_or(LookupError::NoLastLocation)
    }

    fn spawn_create(&self, store: &Arc<dyn RecordStore>, email: &str, uid: &str) -> WriteHandle {
        let store = store.clone();
        let name = store.name();
        let email = email.to_string();
        let uid = uid.to_string();
        let pending = self.pending.clone();
        let done = pending.begin(name, &uid);

        let handle = tokio::spawn(async move {
            let result = store.create_record(&email, &uid).await;
            match &result {
                Ok(()) => tracing::info!(store = name, uid = %uid, "Record created"),
                Err(e) => tracing::warn!(store = name, uid = %uid, error = %e, "Record create failed"),
            }
            pending.finish(name, &uid, done);
            result
        });

        WriteHandle {
            store: name,
            op: WriteOp::Create,
            handle,
        }
    }

    fn spawn_update(&self, store: &Arc<dyn RecordStore>, uid: &str, fix: PositionFix) -> WriteHandle {
        let store = store.clone();
        let name = store.name();
        let uid = uid.to_string();
        let pending = self.pending.clone();

        let handle = tokio::spawn(async move {
            pending.settled(name, &uid).await;

            let result = store.update_location(&uid, fix).await;
            if let Err(e) = &result {
                tracing::warn!(
                    store = name,
                    uid = %uid,
                    lat = fix.latitude,
                    lon = fix.longitude,
                    error = %e,
                    "Location write failed"
                );
            }
            result
        });

        WriteHandle {
            store: name,
            op: WriteOp::UpdateLocation,
            handle,
        }
    }
}

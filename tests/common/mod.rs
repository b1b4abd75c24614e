// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use location_sync::db::{FirestoreDb, MemoryStore, RecordStore};
use location_sync::error::{AuthError, StoreError};
use location_sync::flows::{AuthEvent, AuthFlowController, LocationEvent, LocationFlowController};
use location_sync::models::{Identity, PositionFix, UserRecord};
use location_sync::services::sensor::SensorEvent;
use location_sync::services::{
    IdentityClient, IdentityProvider, LocationSensor, SyncCoordinator, TracingAnalytics,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Generate a unique uid for test isolation.
#[allow(dead_code)]
pub fn unique_uid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-{}", nanos)
}

/// Poll until `cond` holds, failing the test after one second.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within 1s");
}

/// Drain every event currently queued on a receiver.
#[allow(dead_code)]
pub fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

// ─── Identity provider double ────────────────────────────────────

/// What the scripted provider answers with.
#[allow(dead_code)]
#[derive(Clone)]
pub enum ProviderReply {
    Identity(String),
    Error(AuthError),
    Nothing,
}

pub struct ScriptedProvider {
    reply: ProviderReply,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(reply: ProviderReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            ProviderReply::Identity(uid) => Ok(Some(Identity {
                uid: uid.clone(),
                email: Some(email.to_string()),
            })),
            ProviderReply::Error(e) => Err(e.clone()),
            ProviderReply::Nothing => Ok(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<Option<Identity>, AuthError> {
        self.answer(email)
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<Option<Identity>, AuthError> {
        self.answer(email)
    }
}

// ─── Record store double ─────────────────────────────────────────

/// Memory-backed store that counts every call.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub creates: Arc<Mutex<Vec<String>>>,
    pub updates: Arc<Mutex<Vec<(String, PositionFix)>>>,
    pub reads: Arc<AtomicUsize>,
    pub existence_checks: Arc<AtomicUsize>,
    create_delay: Option<Duration>,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every create sleep before it lands.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn seed(&self, record: UserRecord) {
        self.inner.insert(record);
    }

    pub fn creates(&self) -> Vec<String> {
        self.creates.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, PositionFix)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.creates().len()
            + self.updates().len()
            + self.reads()
            + self.existence_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn create_record(&self, email: &str, uid: &str) -> Result<(), StoreError> {
        self.creates.lock().unwrap().push(uid.to_string());
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.create_record(email, uid).await
    }

    async fn update_location(&self, uid: &str, fix: PositionFix) -> Result<(), StoreError> {
        self.updates.lock().unwrap().push((uid.to_string(), fix));
        self.inner.update_location(uid, fix).await
    }

    async fn get_record(&self, uid: &str) -> Result<UserRecord, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_record(uid).await
    }

    async fn has_record(&self, uid: &str) -> Result<bool, StoreError> {
        self.existence_checks.fetch_add(1, Ordering::SeqCst);
        self.inner.has_record(uid).await
    }
}

// ─── Sensor double ───────────────────────────────────────────────

/// Sensor driven by the test through [`ScriptedSensor::emit`].
#[derive(Default)]
pub struct ScriptedSensor {
    events: Mutex<Option<UnboundedSender<SensorEvent>>>,
    initial: Mutex<Option<SensorEvent>>,
    pub permission_requests: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedSensor {
    /// Sensor that reports `initial` on subscribe.
    pub fn reporting(initial: SensorEvent) -> Arc<Self> {
        let sensor = Self::default();
        *sensor.initial.lock().unwrap() = Some(initial);
        Arc::new(sensor)
    }

    pub fn emit(&self, event: SensorEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            tx.send(event).expect("tracker is listening");
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }
}

impl LocationSensor for ScriptedSensor {
    fn subscribe(&self, events: UnboundedSender<SensorEvent>) {
        if let Some(initial) = self.initial.lock().unwrap().clone() {
            let _ = events.send(initial);
        }
        *self.events.lock().unwrap() = Some(events);
    }

    fn request_authorization(&self) {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn start_updates(&self, _distance_filter_meters: f64) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_updates(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

// ─── Harnesses ───────────────────────────────────────────────────

#[allow(dead_code)]
pub struct AuthHarness {
    pub flow: AuthFlowController,
    pub events: UnboundedReceiver<AuthEvent>,
    pub identity: IdentityClient,
    pub provider: Arc<ScriptedProvider>,
    pub remote: CountingStore,
    pub local: CountingStore,
}

#[allow(dead_code)]
pub fn auth_harness(reply: ProviderReply) -> AuthHarness {
    let provider = ScriptedProvider::new(reply);
    let identity = IdentityClient::new(provider.clone());
    let remote = CountingStore::new();
    let local = CountingStore::new();
    let sync = SyncCoordinator::new(Arc::new(remote.clone()), Arc::new(local.clone()));

    let (flow, events) = AuthFlowController::new(identity.clone(), sync, Arc::new(TracingAnalytics));

    AuthHarness {
        flow,
        events,
        identity,
        provider,
        remote,
        local,
    }
}

#[allow(dead_code)]
pub struct LocationHarness {
    pub flow: LocationFlowController,
    pub events: UnboundedReceiver<LocationEvent>,
    pub identity: IdentityClient,
    pub sensor: Arc<ScriptedSensor>,
    pub remote: CountingStore,
    pub local: CountingStore,
}

/// Location flow wired to counting stores. When `signed_in_uid` is set the
/// identity client is signed in first.
#[allow(dead_code)]
pub async fn location_harness(
    signed_in_uid: Option<&str>,
    sensor: Arc<ScriptedSensor>,
) -> LocationHarness {
    let reply = match signed_in_uid {
        Some(uid) => ProviderReply::Identity(uid.to_string()),
        None => ProviderReply::Nothing,
    };
    let identity = IdentityClient::new(ScriptedProvider::new(reply));
    if signed_in_uid.is_some() {
        identity
            .sign_in("user@test.com", "12345678")
            .await
            .expect("scripted sign-in succeeds");
    }

    let remote = CountingStore::new();
    let local = CountingStore::new();
    let sync = SyncCoordinator::new(Arc::new(remote.clone()), Arc::new(local.clone()));

    let (flow, events) = LocationFlowController::new(
        identity.clone(),
        sync,
        sensor.clone(),
        Arc::new(TracingAnalytics),
        10.0,
    );

    LocationHarness {
        flow,
        events,
        identity,
        sensor,
        remote,
        local,
    }
}

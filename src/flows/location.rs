// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location flow: last-location read-back and continuous tracking.

use crate::error::LocationError;
use crate::flows::notify;
use crate::models::PositionFix;
use crate::services::analytics::{events, params, AnalyticsSink};
use crate::services::sensor::SharedSensor;
use crate::services::{IdentityClient, LocationTracker, SyncCoordinator, TrackerEvent};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Location outcome delivered to presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Update(PositionFix),
    Failure(LocationError),
}

pub struct LocationFlowController {
    identity: IdentityClient,
    sync: SyncCoordinator,
    sensor: SharedSensor,
    analytics: Arc<dyn AnalyticsSink>,
    distance_filter_meters: f64,
    events: mpsc::UnboundedSender<LocationEvent>,
    tracking: Mutex<Option<JoinHandle<()>>>,
}

impl LocationFlowController {
    pub fn new(
        identity: IdentityClient,
        sync: SyncCoordinator,
        sensor: SharedSensor,
        analytics: Arc<dyn AnalyticsSink>,
        distance_filter_meters: f64,
    ) -> (Self, mpsc::UnboundedReceiver<LocationEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                identity,
                sync,
                sensor,
                analytics,
                distance_filter_meters,
                events,
                tracking: Mutex::new(None),
            },
            rx,
        )
    }

    /// Read back the signed-in user's last stored location.
    ///
    /// No-op without a current identity. A missing record or one still at
    /// the zero/zero sentinel is reported as [`LocationError::Unavailable`].
    pub async fn load_last_location(&self) {
        let Some(identity) = self.identity.current_identity() else {
            tracing::debug!("No signed-in user, skipping last location");
            return;
        };

        match self.sync.load_last_known_location(&identity.uid).await {
            Ok(fix) => notify(&self.events, LocationEvent::Update(fix)),
            Err(e) => {
                tracing::debug!(uid = %identity.uid, error = %e, "No last location");
                notify(&self.events, LocationEvent::Failure(e.into()));
            }
        }
    }

    /// Subscribe to the sensor and forward accepted fixes. Restarts if
    /// already tracking.
    pub fn start_tracking(&self) {
        self.stop_tracking();

        let mut tracker = LocationTracker::new(self.sensor.clone(), self.distance_filter_meters);
        let mut rx = tracker.start();

        let ctx = TrackingContext {
            identity: self.identity.clone(),
            sync: self.sync.clone(),
            analytics: self.analytics.clone(),
            events: self.events.clone(),
        };

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Some(out) = tracker.handle(event) {
                    ctx.dispatch(out);
                }
            }
            tracing::debug!("Sensor channel closed, tracking ended");
        });

        if let Ok(mut guard) = self.tracking.lock() {
            *guard = Some(handle);
        }
    }

    /// Unsubscribe: stop the sensor and the forwarding task.
    pub fn stop_tracking(&self) {
        let handle = match self.tracking.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(handle) = handle {
            handle.abort();
            self.sensor.stop_updates();
            tracing::debug!("Tracking stopped");
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
            .lock()
            .map(|g| g.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for LocationFlowController {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}

/// What the forwarding task needs from the controller.
struct TrackingContext {
    identity: IdentityClient,
    sync: SyncCoordinator,
    analytics: Arc<dyn AnalyticsSink>,
    events: mpsc::UnboundedSender<LocationEvent>,
}

impl TrackingContext {
    fn dispatch(&self, event: TrackerEvent) {
        match event {
            TrackerEvent::PermissionRequested => {
                self.analytics
                    .log_event(events::REQUEST_PERMISSION_LOCATION, params([]));
            }
            TrackerEvent::Authorized => {
                self.analytics.log_event(
                    events::PERMISSION_LOCATION,
                    params([("granted", Value::Bool(true))]),
                );
            }
            TrackerEvent::PermissionDenied => {
                self.analytics.log_event(
                    events::PERMISSION_LOCATION,
                    params([("granted", Value::Bool(false))]),
                );
                notify(
                    &self.events,
                    LocationEvent::Failure(LocationError::PermissionDenied),
                );
            }
            TrackerEvent::Failed(err) => {
                notify(
                    &self.events,
                    LocationEvent::Failure(LocationError::Sensor(err.to_string())),
                );
            }
            TrackerEvent::Fix(fix) => self.on_fix(fix),
        }
    }

    fn on_fix(&self, fix: PositionFix) {
        self.analytics.log_event(
            events::LOCATION,
            params([
                ("latitude", Value::from(fix.latitude)),
                ("longitude", Value::from(fix.longitude)),
            ]),
        );

        match self.identity.current_identity() {
            // Background writes; handles are detached.
            Some(identity) => drop(self.sync.record_fix(&identity.uid, fix)),
            None => tracing::debug!("No signed-in user, fix not persisted"),
        }

        notify(&self.events, LocationEvent::Update(fix));
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location tracker: owns the authorization state machine and filters the
//! sensor's raw events into accepted fixes.

use crate::error::SensorError;
use crate::models::{AuthorizationState, PositionFix};
use crate::services::sensor::{SensorEvent, SharedSensor};
use tokio::sync::mpsc;

/// Default platform minimum-distance filter, in meters.
pub const DEFAULT_DISTANCE_FILTER_METERS: f64 = 10.0;

/// Filtered output of the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// Permission was undetermined and has now been requested.
    PermissionRequested,
    /// Permission granted; continuous updates started.
    Authorized,
    /// Permission restricted or denied. Terminal until the next start.
    PermissionDenied,
    Fix(PositionFix),
    Failed(SensorError),
}

pub struct LocationTracker {
    sensor: SharedSensor,
    distance_filter_meters: f64,
    state: AuthorizationState,
    last_fix: Option<PositionFix>,
}

impl LocationTracker {
    pub fn new(sensor: SharedSensor, distance_filter_meters: f64) -> Self {
        Self {
            sensor,
            distance_filter_meters,
            state: AuthorizationState::Undetermined,
            last_fix: None,
        }
    }

    pub fn state(&self) -> AuthorizationState {
        self.state
    }

    /// Reset and subscribe to the sensor. The sensor answers with its
    /// current authorization state on the returned channel.
    pub fn start(&mut self) -> mpsc::UnboundedReceiver<SensorEvent> {
        self.state = AuthorizationState::Undetermined;
        self.last_fix = None;

        let (tx, rx) = mpsc::unbounded_channel();
        self.sensor.subscribe(tx);
        rx
    }

    pub fn stop(&mut self) {
        self.sensor.stop_updates();
    }

    /// Advance the state machine with one sensor event.
    pub fn handle(&mut self, event: SensorEvent) -> Option<TrackerEvent> {
        if self.state == AuthorizationState::Denied {
            tracing::debug!(?event, "Ignoring sensor event after permission denial");
            return None;
        }

        match event {
            SensorEvent::AuthorizationChanged(state) => self.on_authorization(state),
            SensorEvent::Fixes(fixes) => self.on_fixes(fixes),
            SensorEvent::Error(SensorError::LocationUnknown) => {
                tracing::debug!("Location currently unknown, ignoring");
                None
            }
            SensorEvent::Error(SensorError::Denied) => {
                self.state = AuthorizationState::Denied;
                Some(TrackerEvent::PermissionDenied)
            }
            SensorEvent::Error(err) => {
                tracing::warn!(error = %err, "Location sensor error");
                Some(TrackerEvent::Failed(err))
            }
        }
    }

    fn on_authorization(&mut self, state: AuthorizationState) -> Option<TrackerEvent> {
        let previous = self.state;
        self.state = state;

        match state {
            AuthorizationState::Undetermined => {
                tracing::info!("Requesting location permission");
                self.sensor.request_authorization();
                Some(TrackerEvent::PermissionRequested)
            }
            AuthorizationState::Granted => {
                if previous == AuthorizationState::Granted {
                    return None;
                }
                tracing::info!(
                    distance_filter = self.distance_filter_meters,
                    "Location permission granted, starting updates"
                );
                self.sensor.start_updates(self.distance_filter_meters);
                Some(TrackerEvent::Authorized)
            }
            AuthorizationState::Denied => {
                tracing::info!("Location permission denied");
                Some(TrackerEvent::PermissionDenied)
            }
        }
    }

    fn on_fixes(&mut self, fixes: Vec<PositionFix>) -> Option<TrackerEvent> {
        if self.state != AuthorizationState::Granted {
            tracing::debug!("Dropping fix delivered before authorization");
            return None;
        }

        let fix = *fixes.last()?;
        if !fix.is_plausible() {
            tracing::debug!(lat = fix.latitude, lon = fix.longitude, "Dropping stale fix");
            return None;
        }

        match self.last_fix {
            None => tracing::debug!(lat = fix.latitude, lon = fix.longitude, "First fix"),
            Some(prev) => tracing::debug!(
                lat = fix.latitude,
                lon = fix.longitude,
                moved_meters = fix.distance_meters(&prev),
                "Fix"
            ),
        }

        self.last_fix = Some(fix);
        Some(TrackerEvent::Fix(fix))
    }
}

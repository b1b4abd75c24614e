// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - validation, identity, sync and location tracking.

pub mod analytics;
pub mod identity;
pub mod sensor;
pub mod sync;
pub mod tracker;
pub mod validation;

pub use analytics::{AnalyticsSink, TracingAnalytics};
pub use identity::{FirebaseAuthProvider, IdentityClient, IdentityProvider};
pub use sensor::{LocationSensor, ReplaySensor, SensorEvent};
pub use sync::{SyncCoordinator, WriteHandle, WriteSet};
pub use tracker::{LocationTracker, TrackerEvent};

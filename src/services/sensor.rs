// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform location sensor boundary, plus a GeoJSON replay sensor.

use crate::error::SensorError;
use crate::models::{AuthorizationState, PositionFix};
use geojson::GeoJson;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Push-based events delivered by the platform sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    AuthorizationChanged(AuthorizationState),
    /// One delivery, oldest first.
    Fixes(Vec<PositionFix>),
    Error(SensorError),
}

/// The platform location sensor.
///
/// After [`subscribe`](LocationSensor::subscribe) the sensor pushes the
/// current authorization state once, then any later changes, fixes and
/// errors into the given sender.
pub trait LocationSensor: Send + Sync {
    fn subscribe(&self, events: UnboundedSender<SensorEvent>);

    fn request_authorization(&self);

    /// Begin continuous updates; only moves of at least
    /// `distance_filter_meters` are delivered.
    fn start_updates(&self, distance_filter_meters: f64);

    fn stop_updates(&self);
}

/// A sensor shared between the tracker and its owner.
pub type SharedSensor = Arc<dyn LocationSensor>;

/// Sensor that replays a recorded track.
pub struct ReplaySensor {
    track: Vec<PositionFix>,
    initial: AuthorizationState,
    grant_on_request: bool,
    interval: Duration,
    events: Mutex<Option<UnboundedSender<SensorEvent>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ReplaySensor {
    pub fn new(track: Vec<PositionFix>) -> Self {
        Self {
            track,
            initial: AuthorizationState::Granted,
            grant_on_request: true,
            interval: Duration::from_millis(500),
            events: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Load a track from a GeoJSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| ReplayError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load a track from a GeoJSON string (Point, MultiPoint or LineString geometries).
    pub fn load_from_json(json_data: &str) -> Result<Self, ReplayError> {
        let geojson: GeoJson = json_data
            .parse()
            .map_err(|e: geojson::Error| ReplayError::ParseError(e.to_string()))?;

        let geometries: Vec<geojson::Geometry> = match geojson {
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .filter_map(|f| f.geometry)
                .collect(),
            GeoJson::Feature(feature) => feature.geometry.into_iter().collect(),
            GeoJson::Geometry(geometry) => vec![geometry],
        };

        let mut track = Vec::new();
        for geometry in geometries {
            match geometry.value {
                geojson::Value::Point(position) => track.push(to_fix(&position)?),
                geojson::Value::MultiPoint(positions) | geojson::Value::LineString(positions) => {
                    for position in &positions {
                        track.push(to_fix(position)?);
                    }
                }
                _ => return Err(ReplayError::UnsupportedGeometry),
            }
        }

        tracing::info!(count = track.len(), "Loaded replay track");
        Ok(Self::new(track))
    }

    /// Authorization state reported on subscribe.
    pub fn with_initial_authorization(mut self, state: AuthorizationState) -> Self {
        self.initial = state;
        self
    }

    /// Whether a permission request is granted or denied.
    pub fn grant_on_request(mut self, grant: bool) -> Self {
        self.grant_on_request = grant;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn track(&self) -> &[PositionFix] {
        &self.track
    }

    /// The fixes actually delivered for a given minimum-distance filter,
    /// measured from the last delivered fix.
    pub fn filtered_track(&self, distance_filter_meters: f64) -> Vec<PositionFix> {
        let mut track: Vec<PositionFix> = Vec::with_capacity(self.track.len());
        for fix in &self.track {
            let moved_enough = track
                .last()
                .map_or(true, |prev| fix.distance_meters(prev) >= distance_filter_meters);
            if moved_enough {
                track.push(*fix);
            }
        }
        track
    }

    fn push(&self, event: SensorEvent) {
        if let Ok(guard) = self.events.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(event);
            }
        }
    }
}

fn to_fix(position: &[f64]) -> Result<PositionFix, ReplayError> {
    match position {
        // GeoJSON positions are [longitude, latitude, ...]
        [lon, lat, ..] => Ok(PositionFix::new(*lat, *lon)),
        _ => Err(ReplayError::ParseError("position needs two coordinates".to_string())),
    }
}

impl LocationSensor for ReplaySensor {
    fn subscribe(&self, events: UnboundedSender<SensorEvent>) {
        if let Ok(mut guard) = self.events.lock() {
            *guard = Some(events);
        }
        self.push(SensorEvent::AuthorizationChanged(self.initial));
    }

    fn request_authorization(&self) {
        let state = if self.grant_on_request {
            AuthorizationState::Granted
        } else {
            AuthorizationState::Denied
        };
        self.push(SensorEvent::AuthorizationChanged(state));
    }

    fn start_updates(&self, distance_filter_meters: f64) {
        let Some(tx) = self.events.lock().ok().and_then(|g| g.clone()) else {
            return;
        };

        let track = self.filtered_track(distance_filter_meters);
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            for fix in track {
                if tx.send(SensorEvent::Fixes(vec![fix])).is_err() {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        });

        if let Ok(mut guard) = self.task.lock() {
            if let Some(old) = guard.replace(handle) {
                old.abort();
            }
        }
    }

    fn stop_updates(&self) {
        if let Ok(mut guard) = self.task.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

/// Errors from loading a replay track.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse GeoJSON: {0}")]
    ParseError(String),

    #[error("Unsupported geometry type (expected Point, MultiPoint or LineString)")]
    UnsupportedGeometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_line_string() {
        let json = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[-43.209587, -22.903539], [-43.2, -22.9]]
            }
        }"#;

        let sensor = ReplaySensor::load_from_json(json).unwrap();
        assert_eq!(
            sensor.track(),
            &[
                PositionFix::new(-22.903539, -43.209587),
                PositionFix::new(-22.9, -43.2)
            ]
        );
    }

    #[test]
    fn test_polygon_is_rejected() {
        let json = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#;
        assert!(matches!(
            ReplaySensor::load_from_json(json),
            Err(ReplayError::UnsupportedGeometry)
        ));
    }

    #[test]
    fn test_filtered_track_drops_short_moves() {
        let sensor = ReplaySensor::load_from_file("tests/fixtures/track.geojson").unwrap();
        assert_eq!(sensor.track().len(), 4);

        let delivered = sensor.filtered_track(10.0);
        assert_eq!(delivered.len(), 3);
        assert_eq!(delivered[0], sensor.track()[0]);
        assert_eq!(delivered[1], sensor.track()[2]);

        assert_eq!(sensor.filtered_track(0.0).len(), 4);
    }
}

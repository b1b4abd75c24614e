// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position fixes and location authorization state.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// A single device position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl PositionFix {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Zero/zero is reserved for "no location recorded yet".
    pub fn is_sentinel(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Finite and inside the WGS84 coordinate ranges.
    pub fn is_plausible(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to another fix, in meters.
    pub fn distance_meters(&self, other: &PositionFix) -> f64 {
        Haversine.distance(Point::from(*self), Point::from(*other))
    }
}

impl From<PositionFix> for Point<f64> {
    fn from(fix: PositionFix) -> Self {
        // geo points are (x = longitude, y = latitude)
        Point::new(fix.longitude, fix.latitude)
    }
}

/// Location permission state, pushed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        assert!(PositionFix::new(0.0, 0.0).is_sentinel());
        assert!(!PositionFix::new(0.0, 1.0).is_sentinel());
        assert!(!PositionFix::new(-22.903539, -43.209587).is_sentinel());
    }

    #[test]
    fn test_plausible_ranges() {
        assert!(PositionFix::new(90.0, -180.0).is_plausible());
        assert!(!PositionFix::new(90.5, 0.0).is_plausible());
        assert!(!PositionFix::new(0.0, 181.0).is_plausible());
        assert!(!PositionFix::new(f64::NAN, 0.0).is_plausible());
    }

    #[test]
    fn test_distance_between_nearby_fixes() {
        let a = PositionFix::new(-22.903539, -43.209587);
        let b = PositionFix::new(-22.904539, -43.209587);

        // 0.001 degrees of latitude is roughly 111 meters
        let d = a.distance_meters(&b);
        assert!((100.0..120.0).contains(&d), "distance was {}", d);
        assert_eq!(a.distance_meters(&a), 0.0);
    }
}

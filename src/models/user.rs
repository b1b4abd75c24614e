//! User record and identity models.

use crate::models::PositionFix;
use serde::{Deserialize, Serialize};

/// Authenticated identity issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued user ID (stable, primary key in both stores)
    pub uid: String,
    /// Email the account was authenticated with, if the provider echoed it
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }
}

/// Per-user row kept in both the remote and the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Identity provider user ID (also used as document ID / primary key)
    pub uid: String,
    /// Email address, set at creation
    pub email: String,
    /// Last known latitude (0.0 means unknown)
    pub last_latitude: f64,
    /// Last known longitude (0.0 means unknown)
    pub last_longitude: f64,
}

impl UserRecord {
    /// A freshly created record with no location yet.
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            last_latitude: 0.0,
            last_longitude: 0.0,
        }
    }

    /// Last known position, or `None` while the record holds the zero/zero sentinel.
    pub fn last_fix(&self) -> Option<PositionFix> {
        let fix = PositionFix::new(self.last_latitude, self.last_longitude);
        if fix.is_sentinel() {
            None
        } else {
            Some(fix)
        }
    }

    /// Apply a fix; both coordinates always move together.
    pub fn set_location(&mut self, fix: PositionFix) {
        self.last_latitude = fix.latitude;
        self.last_longitude = fix.longitude;
    }
}

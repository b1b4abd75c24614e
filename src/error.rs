// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error taxonomy shared by the validator, identity client, stores and flows.

use serde::Serialize;

/// Credential shape errors, always raised before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Value empty")]
    NilValue,

    #[error("Email invalid")]
    InvalidEmail,

    #[error("Password has less than 8 characters")]
    PasswordTooShort,

    #[error("Password has 20 or more characters")]
    PasswordTooLong,
}

/// Category of an identity provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    /// The provider answered with neither an identity nor an error.
    InternalError,
    EmailAlreadyInUse,
    UserNotFound,
    WrongPassword,
    UserDisabled,
    WeakPassword,
    InvalidEmail,
    TooManyRequests,
    Network,
    Other,
}

/// Provider-reported authentication error, surfaced verbatim to presentation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The synthesized error for a provider call that produced no result.
    pub fn internal() -> Self {
        Self::new(
            AuthErrorKind::InternalError,
            "Identity provider returned neither a result nor an error",
        )
    }
}

/// Why a login or register call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Record store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Local store error: {0}")]
    Local(String),

    #[error("Store not connected (offline mode)")]
    Offline,

    #[error("Background write aborted: {0}")]
    Aborted(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Local(err.to_string())
    }
}

/// Outcome of reading back a user's last known location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("No record for user {0}")]
    NotFound(String),

    /// The record exists but still carries the zero/zero sentinel.
    #[error("No last location recorded")]
    NoLastLocation,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LookupError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(uid) => LookupError::NotFound(uid),
            other => LookupError::Store(other),
        }
    }
}

/// Sensor-side failures reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SensorError {
    /// Position currently unknown; transient and ignored.
    #[error("Location currently unknown")]
    LocationUnknown,

    #[error("Location permission denied")]
    Denied,

    #[error("Sensor failure: {0}")]
    Other(String),
}

/// Location failure delivered to presentation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// User-actionable: the app must ask for location permission.
    #[error("Location permission denied")]
    PermissionDenied,

    /// No location is available (no record, sentinel record, or no fix).
    #[error("Location unavailable")]
    Unavailable,

    #[error("Location error: {0}")]
    Sensor(String),

    #[error("Location lookup failed: {0}")]
    Lookup(String),
}

impl From<LookupError> for LocationError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(_) | LookupError::NoLastLocation => LocationError::Unavailable,
            LookupError::Store(e) => LocationError::Lookup(e.to_string()),
        }
    }
}

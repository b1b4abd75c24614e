// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential shape checks. Pure, synchronous, no I/O.

use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

pub const PASSWORD_MIN_CHARS: usize = 8;
/// Exclusive upper bound.
pub const PASSWORD_MAX_CHARS: usize = 20;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$").expect("email regex is valid")
});

/// Validated email/password pair. Lives only for one login or register call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Check an email address. Returns it unchanged (no case folding).
pub fn validate_email(raw: Option<&str>) -> Result<String, ValidationError> {
    let email = raw
        .filter(|e| !e.is_empty())
        .ok_or(ValidationError::NilValue)?;

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(email.to_string())
}

/// Check a password's length. Returns it unchanged (no trimming).
///
/// Length is counted in Unicode scalar values (`char`s), not bytes and not
/// grapheme clusters: `"e\u{301}"` (e + combining acute) counts as two.
pub fn validate_password(raw: Option<&str>) -> Result<String, ValidationError> {
    let password = raw
        .filter(|p| !p.is_empty())
        .ok_or(ValidationError::NilValue)?;

    let len = password.chars().count();
    if len < PASSWORD_MIN_CHARS {
        return Err(ValidationError::PasswordTooShort);
    }
    if len >= PASSWORD_MAX_CHARS {
        return Err(ValidationError::PasswordTooLong);
    }

    Ok(password.to_string())
}

/// Email first, then password; the first failure wins.
pub fn validate_credentials(
    email: Option<&str>,
    password: Option<&str>,
) -> Result<Credentials, ValidationError> {
    Ok(Credentials {
        email: validate_email(email)?,
        password: validate_password(password)?,
    })
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity client over a swappable identity provider.
//!
//! Handles:
//! - Sign-in and sign-up through an [`IdentityProvider`]
//! - Synthesizing `InternalError` when the provider yields nothing
//! - Caching the signed-in identity for synchronous queries
//!
//! [`FirebaseAuthProvider`] implements the provider over the Firebase
//! Identity Toolkit REST API.

use crate::error::{AuthError, AuthErrorKind};
use crate::models::Identity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Raw credential exchange with the identity provider.
///
/// `Ok(None)` means the provider completed with neither a result nor an
/// error; [`IdentityClient`] turns that into `InternalError`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Identity>, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Identity>, AuthError>;
}

/// Domain-facing identity client with a cached current identity.
#[derive(Clone)]
pub struct IdentityClient {
    provider: Arc<dyn IdentityProvider>,
    current: Arc<RwLock<Option<Identity>>>,
}

impl IdentityClient {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let result = self.provider.sign_in(email, password).await;
        self.settle(result)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let result = self.provider.sign_up(email, password).await;
        self.settle(result)
    }

    /// Cached session state; no I/O.
    pub fn current_identity(&self) -> Option<Identity> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn settle(&self, result: Result<Option<Identity>, AuthError>) -> Result<Identity, AuthError> {
        let identity = match result {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::warn!("Identity provider returned neither identity nor error");
                return Err(AuthError::internal());
            }
            Err(e) => return Err(e),
        };

        match self.current.write() {
            Ok(mut guard) => *guard = Some(identity.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(identity.clone()),
        }
        Ok(identity)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Firebase Identity Toolkit provider
// ─────────────────────────────────────────────────────────────────────────────

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity provider backed by Firebase Authentication (email/password).
#[derive(Clone)]
pub struct FirebaseAuthProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirebaseAuthProvider {
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, IDENTITY_TOOLKIT_URL)
    }

    /// Point at the Auth emulator (`host:port`).
    pub fn for_emulator(api_key: impl Into<String>, host: &str) -> anyhow::Result<Self> {
        tracing::info!(host, "Using Firebase Auth emulator");
        Self::with_base_url(
            api_key,
            format!("http://{}/identitytoolkit.googleapis.com/v1", host),
        )
    }

    fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, endpoint);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::new(AuthErrorKind::Network, e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));
            tracing::debug!(endpoint, %status, message = %message, "Identity provider rejected request");
            return Err(error_from_provider_message(&message));
        }

        let account: AccountResponse = match serde_json::from_str(&body) {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Unparseable identity provider response");
                return Ok(None);
            }
        };

        Ok(account.local_id.map(|uid| Identity {
            uid,
            email: account.email,
        }))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Identity>, AuthError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Identity>, AuthError> {
        self.password_call("signUp", email, password).await
    }
}

/// Map an Identity Toolkit error message (`CODE` or `CODE : detail`) to a tagged error.
pub fn error_from_provider_message(message: &str) -> AuthError {
    let code = message.split(" : ").next().unwrap_or(message).trim();

    let kind = match code {
        "EMAIL_EXISTS" => AuthErrorKind::EmailAlreadyInUse,
        "EMAIL_NOT_FOUND" => AuthErrorKind::UserNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => AuthErrorKind::WrongPassword,
        "USER_DISABLED" => AuthErrorKind::UserDisabled,
        "WEAK_PASSWORD" => AuthErrorKind::WeakPassword,
        "INVALID_EMAIL" => AuthErrorKind::InvalidEmail,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorKind::TooManyRequests,
        _ => AuthErrorKind::Other,
    };

    AuthError::new(kind, message)
}

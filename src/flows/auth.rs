// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login and registration flow.
//!
//! Validation -> identity provider -> record sync -> one notification.
//! Validation always runs before any network or store call.

use crate::error::AuthFailure;
use crate::flows::notify;
use crate::models::Identity;
use crate::services::analytics::{events, params, AnalyticsSink};
use crate::services::validation::validate_credentials;
use crate::services::{IdentityClient, SyncCoordinator, WriteSet};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outcome of a login or register call, delivered to presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    Success(Identity),
    Failure(AuthFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    fn event_name(self) -> &'static str {
        match self {
            AuthMode::Login => events::LOGIN,
            AuthMode::Register => events::SIGN_UP,
        }
    }
}

pub struct AuthFlowController {
    identity: IdentityClient,
    sync: SyncCoordinator,
    analytics: Arc<dyn AnalyticsSink>,
    events: mpsc::UnboundedSender<AuthEvent>,
}

impl AuthFlowController {
    /// Build the controller and the receiver presentation reads events from.
    pub fn new(
        identity: IdentityClient,
        sync: SyncCoordinator,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> (Self, mpsc::UnboundedReceiver<AuthEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                identity,
                sync,
                analytics,
                events,
            },
            rx,
        )
    }

    /// Sign in an existing account.
    ///
    /// Returns the background record writes this login triggered; callers
    /// may ignore them.
    pub async fn login(&self, email: Option<&str>, password: Option<&str>) -> WriteSet {
        self.authenticate(AuthMode::Login, email, password).await
    }

    /// Create a new account.
    pub async fn register(&self, email: Option<&str>, password: Option<&str>) -> WriteSet {
        self.authenticate(AuthMode::Register, email, password).await
    }

    async fn authenticate(
        &self,
        mode: AuthMode,
        email: Option<&str>,
        password: Option<&str>,
    ) -> WriteSet {
        match self.run(mode, email, password).await {
            Ok((identity, writes)) => {
                tracing::info!(?mode, uid = %identity.uid, "Authenticated");
                self.analytics.log_event(
                    mode.event_name(),
                    params([("success", Value::Bool(true))]),
                );
                notify(&self.events, AuthEvent::Success(identity));
                writes
            }
            Err(failure) => {
                tracing::info!(?mode, error = %failure, "Authentication failed");
                self.analytics.log_event(
                    mode.event_name(),
                    params([
                        ("success", Value::Bool(false)),
                        ("error", Value::String(failure.to_string())),
                    ]),
                );
                notify(&self.events, AuthEvent::Failure(failure));
                WriteSet::default()
            }
        }
    }

    async fn run(
        &self,
        mode: AuthMode,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(Identity, WriteSet), AuthFailure> {
        let credentials = validate_credentials(email, password)?;

        let identity = match mode {
            AuthMode::Login => {
                self.identity
                    .sign_in(&credentials.email, &credentials.password)
                    .await?
            }
            AuthMode::Register => {
                self.identity
                    .sign_up(&credentials.email, &credentials.password)
                    .await?
            }
        };

        let writes = match mode {
            AuthMode::Login => self.sync.on_login(&identity, &credentials.email).await,
            AuthMode::Register => self.sync.on_register(&identity, &credentials.email).await,
        };

        Ok((identity, writes))
    }
}

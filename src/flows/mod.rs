// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flow controllers: the two view-models presentation talks to.
//!
//! Each controller hands presentation an event receiver at construction and
//! sends exactly one event per logical outcome. Dropping the receiver is
//! allowed; later events are discarded.

pub mod auth;
pub mod location;

pub use auth::{AuthEvent, AuthFlowController};
pub use location::{LocationEvent, LocationFlowController};

use tokio::sync::mpsc::UnboundedSender;

/// Send one event; a missing consumer is not an error.
pub(crate) fn notify<T: std::fmt::Debug>(events: &UnboundedSender<T>, event: T) {
    if let Err(e) = events.send(event) {
        tracing::debug!(event = ?e.0, "Presentation went away, dropping event");
    }
}

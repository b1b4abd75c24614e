// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod position;
pub mod user;

pub use position::{AuthorizationState, PositionFix};
pub use user::{Identity, UserRecord};

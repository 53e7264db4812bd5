// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Lifecycle
//!
//! Per-account states are implicit, never stored:
//!
//! ```text
//! Unauthenticated --register--> PendingConfirmation --confirm--> Authenticated
//!        ^                                                          |
//!        +------------------- both tokens expire -------------------+
//! ```
//!
//! `login` and `login_privileged` move straight to Authenticated;
//! `refresh_session` stays there and rotates the refresh token.

pub mod error;
pub mod issuer;
pub mod validation;

pub use error::SessionError;
pub use issuer::{IssuedSession, IssuerSettings, SessionIssuer};

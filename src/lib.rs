// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity Session - registration, login and token rotation service
//!
//! Turns a confirmed e-mail registration or a password login into a pair of
//! signed tokens bound to the caller's network origin, rotates refresh tokens
//! single-use, and gates every protected route through a reloadable
//! role/resource/method policy.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, password hashing, extractors and the policy gate middleware
//! - `session` - Registration, login and refresh flows
//! - `policy` - Deny-by-default authorisation rules with hot reload
//! - `storage` - Identity store, refresh vault and pending registrations
//! - `notify` - Outbound e-mail notifications

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod policy;
pub mod policy_reloader;
pub mod session;
pub mod state;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod testing;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens, password verifiers and the HTTP-facing authentication
//! layer.
//!
//! ## Auth Flow
//!
//! 1. Client logs in (or confirms a registration) and receives an
//!    access/refresh pair minted by [`codec::CredentialCodec`]
//! 2. Client sends `Authorization: Bearer <access token>`
//! 3. The policy gate middleware:
//!    - Verifies signature, issuer, kind and expiry
//!    - Extracts `sub` as `user_id` and the `role` claim
//!    - Asks the policy set whether the role may call this path and method
//!
//! ## Security
//!
//! - All routes except sign-up, login, refresh, health and docs are gated
//! - Any token verification failure is reported as a single error kind
//! - No clock skew tolerance: a token is valid strictly before `exp`

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod roles;

pub use claims::AuthenticatedUser;
pub use codec::{CredentialCodec, TokenPair};
pub use error::AuthError;
pub use extractor::{Auth, ClientOrigin};
pub use roles::Role;

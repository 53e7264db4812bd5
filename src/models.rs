// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the session endpoints. All types derive
//! `ToSchema` for the OpenAPI document.
//!
//! Contact fields also accept the key `email`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{Role, TokenPair};
use crate::session::IssuedSession;
use crate::storage::Account;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// E-mail address the confirmation code is sent to
    #[serde(alias = "email")]
    pub contact: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub contact: String,
    pub password: String,
}

/// Query of `GET /v1/users/verify`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmQuery {
    #[serde(alias = "email")]
    pub contact: String,
    /// Six-digit confirmation code
    pub code: String,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Public view of an account. Never carries verifiers or hashes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IdentityResponse {
    pub id: Uuid,
    pub contact: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for IdentityResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            contact: account.contact,
            display_name: account.display_name,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

/// Identity plus a fresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub identity: IdentityResponse,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl From<IssuedSession> for SessionResponse {
    fn from(session: IssuedSession) -> Self {
        Self {
            identity: session.account.into(),
            tokens: session.tokens,
        }
    }
}

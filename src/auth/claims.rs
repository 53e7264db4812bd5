// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and authenticated caller representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Which half of a session pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims signed into every access and refresh token.
///
/// `iss` is the real issuer (this service). The network address the client
/// used when the token was minted travels in its own `origin` claim and is
/// never rewritten after issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: account ID
    pub sub: String,
    /// Account role at issuance
    pub role: Role,
    /// Client network address at issuance
    pub origin: String,
    /// Token kind
    pub typ: TokenKind,
    /// Unique token ID
    pub jti: String,
    /// Issuer
    pub iss: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Caller identity established by a verified access token.
///
/// Inserted into request extensions by the policy gate middleware.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Account ID (`sub` claim)
    pub user_id: String,

    /// Account role
    pub role: Role,

    /// Network address the session was issued to
    pub origin: String,

    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            origin: claims.origin,
            expires_at: claims.exp,
        }
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token minting and verification.
//!
//! Tokens are HS256 JWTs signed with a single shared secret loaded at
//! startup. Verification fails closed: any problem with a presented token
//! yields [`AuthError::InvalidCredential`] and nothing else.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::claims::{SessionClaims, TokenKind};
use super::error::AuthError;
use super::roles::Role;

/// Default access token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Access + refresh token pair handed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (Unix timestamp)
    pub access_expires_at: i64,
    /// Refresh token expiry (Unix timestamp)
    pub refresh_expires_at: i64,
}

/// Mints and verifies signed session tokens.
#[derive(Clone)]
pub struct CredentialCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl CredentialCodec {
    /// Create a codec for the given signing secret and issuer name.
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Mint an access/refresh pair bound to `origin`.
    ///
    /// `access_ttl` overrides the configured access lifetime for this pair
    /// only; the refresh lifetime always comes from configuration.
    pub fn mint(
        &self,
        subject: &str,
        role: Role,
        origin: &str,
        access_ttl: Option<Duration>,
    ) -> Result<TokenPair, AuthError> {
        let issued_at = Utc::now().timestamp();
        let access_ttl = access_ttl.unwrap_or(self.access_ttl);

        let access = self.claims(subject, role, origin, TokenKind::Access, issued_at, access_ttl);
        let refresh = self.claims(
            subject,
            role,
            origin,
            TokenKind::Refresh,
            issued_at,
            self.refresh_ttl,
        );

        Ok(TokenPair {
            access_expires_at: access.exp,
            refresh_expires_at: refresh.exp,
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    /// Verify a token of the expected kind and return its claims.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(reason = ?e.kind(), "Token rejected");
            AuthError::InvalidCredential
        })?;
        let claims = data.claims;

        if claims.typ != expected {
            tracing::debug!(expected = %expected, presented = %claims.typ, "Token kind mismatch");
            return Err(AuthError::InvalidCredential);
        }
        // jsonwebtoken accepts exp == now; a token is only valid strictly before exp.
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidCredential);
        }

        Ok(claims)
    }

    fn claims(
        &self,
        subject: &str,
        role: Role,
        origin: &str,
        kind: TokenKind,
        issued_at: i64,
        ttl: Duration,
    ) -> SessionClaims {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);
        SessionClaims {
            sub: subject.to_string(),
            role,
            origin: origin.to_string(),
            typ: kind,
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        }
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }
}

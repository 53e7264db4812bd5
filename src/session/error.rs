// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session error taxonomy.
//!
//! Every variant except `Internal` is a stable, client-facing category.
//! `Internal` carries detail for the log only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::storage::{IdentityError, PendingStoreError, VaultError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    InvalidInput(String),

    /// Password login failed; never says whether the contact exists.
    #[error("Invalid contact or password")]
    InvalidCredentials,

    /// Presented token failed verification.
    #[error("Invalid or expired token")]
    InvalidCredential,

    #[error("Contact address is already registered")]
    DuplicateContact,

    #[error("Registration expired or not found, please register again")]
    ExpiredOrNotFound,

    #[error("Confirmation code does not match")]
    CodeMismatch,

    /// No account holds this refresh token as its current one.
    #[error("Session is no longer valid")]
    UnknownSession,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Upstream service unavailable")]
    UpstreamUnavailable,

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct SessionErrorBody {
    error: String,
    error_code: String,
}

impl SessionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::InvalidInput(_) => "invalid_input",
            SessionError::InvalidCredentials => "invalid_credentials",
            SessionError::InvalidCredential => "invalid_credential",
            SessionError::DuplicateContact => "duplicate_contact",
            SessionError::ExpiredOrNotFound => "expired_or_not_found",
            SessionError::CodeMismatch => "code_mismatch",
            SessionError::UnknownSession => "unknown_session",
            SessionError::PermissionDenied => "permission_denied",
            SessionError::UpstreamUnavailable => "upstream_unavailable",
            SessionError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::InvalidInput(_)
            | SessionError::CodeMismatch
            | SessionError::ExpiredOrNotFound => StatusCode::BAD_REQUEST,
            SessionError::InvalidCredentials
            | SessionError::InvalidCredential
            | SessionError::UnknownSession => StatusCode::UNAUTHORIZED,
            SessionError::PermissionDenied => StatusCode::FORBIDDEN,
            SessionError::DuplicateContact => StatusCode::CONFLICT,
            SessionError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            SessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for SessionError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidCredential => SessionError::InvalidCredential,
            AuthError::PermissionDenied => SessionError::PermissionDenied,
            AuthError::OriginUnavailable => {
                SessionError::InvalidInput("client address is unavailable".to_string())
            }
            AuthError::Internal(msg) => SessionError::Internal(msg),
        }
    }
}

impl From<IdentityError> for SessionError {
    fn from(e: IdentityError) -> Self {
        match e {
            // Callers that expect NotFound handle it before converting.
            IdentityError::NotFound => SessionError::Internal("account vanished".to_string()),
            IdentityError::Conflict(_) => SessionError::DuplicateContact,
            IdentityError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Identity store unavailable");
                SessionError::UpstreamUnavailable
            }
        }
    }
}

impl From<VaultError> for SessionError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::AccountNotFound => SessionError::UnknownSession,
            VaultError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Refresh vault unavailable");
                SessionError::UpstreamUnavailable
            }
            VaultError::Hashing(msg) => SessionError::Internal(msg),
        }
    }
}

impl From<PendingStoreError> for SessionError {
    fn from(e: PendingStoreError) -> Self {
        match e {
            PendingStoreError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Pending registration store unavailable");
                SessionError::UpstreamUnavailable
            }
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            SessionError::Internal(detail) => {
                tracing::error!(detail = %detail, "Session internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(SessionErrorBody {
            error: message,
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: SessionError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn categories_map_to_statuses() {
        let cases = [
            (SessionError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (SessionError::CodeMismatch, StatusCode::BAD_REQUEST),
            (SessionError::ExpiredOrNotFound, StatusCode::BAD_REQUEST),
            (SessionError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (SessionError::InvalidCredential, StatusCode::UNAUTHORIZED),
            (SessionError::UnknownSession, StatusCode::UNAUTHORIZED),
            (SessionError::PermissionDenied, StatusCode::FORBIDDEN),
            (SessionError::DuplicateContact, StatusCode::CONFLICT),
            (SessionError::UpstreamUnavailable, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, expected) in cases {
            let code = err.error_code();
            let (status, body) = body_json(err).await;
            assert_eq!(status, expected);
            assert_eq!(body["error_code"], code);
        }
    }

    #[tokio::test]
    async fn internal_detail_is_not_returned() {
        let (status, body) =
            body_json(SessionError::Internal("signing key missing".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["error_code"], "internal_error");
    }

    #[test]
    fn collaborator_errors_convert() {
        assert_eq!(
            SessionError::from(IdentityError::Unavailable("down".into())),
            SessionError::UpstreamUnavailable
        );
        assert_eq!(
            SessionError::from(IdentityError::Conflict("dup".into())),
            SessionError::DuplicateContact
        );
        assert_eq!(
            SessionError::from(VaultError::AccountNotFound),
            SessionError::UnknownSession
        );
        assert_eq!(
            SessionError::from(PendingStoreError::Unavailable("x".into())),
            SessionError::UpstreamUnavailable
        );
        assert_eq!(
            SessionError::from(AuthError::InvalidCredential),
            SessionError::InvalidCredential
        );
    }
}

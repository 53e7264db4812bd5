// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::policy::PolicyError;

/// Error for operator endpoints that sit outside the session taxonomy.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<PolicyError> for ApiError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::NoSource => ApiError::conflict(e.to_string()),
            PolicyError::Read { .. } | PolicyError::Poisoned => {
                tracing::error!(error = %e, "Policy reload failed");
                ApiError::internal("Internal server error")
            }
            PolicyError::Parse(_)
            | PolicyError::UnknownRole(_)
            | PolicyError::InvalidPattern { .. }
            | PolicyError::InvalidMethod { .. }
            | PolicyError::InheritanceCycle(_) => ApiError::unprocessable(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn policy_errors_map_to_statuses() {
        assert_eq!(ApiError::from(PolicyError::NoSource).status, StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(PolicyError::Parse("eof".into())).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(PolicyError::Read {
                path: "p".into(),
                reason: "gone".into()
            })
            .status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn read_failure_hides_path_and_os_error() {
        let error = ApiError::from(PolicyError::Read {
            path: "/etc/identity/policy.json".into(),
            reason: "Permission denied (os error 13)".into(),
        });
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.message.contains("/etc/identity"));
        assert!(!error.message.contains("os error"));
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::unprocessable("bad data").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}

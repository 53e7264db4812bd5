// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Policy gate middleware.
//!
//! Runs ahead of every route. Public routes (sign-up, login, refresh,
//! health and documentation) pass straight through. Everything else needs a
//! valid access token whose role the policy allows for the request's path
//! and method; the verified caller is then stored in request extensions for
//! the `Auth` extractor.

use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::claims::TokenKind;
use super::extractor::bearer_token;
use super::{AuthError, AuthenticatedUser};
use crate::policy::Decision;
use crate::state::AppState;

const PUBLIC_PATHS: &[&str] = &[
    "/v1/users/register",
    "/v1/users/verify",
    "/v1/users/login",
    "/v1/admins/login",
    "/health",
    "/health/live",
    "/health/ready",
];

const PUBLIC_PREFIXES: &[&str] = &["/v1/token/", "/docs", "/api-doc/"];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Axum middleware enforcing authentication and the policy set.
///
/// ```rust,ignore
/// router.layer(axum::middleware::from_fn_with_state(state.clone(), policy_gate))
/// ```
pub async fn policy_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    // Nested routers may see a stripped URI; policies are written against the full path.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path(), |uri| uri.path())
        .to_string();
    if is_public(&path) {
        return next.run(request).await;
    }

    let user = match authenticate(&state, &request) {
        Ok(user) => user,
        Err(e) => {
            debug!(path = %path, error_code = e.error_code(), "Request not authenticated");
            return e.into_response();
        }
    };

    let method = request.method().as_str().to_string();
    match state.policy.authorize(user.role, &path, &method) {
        Decision::Allow => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Decision::Deny => {
            warn!(
                account_id = %user.user_id,
                role = %user.role,
                method = %method,
                path = %path,
                "Policy denied request"
            );
            AuthError::PermissionDenied.into_response()
        }
    }
}

fn authenticate(state: &AppState, request: &Request) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(request.headers())?;
    let claims = state.codec.verify(token, TokenKind::Access)?;
    Ok(AuthenticatedUser::from_claims(claims))
}

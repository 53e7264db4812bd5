// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator endpoints for the policy set.
//!
//! Access is decided by the policy itself; the default policy grants
//! `/v1/admin/*` to `admin` and, through inheritance, `sudo`.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{auth::Auth, error::ApiError, policy::PolicyDocument, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyReloadResponse {
    /// Number of rules now in effect
    pub rules: usize,
}

/// Show the policy currently in effect.
#[utoipa::path(
    get,
    path = "/v1/admin/policy",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Live policy document", body = PolicyDocument),
        (status = 403, description = "Policy denies this role")
    )
)]
pub async fn get_policy(
    Auth(_user): Auth,
    State(state): State<AppState>,
) -> Result<Json<PolicyDocument>, ApiError> {
    let set = state
        .policy
        .snapshot()
        .ok_or_else(|| ApiError::internal("policy unavailable"))?;
    Ok(Json(set.document().clone()))
}

/// Re-read the policy file. On failure the previous policy stays in effect.
#[utoipa::path(
    post,
    path = "/v1/admin/policy/reload",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Policy reloaded", body = PolicyReloadResponse),
        (status = 403, description = "Policy denies this role"),
        (status = 409, description = "Policy was not loaded from a file"),
        (status = 422, description = "Policy file rejected, previous policy kept")
    )
)]
pub async fn reload_policy(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<PolicyReloadResponse>, ApiError> {
    info!(account_id = %user.user_id, "Policy reload requested");
    let rules = state.policy.reload()?;
    Ok(Json(PolicyReloadResponse { rules }))
}

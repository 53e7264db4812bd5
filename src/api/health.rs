// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Probes for orchestrators.
//!
//! `/health/live` never touches a dependency. `/health/ready` fails with 503
//! while the identity store is unreachable or the policy lock is poisoned,
//! since every session call would fail too. `/health` reports the same checks
//! but always answers 200, for dashboards.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

const OK: &str = "ok";

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// "ok" or "degraded"
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: String,
    /// "ok" or "unavailable"
    pub identity_store: String,
    /// "ok" or "poisoned"
    pub policy: String,
    /// Number of declared policy rules in effect
    pub policy_rules: usize,
}

impl HealthChecks {
    fn all_ok(&self) -> bool {
        self.identity_store == OK && self.policy == OK
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

async fn probe(state: &AppState) -> ReadyResponse {
    let identity_ok = matches!(
        tokio::time::timeout(PROBE_TIMEOUT, state.identity.ping()).await,
        Ok(Ok(()))
    );
    let snapshot = state.policy.snapshot();

    let checks = HealthChecks {
        service: OK.to_string(),
        identity_store: if identity_ok { OK } else { "unavailable" }.to_string(),
        policy: if snapshot.is_some() { OK } else { "poisoned" }.to_string(),
        policy_rules: snapshot.map_or(0, |set| set.rule_count()),
    };
    ReadyResponse {
        status: if checks.all_ok() { OK } else { "degraded" }.to_string(),
        checks,
    }
}

/// Component report. Always 200; read `status` for the verdict.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Component report", body = ReadyResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(probe(&state).await)
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is running", body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: OK.to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve sessions", body = ReadyResponse),
        (status = 503, description = "A dependency is down", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let report = probe(&state).await;
    let status = if report.checks.all_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

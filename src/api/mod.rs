// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info_span, Span};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{middleware::policy_gate, AuthenticatedUser, Role, TokenPair},
    models::{IdentityResponse, LoginRequest, MessageResponse, RegisterRequest, SessionResponse},
    policy::{PolicyDocument, RuleSpec},
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod sessions;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users/register", post(sessions::register))
        .route("/users/verify", get(sessions::confirm))
        .route("/users/login", post(sessions::login))
        .route("/admins/login", post(sessions::login_privileged))
        .route("/token/{refresh}", get(sessions::refresh))
        .route("/users/me", get(users::get_current_user))
        .route("/admin/policy", get(admin::get_policy))
        .route("/admin/policy/reload", post(admin::reload_policy));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), policy_gate))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        sessions::register,
        sessions::confirm,
        sessions::login,
        sessions::login_privileged,
        sessions::refresh,
        users::get_current_user,
        admin::get_policy,
        admin::reload_policy,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            MessageResponse,
            IdentityResponse,
            SessionResponse,
            TokenPair,
            Role,
            AuthenticatedUser,
            PolicyDocument,
            RuleSpec,
            users::UserMeResponse,
            admin::PolicyReloadResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Sessions", description = "Registration, login and refresh rotation"),
        (name = "Users", description = "Current caller"),
        (name = "Admin", description = "Policy management"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

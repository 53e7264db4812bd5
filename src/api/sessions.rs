// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration, login and refresh endpoints. All of them are public.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    auth::{ClientOrigin, TokenPair},
    models::{ConfirmQuery, LoginRequest, MessageResponse, RegisterRequest, SessionResponse},
    session::SessionError,
    state::AppState,
};

/// Start a registration and e-mail a confirmation code.
#[utoipa::path(
    post,
    path = "/v1/users/register",
    tag = "Sessions",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Confirmation code sent", body = MessageResponse),
        (status = 400, description = "Invalid contact, name or password"),
        (status = 409, description = "Contact already registered"),
        (status = 503, description = "Identity store unavailable")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, SessionError> {
    state
        .issuer
        .register(&payload.contact, &payload.display_name, &payload.password)
        .await?;
    Ok(Json(MessageResponse {
        message: "A verification code has been sent to your e-mail".to_string(),
    }))
}

/// Confirm a registration code, create the account and open a session.
#[utoipa::path(
    get,
    path = "/v1/users/verify",
    tag = "Sessions",
    params(ConfirmQuery),
    responses(
        (status = 200, description = "Account created", body = SessionResponse),
        (status = 400, description = "Code mismatch or registration expired"),
        (status = 503, description = "Identity store unavailable")
    )
)]
pub async fn confirm(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<SessionResponse>, SessionError> {
    let session = state
        .issuer
        .confirm_registration(&query.contact, &query.code, &origin)
        .await?;
    Ok(Json(session.into()))
}

/// Password login.
#[utoipa::path(
    post,
    path = "/v1/users/login",
    tag = "Sessions",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 401, description = "Invalid contact or password"),
        (status = 503, description = "Identity store unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, SessionError> {
    let session = state
        .issuer
        .login(&payload.contact, &payload.password, &origin)
        .await?;
    Ok(Json(session.into()))
}

/// Password login for `admin` and `sudo` accounts.
#[utoipa::path(
    post,
    path = "/v1/admins/login",
    tag = "Sessions",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Privileged session opened", body = SessionResponse),
        (status = 401, description = "Invalid contact or password"),
        (status = 403, description = "Account is not privileged"),
        (status = 503, description = "Identity store unavailable")
    )
)]
pub async fn login_privileged(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, SessionError> {
    let session = state
        .issuer
        .login_privileged(&payload.contact, &payload.password, &origin)
        .await?;
    Ok(Json(session.into()))
}

/// Exchange a refresh token for a new pair. The presented token stops
/// working as soon as this succeeds.
#[utoipa::path(
    get,
    path = "/v1/token/{refresh}",
    tag = "Sessions",
    params(("refresh" = String, Path, description = "Current refresh token")),
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Invalid, expired or superseded refresh token"),
        (status = 503, description = "Identity store unavailable")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    Path(refresh): Path<String>,
) -> Result<Json<TokenPair>, SessionError> {
    let tokens = state.issuer.refresh_session(&refresh, &origin).await?;
    Ok(Json(tokens))
}

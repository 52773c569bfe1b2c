//! Login and refresh endpoints for provisioned accounts.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::password::verify_password;
use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::storage::lookup_account_by_email;
use super::types::{LoginRequest, RefreshRequest, TokenPairResponse};
use super::utils::{extract_client_ip, normalize_email};

/// Exchange email + password for a session token pair.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPairResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Unknown email, wrong password, or inactive account", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Missing email or password".to_string(),
        )
            .into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Login)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }
    if auth_state
        .rate_limiter()
        .check_email(&email, RateLimitAction::Login)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let account = match lookup_account_by_email(&pool, &email).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            // Unknown email, wrong password, and inactive accounts share one
            // response so callers cannot probe for registered addresses.
            return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to lookup account for login: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                .into_response();
        }
    };

    if !account.is_active || !verify_password(&request.password, &account.password_hash) {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    }

    match auth_state.tokens().issue(account.id, &account.email).await {
        Ok(pair) => (
            StatusCode::OK,
            Json(TokenPairResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to issue token pair: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string()).into_response()
        }
    }
}

/// Rotate a refresh token into a fresh pair, invalidating the old token.
#[utoipa::path(
    post,
    path = "/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotation successful", body = TokenPairResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Expired, malformed, forged, or already rotated token", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let request: RefreshRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Refresh)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    match auth_state.tokens().rotate(request.refresh_token.trim()).await {
        Ok(Ok(pair)) => (
            StatusCode::OK,
            Json(TokenPairResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            }),
        )
            .into_response(),
        Ok(Err(token_error)) => {
            (StatusCode::UNAUTHORIZED, token_error.to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to rotate refresh token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token refresh failed".to_string(),
            )
                .into_response()
        }
    }
}

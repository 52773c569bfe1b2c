//! Handler tests for validation and token paths that never reach a live
//! database; lazy pools only fail once a query actually runs.

use super::login::{login, refresh};
use super::registration::{send_otp, verify_otp};
use super::types::{LoginRequest, RefreshRequest, SendOtpRequest, VerifyOtpRequest};
use super::{AuthConfig, AuthState, NoopRateLimiter, RateLimiter, TokenService};
use crate::api::email::LogEmailSender;
use anyhow::Result;
use axum::Json;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

fn auth_state() -> Arc<AuthState> {
    let config = AuthConfig::new("http://localhost:5173".to_string());
    let tokens = TokenService::new(SecretString::from("test-signing-key"), 3600, 604_800);
    let limiter: Arc<dyn RateLimiter> = Arc::new(NoopRateLimiter);
    Arc::new(AuthState::new(
        config,
        tokens,
        Arc::new(LogEmailSender),
        limiter,
    ))
}

fn pool() -> Result<PgPool> {
    Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
}

#[tokio::test]
async fn send_otp_missing_payload() -> Result<()> {
    let response = send_otp(HeaderMap::new(), Extension(pool()?), Extension(auth_state()), None)
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn send_otp_invalid_email() -> Result<()> {
    let response = send_otp(
        HeaderMap::new(),
        Extension(pool()?),
        Extension(auth_state()),
        Some(Json(SendOtpRequest {
            email: "not-an-email".to_string(),
            name: "Alice".to_string(),
            password: "Secr3t!".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn send_otp_missing_name() -> Result<()> {
    let response = send_otp(
        HeaderMap::new(),
        Extension(pool()?),
        Extension(auth_state()),
        Some(Json(SendOtpRequest {
            email: "alice@example.com".to_string(),
            name: "   ".to_string(),
            password: "Secr3t!".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn send_otp_empty_password() -> Result<()> {
    let response = send_otp(
        HeaderMap::new(),
        Extension(pool()?),
        Extension(auth_state()),
        Some(Json(SendOtpRequest {
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password: String::new(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn verify_otp_missing_payload() -> Result<()> {
    let response = verify_otp(HeaderMap::new(), Extension(pool()?), Extension(auth_state()), None)
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn verify_otp_invalid_email() -> Result<()> {
    let response = verify_otp(
        HeaderMap::new(),
        Extension(pool()?),
        Extension(auth_state()),
        Some(Json(VerifyOtpRequest {
            email: "missing-at.example.com".to_string(),
            otp: "123456".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn verify_otp_empty_code() -> Result<()> {
    let response = verify_otp(
        HeaderMap::new(),
        Extension(pool()?),
        Extension(auth_state()),
        Some(Json(VerifyOtpRequest {
            email: "alice@example.com".to_string(),
            otp: "  ".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_missing_payload() -> Result<()> {
    let response = login(HeaderMap::new(), Extension(pool()?), Extension(auth_state()), None)
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_empty_password() -> Result<()> {
    let response = login(
        HeaderMap::new(),
        Extension(pool()?),
        Extension(auth_state()),
        Some(Json(LoginRequest {
            email: "alice@example.com".to_string(),
            password: String::new(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn refresh_missing_payload() -> Result<()> {
    let response = refresh(HeaderMap::new(), Extension(auth_state()), None)
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn refresh_rejects_garbage_token() -> Result<()> {
    let response = refresh(
        HeaderMap::new(),
        Extension(auth_state()),
        Some(Json(RefreshRequest {
            refresh_token: "not-a-token".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_issued_tokens_once() -> Result<()> {
    let state = auth_state();
    let pair = state
        .tokens()
        .issue(uuid::Uuid::new_v4(), "alice@example.com")
        .await?;

    let response = refresh(
        HeaderMap::new(),
        Extension(state.clone()),
        Some(Json(RefreshRequest {
            refresh_token: pair.refresh_token.clone(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    // Replaying the consumed refresh token must fail.
    let response = refresh(
        HeaderMap::new(),
        Extension(state),
        Some(Json(RefreshRequest {
            refresh_token: pair.refresh_token,
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

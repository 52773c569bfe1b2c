//! Registration endpoints: code issuance and code redemption.
//!
//! An email address moves through three states: no ledger row, live code
//! issued, account provisioned. Issuing always supersedes whatever row the
//! address had; redemption consumes the row exactly once and promotes it
//! into an account in the same request.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::api::email::EmailMessage;

use super::otp::{self, RedeemOutcome};
use super::password::hash_password;
use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::storage::{AccountRecord, account_email_exists, insert_account};
use super::types::{AccountResponse, MessageResponse, SendOtpRequest, VerifyOtpRequest};
use super::utils::{extract_client_ip, generate_otp_code, normalize_email, valid_email};

fn account_response(account: AccountRecord) -> AccountResponse {
    AccountResponse {
        id: account.id.to_string(),
        email: account.email,
        display_name: account.display_name,
        is_active: account.is_active,
        is_staff: account.is_staff,
        is_admin: account.is_admin,
        created_at: account.created_at,
    }
}

/// Issue a registration code for an unclaimed email address.
#[utoipa::path(
    post,
    path = "/register/send-otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code issued and mailed", body = MessageResponse),
        (status = 400, description = "Validation error or email already registered", body = String),
        (status = 429, description = "Rate limited", body = String),
        (status = 502, description = "Code issued but email dispatch failed", body = String)
    ),
    tag = "register"
)]
pub async fn send_otp(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SendOtpRequest>>,
) -> impl IntoResponse {
    let request: SendOtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let name = request.name.trim().to_string();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing name".to_string()).into_response();
    }

    if request.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing password".to_string()).into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::SendOtp)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }
    if auth_state
        .rate_limiter()
        .check_email(&email, RateLimitAction::SendOtp)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    // Claimed addresses are rejected before the ledger is touched.
    match account_email_exists(&pool, &email).await {
        Ok(true) => {
            return (
                StatusCode::BAD_REQUEST,
                "Email already registered".to_string(),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(err) => {
            error!("Failed to check for existing account: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    }

    // The ledger stores the finished hash; plaintext never leaves this scope.
    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    };

    let code = generate_otp_code(auth_state.config().otp_length());
    let ttl_seconds = auth_state.config().otp_ttl_seconds();
    if let Err(err) = otp::issue(&pool, &email, &code, &name, &password_hash, ttl_seconds).await {
        error!("Failed to issue verification code: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Registration failed".to_string(),
        )
            .into_response();
    }

    // The ledger row is committed; delivery failure does not roll it back.
    let message = EmailMessage {
        to_email: email,
        subject: "Aliro - Email verification code".to_string(),
        body: format!(
            "Your registration code is: {code}\n\nThis code expires in {} minutes.",
            ttl_seconds / 60
        ),
    };
    if let Err(err) = auth_state.mailer().send(&message) {
        error!("Failed to send verification email: {err}");
        return (
            StatusCode::BAD_GATEWAY,
            "Failed to send verification email".to_string(),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Verification code sent".to_string(),
        }),
    )
        .into_response()
}

/// Redeem a registration code and provision the account.
#[utoipa::path(
    post,
    path = "/register/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Missing, expired, used, or wrong code", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "register"
)]
pub async fn verify_otp(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> impl IntoResponse {
    let request: VerifyOtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let supplied_code = request.otp.trim();
    if supplied_code.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing code".to_string()).into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::VerifyOtp)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }
    if auth_state
        .rate_limiter()
        .check_email(&email, RateLimitAction::VerifyOtp)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    let (display_name, password_hash) = match otp::redeem(&pool, &email, supplied_code).await {
        Ok(RedeemOutcome::Redeemed {
            display_name,
            password_hash,
        }) => (display_name, password_hash),
        Ok(RedeemOutcome::NotFound) => {
            return (
                StatusCode::BAD_REQUEST,
                "No code found for this email. Please request a new one.".to_string(),
            )
                .into_response();
        }
        Ok(RedeemOutcome::Expired) => {
            return (
                StatusCode::BAD_REQUEST,
                "Code has expired. Please request a new one.".to_string(),
            )
                .into_response();
        }
        Ok(RedeemOutcome::Mismatch) => {
            return (
                StatusCode::BAD_REQUEST,
                "Invalid code. Please try again.".to_string(),
            )
                .into_response();
        }
        Ok(RedeemOutcome::AlreadyUsed) => {
            return (
                StatusCode::BAD_REQUEST,
                "Code already used. Please request a new one.".to_string(),
            )
                .into_response();
        }
        Err(err) => {
            error!("Failed to redeem verification code: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response();
        }
    };

    // The code is consumed at this point; the insert is idempotent on the
    // email unique index, so a lost race still returns the provisioned
    // account instead of dropping the verified identity.
    match insert_account(&pool, &email, &display_name, &password_hash).await {
        Ok(account) => {
            (StatusCode::CREATED, Json(account_response(account))).into_response()
        }
        Err(err) => {
            error!("Failed to create account: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response()
        }
    }
}

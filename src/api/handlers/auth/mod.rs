//! Auth handlers and supporting modules.
//!
//! This module coordinates the registration flow (one-time codes), login,
//! and session token rotation.
//!
//! ## Registration ledger
//!
//! Pending registrations live in the `email_otps` table, one row per email.
//! Issuing a code replaces the address's previous row; redeeming takes a row
//! lock so a code is consumed exactly once even under concurrent duplicate
//! requests. The account insert that follows redemption is idempotent on
//! the email unique index.
//!
//! ## Session tokens
//!
//! Token signing and the refresh revocation set live in [`TokenService`].
//! The signing key is process-wide configuration; rotating it invalidates
//! every outstanding token.

pub(crate) mod login;
mod otp;
mod password;
mod rate_limit;
pub(crate) mod registration;
mod state;
mod storage;
mod tokens;
pub(crate) mod types;
mod utils;

pub use rate_limit::{NoopRateLimiter, RateLimitAction, RateLimitDecision, RateLimiter};
pub use state::{AuthConfig, AuthState};
pub use tokens::{Claims, TokenError, TokenKind, TokenPair, TokenService};

#[cfg(test)]
mod tests;

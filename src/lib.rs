//! # Aliro (Account Provisioning & Session Tokens)
//!
//! `aliro` provisions user accounts behind an email-ownership proof and
//! issues short-lived session credentials.
//!
//! ## Registration (one-time codes)
//!
//! Registration is a two-step flow. The first request stores a pending
//! registration in the code ledger (one live 6-digit code per email, 10
//! minute expiry) and mails the code to the address being claimed. The
//! second request presents the code; on a match the pending registration is
//! promoted into a durable account. The password is hashed with Argon2id
//! before the code is ever issued, so the ledger never sees plaintext.
//!
//! - **One row per email:** issuing a new code replaces any previous entry
//!   for that address, used or not. Older codes stop being redeemable the
//!   moment a new one is issued.
//! - **Single use:** a code redeems exactly once, also under concurrent
//!   duplicate requests. The per-email row lock in the ledger decides the
//!   winner; everyone else gets a retryable error.
//!
//! ## Sessions (JWT pairs)
//!
//! Logins and completed registrations mint an HS256-signed access/refresh
//! pair. Refresh tokens are single-use: exchanging one blacklists its token
//! identifier, and replaying a rotated token is rejected. All outstanding
//! refresh tokens for an account can be revoked at once, which is the hook
//! for password changes and admin deactivation.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

//! Database helpers for durable accounts.

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::is_unique_violation;

/// A provisioned account row.
#[derive(Debug, Clone)]
pub(super) struct AccountRecord {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) display_name: String,
    pub(super) password_hash: String,
    pub(super) is_active: bool,
    pub(super) is_staff: bool,
    pub(super) is_admin: bool,
    pub(super) created_at: String,
}

const ACCOUNT_COLUMNS: &str = r"
    id, email, display_name, password_hash,
    is_active, is_staff, is_admin, created_at::text AS created_at
";

fn account_from_row(row: &sqlx::postgres::PgRow) -> AccountRecord {
    AccountRecord {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        is_staff: row.get("is_staff"),
        is_admin: row.get("is_admin"),
        created_at: row.get("created_at"),
    }
}

/// Check whether an account already exists for this email.
pub(super) async fn account_email_exists(pool: &PgPool, email: &str) -> Result<bool> {
    let query = "SELECT 1 FROM accounts WHERE email = $1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check for existing account")?;
    Ok(row.is_some())
}

/// Fetch a full account row by email.
pub(super) async fn lookup_account_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AccountRecord>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 LIMIT 1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by email")?;
    Ok(row.as_ref().map(account_from_row))
}

/// Create the durable account for a verified registration.
///
/// The hash is stored byte-for-byte as redeemed from the ledger; it was
/// finalized when the code was issued and is never re-hashed here. A unique
/// violation on email means a concurrent request already provisioned the
/// account, so the existing row is fetched and returned instead of erroring.
/// Other failures get one retry: the code is already consumed at this point,
/// and giving up would strand a verified identity with no account.
pub(super) async fn insert_account(
    pool: &PgPool,
    email: &str,
    display_name: &str,
    password_hash: &str,
) -> Result<AccountRecord> {
    let query = format!(
        r"
        INSERT INTO accounts (id, email, display_name, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING {ACCOUNT_COLUMNS}
        "
    );

    let mut last_error = None;
    for _ in 0..2 {
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = %query
        );
        let result = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(display_name)
            .bind(password_hash)
            .fetch_one(pool)
            .instrument(span)
            .await;

        match result {
            Ok(row) => return Ok(account_from_row(&row)),
            Err(err) if is_unique_violation(&err) => {
                // Lost the provisioning race; the verified identity already
                // has an account, so hand that one back.
                return lookup_account_by_email(pool, email)
                    .await?
                    .ok_or_else(|| anyhow!("account missing after unique violation for {email}"));
            }
            Err(err) => last_error = Some(err),
        }
    }

    Err(last_error.map_or_else(
        || anyhow!("failed to insert account"),
        |err| anyhow::Error::new(err).context("failed to insert account"),
    ))
}

//! The one-time code ledger.
//!
//! One row per email. Issuing upserts on the email key, so older codes stop
//! being redeemable the instant a new one exists. Redemption takes a row
//! lock (`FOR UPDATE`) on the same key, which serializes concurrent redeems
//! and concurrent issues for one address; rows for different addresses
//! never contend.
//!
//! Expiry is evaluated lazily at redemption time against the database clock.
//! An external sweep may also delete `expires_at < NOW()` rows; the ledger
//! does not depend on it.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

/// Result of presenting a code for an email.
#[derive(Debug)]
pub(super) enum RedeemOutcome {
    /// The code matched; the row is now marked used and the stored
    /// registration data is returned exactly once.
    Redeemed {
        display_name: String,
        password_hash: String,
    },
    /// No row exists for this email.
    NotFound,
    /// The row was already redeemed; indistinguishable from absent for
    /// retry purposes but reported distinctly to flag possible replays.
    AlreadyUsed,
    /// The row expired and has been deleted as a side effect.
    Expired,
    /// Wrong code; the row is left untouched so the caller may retry.
    Mismatch,
}

/// Store a fresh live code for `email`, replacing any previous row.
///
/// A single upsert keyed on the email primary key: concurrent issues for
/// the same address serialize on the row and the last committed writer
/// wins, so earlier codes stop being redeemable without any window where
/// two live rows exist.
pub(super) async fn issue(
    pool: &PgPool,
    email: &str,
    code: &str,
    display_name: &str,
    password_hash: &str,
    ttl_seconds: i64,
) -> Result<()> {
    let query = r"
        INSERT INTO email_otps
            (email, code, display_name, password_hash, used, created_at, expires_at)
        VALUES ($1, $2, $3, $4, FALSE, NOW(), NOW() + ($5 * INTERVAL '1 second'))
        ON CONFLICT (email) DO UPDATE
        SET code = EXCLUDED.code,
            display_name = EXCLUDED.display_name,
            password_hash = EXCLUDED.password_hash,
            used = FALSE,
            created_at = NOW(),
            expires_at = EXCLUDED.expires_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(code)
        .bind(display_name)
        .bind(password_hash)
        .bind(ttl_seconds)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to upsert otp row")?;

    Ok(())
}

/// Present a code for `email` and consume the row on a match.
///
/// The row lock makes redemption exactly-once: of N concurrent calls with
/// the correct code, one sees a live row and flips it to used; the rest
/// observe the used row after the first commit.
pub(super) async fn redeem(
    pool: &PgPool,
    email: &str,
    supplied_code: &str,
) -> Result<RedeemOutcome> {
    let mut tx = pool.begin().await.context("begin otp redeem transaction")?;

    let query = r"
        SELECT code, display_name, password_hash, used,
               (expires_at <= NOW()) AS expired
        FROM email_otps
        WHERE email = $1
        FOR UPDATE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to lock otp row")?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Ok(RedeemOutcome::NotFound);
    };

    let used: bool = row.get("used");
    if used {
        let _ = tx.rollback().await;
        return Ok(RedeemOutcome::AlreadyUsed);
    }

    let expired: bool = row.get("expired");
    if expired {
        // Expired rows are deleted on detection so a retry reports NotFound.
        let query = "DELETE FROM email_otps WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(email)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to delete expired otp row")?;
        tx.commit().await.context("commit expired otp delete")?;
        return Ok(RedeemOutcome::Expired);
    }

    let code: String = row.get("code");
    if code != supplied_code {
        let _ = tx.rollback().await;
        return Ok(RedeemOutcome::Mismatch);
    }

    let query = "UPDATE email_otps SET used = TRUE WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to mark otp row used")?;

    tx.commit().await.context("commit otp redeem transaction")?;

    Ok(RedeemOutcome::Redeemed {
        display_name: row.get("display_name"),
        password_hash: row.get("password_hash"),
    })
}

#[cfg(test)]
mod tests {
    use super::RedeemOutcome;

    #[test]
    fn redeem_outcome_debug_names() {
        assert_eq!(format!("{:?}", RedeemOutcome::NotFound), "NotFound");
        assert_eq!(format!("{:?}", RedeemOutcome::AlreadyUsed), "AlreadyUsed");
        assert_eq!(format!("{:?}", RedeemOutcome::Expired), "Expired");
        assert_eq!(format!("{:?}", RedeemOutcome::Mismatch), "Mismatch");
    }

    #[test]
    fn redeemed_outcome_carries_registration_data() {
        let outcome = RedeemOutcome::Redeemed {
            display_name: "Alice".to_string(),
            password_hash: "$argon2id$stub".to_string(),
        };
        let RedeemOutcome::Redeemed {
            display_name,
            password_hash,
        } = outcome
        else {
            panic!("expected Redeemed");
        };
        assert_eq!(display_name, "Alice");
        assert_eq!(password_hash, "$argon2id$stub");
    }
}

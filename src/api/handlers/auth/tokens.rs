//! Session token service: HS256 JWT pairs with single-use refresh tokens.
//!
//! Access tokens are short-lived and verified statelessly. Refresh tokens
//! carry a random identifier (`jti`); exchanging one blacklists that
//! identifier, so a replayed refresh token is rejected with
//! `AlreadyRotated`. Blacklist additions are visible to the next `rotate`
//! call immediately. Expired identifiers are pruned whenever the set is
//! touched, which keeps it bounded by the refresh TTL.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize, Debug)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Which half of a pair a token is. Serialized into the `typ` claim so an
/// access token can never be replayed as a refresh token or vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed claims carried by both token kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
    pub typ: TokenKind,
}

/// Why a token was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Not a three-part JWT, or header/claims did not parse.
    Malformed,
    /// Signature did not verify against the service key.
    BadSignature,
    /// Signature verified but the token is past its `exp`.
    Expired,
    /// Valid token of the wrong kind for this operation.
    WrongKind,
    /// Refresh token identifier is in the revocation set.
    AlreadyRotated,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Malformed => "Malformed token",
            Self::BadSignature => "Invalid token signature",
            Self::Expired => "Token has expired",
            Self::WrongKind => "Wrong token type",
            Self::AlreadyRotated => "Refresh token already used",
        };
        write!(f, "{message}")
    }
}

impl std::error::Error for TokenError {}

/// An access/refresh pair as handed to clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh-token bookkeeping: identifier -> expiry (unix seconds).
struct Revocations {
    /// Rotated or revoked identifiers; rejected until they expire anyway.
    rotated: HashMap<Uuid, i64>,
    /// Live refresh identifiers per account, for `revoke_all`.
    outstanding: HashMap<Uuid, HashMap<Uuid, i64>>,
}

impl Revocations {
    fn prune(&mut self, now: i64) {
        self.rotated.retain(|_, exp| *exp > now);
        self.outstanding.retain(|_, jtis| {
            jtis.retain(|_, exp| *exp > now);
            !jtis.is_empty()
        });
    }
}

pub struct TokenService {
    signing_key: SecretString,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    revocations: Mutex<Revocations>,
}

impl TokenService {
    #[must_use]
    pub fn new(
        signing_key: SecretString,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            signing_key,
            access_ttl_seconds,
            refresh_ttl_seconds,
            revocations: Mutex::new(Revocations {
                rotated: HashMap::new(),
                outstanding: HashMap::new(),
            }),
        }
    }

    /// Mint a fresh access/refresh pair for an account.
    ///
    /// # Errors
    /// Returns an error if claim serialization or signing fails.
    pub async fn issue(&self, account_id: Uuid, email: &str) -> Result<TokenPair> {
        let now = now_unix();
        let access = self.encode(&Claims {
            sub: account_id,
            email: email.to_string(),
            iat: now,
            exp: now + self.access_ttl_seconds,
            jti: Uuid::new_v4(),
            typ: TokenKind::Access,
        })?;

        let refresh_jti = Uuid::new_v4();
        let refresh_exp = now + self.refresh_ttl_seconds;
        let refresh = self.encode(&Claims {
            sub: account_id,
            email: email.to_string(),
            iat: now,
            exp: refresh_exp,
            jti: refresh_jti,
            typ: TokenKind::Refresh,
        })?;

        let mut revocations = self.revocations.lock().await;
        revocations.prune(now);
        revocations
            .outstanding
            .entry(account_id)
            .or_default()
            .insert(refresh_jti, refresh_exp);

        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
        })
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    /// `Malformed`, `BadSignature`, `Expired`, or `WrongKind`.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.typ != TokenKind::Access {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }

    /// Exchange a refresh token for a fresh pair, blacklisting the old one.
    ///
    /// # Errors
    /// Token errors per [`TokenError`]; `anyhow` only for signing failures.
    pub async fn rotate(&self, refresh_token: &str) -> Result<Result<TokenPair, TokenError>> {
        let claims = match self.decode(refresh_token) {
            Ok(claims) => claims,
            Err(err) => return Ok(Err(err)),
        };
        if claims.typ != TokenKind::Refresh {
            return Ok(Err(TokenError::WrongKind));
        }

        {
            let now = now_unix();
            let mut revocations = self.revocations.lock().await;
            revocations.prune(now);
            if revocations.rotated.contains_key(&claims.jti) {
                return Ok(Err(TokenError::AlreadyRotated));
            }
            // Every refresh is single-use: blacklist before the new pair
            // exists so a concurrent replay cannot win.
            revocations.rotated.insert(claims.jti, claims.exp);
            if let Some(jtis) = revocations.outstanding.get_mut(&claims.sub) {
                jtis.remove(&claims.jti);
            }
        }

        let pair = self.issue(claims.sub, &claims.email).await?;
        Ok(Ok(pair))
    }

    /// Blacklist every outstanding refresh token for an account.
    ///
    /// Used on password change and admin deactivation; access tokens are
    /// left to age out on their short TTL.
    pub async fn revoke_all(&self, account_id: Uuid) {
        let now = now_unix();
        let mut revocations = self.revocations.lock().await;
        revocations.prune(now);
        if let Some(jtis) = revocations.outstanding.remove(&account_id) {
            revocations.rotated.extend(jtis);
        }
    }

    fn encode(&self, claims: &Claims) -> Result<String> {
        let header = TokenHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let header_json = serde_json::to_vec(&header).context("failed to serialize token header")?;
        let claims_json = serde_json::to_vec(claims).context("failed to serialize token claims")?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let mut mac = HmacSha256::new_from_slice(self.signing_key.expose_secret().as_bytes())
            .context("invalid signing key")?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header_raw = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| TokenError::Malformed)?;
        let header: TokenHeader =
            serde_json::from_slice(&header_raw).map_err(|_| TokenError::Malformed)?;
        if header.alg != "HS256" || !header.typ.eq_ignore_ascii_case("JWT") {
            return Err(TokenError::Malformed);
        }

        // Signature is checked before the claims are trusted for anything,
        // including the expiry comparison.
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = HmacSha256::new_from_slice(self.signing_key.expose_secret().as_bytes())
            .map_err(|_| TokenError::BadSignature)?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims_raw = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_raw).map_err(|_| TokenError::Malformed)?;

        if now_unix() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(0))
}

use crate::api;
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub signing_key: SecretString,
    pub otp_ttl_seconds: i64,
    pub otp_length: usize,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub frontend_base_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database connection or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = api::handlers::auth::AuthConfig::new(args.frontend_base_url)
        .with_otp_ttl_seconds(args.otp_ttl_seconds)
        .with_otp_length(args.otp_length)
        .with_access_ttl_seconds(args.access_ttl_seconds)
        .with_refresh_ttl_seconds(args.refresh_ttl_seconds);

    api::new(args.port, args.dsn, args.signing_key, auth_config).await
}

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SIGNING_KEY: &str = "signing-key";

/// Validated auth options collected from the CLI.
#[derive(Debug)]
pub struct Options {
    pub signing_key: SecretString,
    pub otp_ttl_seconds: i64,
    pub otp_length: usize,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub frontend_base_url: String,
}

impl Options {
    /// Collect auth arguments from parsed matches.
    ///
    /// # Errors
    /// Returns an error if the signing key is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let signing_key = matches
            .get_one::<String>(ARG_SIGNING_KEY)
            .cloned()
            .context("missing required argument: --signing-key")?;

        Ok(Self {
            signing_key: SecretString::from(signing_key),
            otp_ttl_seconds: matches
                .get_one::<i64>("otp-ttl-seconds")
                .copied()
                .unwrap_or(600),
            otp_length: matches.get_one::<usize>("otp-length").copied().unwrap_or(6),
            access_ttl_seconds: matches
                .get_one::<i64>("access-ttl-seconds")
                .copied()
                .unwrap_or(3600),
            refresh_ttl_seconds: matches
                .get_one::<i64>("refresh-ttl-seconds")
                .copied()
                .unwrap_or(604_800),
            frontend_base_url: matches
                .get_one::<String>("frontend-base-url")
                .cloned()
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SIGNING_KEY)
                .long("signing-key")
                .help("Secret key used to sign session tokens")
                .env("ALIRO_SIGNING_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("otp-ttl-seconds")
                .long("otp-ttl-seconds")
                .help("One-time code TTL in seconds")
                .env("ALIRO_OTP_TTL_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("otp-length")
                .long("otp-length")
                .help("Number of digits in a one-time code")
                .env("ALIRO_OTP_LENGTH")
                .default_value("6")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("access-ttl-seconds")
                .long("access-ttl-seconds")
                .help("Access token TTL in seconds")
                .env("ALIRO_ACCESS_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-ttl-seconds")
                .long("refresh-ttl-seconds")
                .help("Refresh token TTL in seconds")
                .env("ALIRO_REFRESH_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL allowed for CORS")
                .env("ALIRO_FRONTEND_BASE_URL")
                .default_value("http://localhost:5173"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn command() -> Command {
        with_args(Command::new("aliro"))
    }

    #[test]
    fn parse_defaults() {
        let matches =
            command().get_matches_from(vec!["aliro", "--signing-key", "super-secret"]);
        let options = Options::parse(&matches).expect("options");
        assert_eq!(options.signing_key.expose_secret(), "super-secret");
        assert_eq!(options.otp_ttl_seconds, 600);
        assert_eq!(options.otp_length, 6);
        assert_eq!(options.access_ttl_seconds, 3600);
        assert_eq!(options.refresh_ttl_seconds, 604_800);
        assert_eq!(options.frontend_base_url, "http://localhost:5173");
    }

    #[test]
    fn parse_overrides() {
        let matches = command().get_matches_from(vec![
            "aliro",
            "--signing-key",
            "k",
            "--otp-ttl-seconds",
            "300",
            "--otp-length",
            "8",
            "--access-ttl-seconds",
            "900",
            "--refresh-ttl-seconds",
            "86400",
            "--frontend-base-url",
            "https://app.aliro.dev",
        ]);
        let options = Options::parse(&matches).expect("options");
        assert_eq!(options.otp_ttl_seconds, 300);
        assert_eq!(options.otp_length, 8);
        assert_eq!(options.access_ttl_seconds, 900);
        assert_eq!(options.refresh_ttl_seconds, 86_400);
        assert_eq!(options.frontend_base_url, "https://app.aliro.dev");
    }

    #[test]
    fn signing_key_from_env() {
        temp_env::with_var("ALIRO_SIGNING_KEY", Some("from-env"), || {
            let matches = command().get_matches_from(vec!["aliro"]);
            let options = Options::parse(&matches).expect("options");
            assert_eq!(options.signing_key.expose_secret(), "from-env");
        });
    }
}

//! Request/response types for the registration and session endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

// Passwords never reach logs, including through Debug formatting.
impl std::fmt::Debug for SendOtpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendOtpRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_admin: bool,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn send_otp_request_round_trips() -> Result<()> {
        let request = SendOtpRequest {
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password: "Secr3t!".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let email = value
            .get("email")
            .and_then(serde_json::Value::as_str)
            .context("missing email")?;
        assert_eq!(email, "alice@example.com");
        let decoded: SendOtpRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.name, "Alice");
        Ok(())
    }

    #[test]
    fn verify_otp_request_round_trips() -> Result<()> {
        let request = VerifyOtpRequest {
            email: "bob@example.com".to_string(),
            otp: "042137".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let decoded: VerifyOtpRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.otp, "042137");
        Ok(())
    }

    #[test]
    fn debug_output_redacts_passwords() {
        let request = SendOtpRequest {
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password: "Secr3t!".to_string(),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("Secr3t!"));
        assert!(debug.contains("***"));

        let login = LoginRequest {
            email: "alice@example.com".to_string(),
            password: "Secr3t!".to_string(),
        };
        let debug = format!("{login:?}");
        assert!(!debug.contains("Secr3t!"));
    }
}

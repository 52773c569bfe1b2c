//! Email delivery abstraction for one-time code dispatch.
//!
//! The registration flow commits the ledger row first and only then hands
//! the message to an `EmailSender`, so delivery never holds a row lock. A
//! failed send is reported to the caller, but the committed code stays
//! redeemable; the user can retry the send by requesting a new code.
//!
//! The default sender for local dev is `LogEmailSender`, which logs the
//! envelope and returns `Ok(())`. Production deployments implement
//! `EmailSender` over their transport of choice (SMTP, provider API, queue).

use anyhow::Result;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction used by the registration flow.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error to surface a transport failure.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the envelope instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        // The body is withheld: it carries the one-time code.
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

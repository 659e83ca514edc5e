//! Port for the transactional-email provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;

define_port_error! {
    /// Errors raised by mailer adapters.
    pub enum MailerError {
        /// The provider rejected the send or was unreachable.
        Send { message: String } =>
            "email send failed: {message}",
    }
}

/// Port for sending expiry-reminder emails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpiryMailer: Send + Sync {
    /// Whether provider credentials are configured. When false, the sweep
    /// skips email work entirely.
    fn is_configured(&self) -> bool;

    /// Send one reminder to `recipient` about a verification expiring in
    /// `days_until_expiry` whole days, on `expires_at`.
    async fn send_expiry_reminder(
        &self,
        recipient: &str,
        days_until_expiry: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), MailerError>;
}

/// Fixture implementation representing an unconfigured provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureExpiryMailer;

#[async_trait]
impl ExpiryMailer for FixtureExpiryMailer {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send_expiry_reminder(
        &self,
        _recipient: &str,
        _days_until_expiry: i64,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), MailerError> {
        Ok(())
    }
}

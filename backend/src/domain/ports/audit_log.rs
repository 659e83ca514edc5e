//! Port for the append-only verification audit log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by audit-log adapters.
    pub enum AuditLogError {
        /// Log connection could not be established.
        Connection { message: String } =>
            "audit log connection failed: {message}",
        /// Append failed during execution.
        Query { message: String } =>
            "audit log append failed: {message}",
    }
}

/// Kinds of verification audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationEventKind {
    /// An ID verification lapsed past its validity window.
    IdVerificationExpired,
    /// An expiry-reminder email was handed to the provider.
    ExpiryReminderEmailed,
}

impl VerificationEventKind {
    /// Stable event-type name stored in the log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IdVerificationExpired => "id_verification_expired",
            Self::ExpiryReminderEmailed => "id_verification_reminder_emailed",
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationEvent {
    /// The affected user.
    pub user_id: Uuid,
    /// Event type.
    pub kind: VerificationEventKind,
    /// Structured event details.
    pub details: Value,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Port for appending verification audit events.
///
/// Adapters treat a missing relation as a skipped write rather than a
/// failure, so deploying the job ahead of the audit-table migration does not
/// crash the sweep.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationAuditLog: Send + Sync {
    /// Append one event.
    async fn record(&self, event: &VerificationEvent) -> Result<(), AuditLogError>;
}

/// Fixture implementation that discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVerificationAuditLog;

#[async_trait]
impl VerificationAuditLog for FixtureVerificationAuditLog {
    async fn record(&self, _event: &VerificationEvent) -> Result<(), AuditLogError> {
        Ok(())
    }
}

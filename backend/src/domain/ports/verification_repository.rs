//! Port for verification-profile persistence.
//!
//! The maintenance sweep drives this port twice per run: one bulk expiry
//! transition, then one candidate query for the reminder window.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by verification-profile repository adapters.
    pub enum VerificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "verification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "verification repository query failed: {message}",
    }
}

/// A row transitioned to `expired` by the bulk sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredVerification {
    /// The affected user.
    pub user_id: Uuid,
    /// The expiry timestamp the row carried before the transition, recorded
    /// for audit traceability.
    pub previous_expires_at: DateTime<Utc>,
}

/// A still-verified profile whose expiry falls inside the reminder window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderCandidate {
    /// The affected user.
    pub user_id: Uuid,
    /// Contact address, if the profile has one.
    pub email: Option<String>,
    /// When the current verification cycle started.
    pub verified_at: Option<DateTime<Utc>>,
    /// When the verification lapses.
    pub expires_at: DateTime<Utc>,
}

/// Port for the profile store's verification columns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationProfileRepository: Send + Sync {
    /// Transition every verified profile whose expiry has passed to
    /// `expired`, returning the affected rows.
    ///
    /// Rerunning after a completed sweep matches nothing (the rows no longer
    /// carry `verified` status), so the operation is naturally idempotent.
    async fn expire_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiredVerification>, VerificationRepositoryError>;

    /// Fetch profiles still verified with `expires_at` in
    /// `(now, now + window_days]`.
    async fn reminder_candidates(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Vec<ReminderCandidate>, VerificationRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVerificationProfileRepository;

#[async_trait]
impl VerificationProfileRepository for FixtureVerificationProfileRepository {
    async fn expire_due(
        &self,
        _now: DateTime<Utc>,
    ) -> Result<Vec<ExpiredVerification>, VerificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn reminder_candidates(
        &self,
        _now: DateTime<Utc>,
        _window_days: i64,
    ) -> Result<Vec<ReminderCandidate>, VerificationRepositoryError> {
        Ok(Vec::new())
    }
}

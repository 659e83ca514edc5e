//! Port for the reminder dedupe log.
//!
//! The log enforces at-most-once reminder delivery per
//! `(user, cycle, threshold, channel)` key. Claims are atomic
//! (insert-if-absent), so concurrent sweeps racing on the same key resolve to
//! exactly one winner at the log layer.

use async_trait::async_trait;

use crate::domain::reminder::ReminderKey;

use super::define_port_error;

define_port_error! {
    /// Errors raised by reminder-log adapters.
    pub enum ReminderLogError {
        /// Log connection could not be established.
        Connection { message: String } =>
            "reminder log connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "reminder log query failed: {message}",
    }
}

/// Port for reminder idempotency claims.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderLog: Send + Sync {
    /// Atomically claim a key.
    ///
    /// Returns `true` when this call created the claim and the caller owns
    /// the reminder, `false` when the key was already claimed (by an earlier
    /// run or a concurrent one).
    async fn try_claim(&self, key: &ReminderKey) -> Result<bool, ReminderLogError>;

    /// Withdraw a claim after a failed delivery so the next sweep retries.
    async fn release(&self, key: &ReminderKey) -> Result<(), ReminderLogError>;
}

/// Fixture implementation that grants every claim.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReminderLog;

#[async_trait]
impl ReminderLog for FixtureReminderLog {
    async fn try_claim(&self, _key: &ReminderKey) -> Result<bool, ReminderLogError> {
        Ok(true)
    }

    async fn release(&self, _key: &ReminderKey) -> Result<(), ReminderLogError> {
        Ok(())
    }
}

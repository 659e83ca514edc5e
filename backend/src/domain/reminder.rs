//! Expiry-reminder thresholds and the reminder idempotency key.
//!
//! Day arithmetic is whole-UTC-day (midnight to midnight), never fractional
//! hours or millisecond division: a reminder threshold must not be missed
//! because of timezone or DST drift within a day.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Day-counts before expiry at which a one-time reminder is due.
pub const REMINDER_THRESHOLD_DAYS: [i64; 4] = [90, 30, 7, 1];

/// Width of the reminder candidate window, in days.
pub const REMINDER_WINDOW_DAYS: i64 = 90;

/// Delivery channel of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderChannel {
    /// The dedupe-log row itself is the in-app reminder.
    InApp,
    /// Transactional email via the configured provider.
    Email,
}

impl ReminderChannel {
    /// Stable name used in the dedupe log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
        }
    }
}

/// First-class idempotency key for one reminder.
///
/// `cycle_verified_at` pins the key to the specific verification event, so a
/// re-verification naturally opens a new reminder cycle without any cleanup.
/// A key is claimed atomically (insert-if-absent); existence of a claim means
/// "this reminder was already sent for this cycle".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderKey {
    /// The user the reminder is for.
    pub user_id: Uuid,
    /// Verification timestamp that opened this reminder cycle.
    pub cycle_verified_at: DateTime<Utc>,
    /// Which threshold this reminder covers.
    pub threshold_days: i64,
    /// Delivery channel.
    pub channel: ReminderChannel,
}

impl ReminderKey {
    /// Build the key for one (user, cycle, threshold, channel) tuple.
    pub fn new(
        user_id: Uuid,
        cycle_verified_at: DateTime<Utc>,
        threshold_days: i64,
        channel: ReminderChannel,
    ) -> Self {
        Self {
            user_id,
            cycle_verified_at,
            threshold_days,
            channel,
        }
    }
}

/// Whole-UTC-day difference between `now` and `expires_at`.
///
/// Both instants are truncated to their UTC calendar date before
/// differencing, so "90 days out" means ninety midnight boundaries, not
/// `90 * 24` hours.
pub fn whole_days_until(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> i64 {
    (expires_at.date_naive() - now.date_naive()).num_days()
}

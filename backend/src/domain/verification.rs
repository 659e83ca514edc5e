//! Verification flags and the ID-verification lifecycle.
//!
//! Email, phone, and ID verification are set by separate collaborator flows.
//! ID verification is the only entity with a decay lifecycle: a fixed
//! validity window after which the maintenance sweep transitions the record
//! to [`IdVerificationStatus::Expired`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Validity window of an ID verification, in days (three years).
pub const ID_VERIFICATION_VALIDITY_DAYS: i64 = 3 * 365;

/// Lifecycle status of a user's ID verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdVerificationStatus {
    /// Never attempted.
    None,
    /// Submitted and awaiting review.
    Pending,
    /// Verified and within the validity window.
    Verified,
    /// Previously verified; the validity window has elapsed.
    Expired,
    /// Review rejected the submission.
    Rejected,
}

impl Default for IdVerificationStatus {
    fn default() -> Self {
        Self::None
    }
}

/// ID-verification state for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdVerification {
    /// Current lifecycle status.
    pub status: IdVerificationStatus,
    /// When the verification was granted.
    pub verified_at: Option<DateTime<Utc>>,
    /// When the verification lapses.
    pub expires_at: Option<DateTime<Utc>>,
}

impl IdVerification {
    /// A verification granted at `verified_at` with the standard window.
    pub fn granted(verified_at: DateTime<Utc>) -> Self {
        Self {
            status: IdVerificationStatus::Verified,
            verified_at: Some(verified_at),
            expires_at: Some(verified_at + Duration::days(ID_VERIFICATION_VALIDITY_DAYS)),
        }
    }

    /// Whether the verification currently counts as valid.
    pub fn is_verified(&self) -> bool {
        self.status == IdVerificationStatus::Verified
    }
}

/// Per-user verification flags consumed by the eligibility gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationState {
    /// Email ownership confirmed.
    pub email_verified: bool,
    /// Phone ownership confirmed.
    pub phone_verified: bool,
    /// ID verification record.
    pub id_verification: IdVerification,
}

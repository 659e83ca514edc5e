//! Port for materialising an eligibility snapshot.

use async_trait::async_trait;

use crate::domain::eligibility::EligibilitySnapshot;
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by eligibility snapshot adapters.
    pub enum EligibilityQueryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "eligibility store connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "eligibility store query failed: {message}",
    }
}

/// Port for loading the consent, verification, profile, subscription, and
/// usage state of an authenticated user as one immutable snapshot.
///
/// The returned snapshot carries `authenticated: true`; callers without a
/// session evaluate against [`EligibilitySnapshot::default`] instead and
/// never reach this port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EligibilitySnapshotQuery: Send + Sync {
    /// Materialise the snapshot for a user. Missing collaborator rows map to
    /// their defaults (empty consents, unverified, empty profile, free tier).
    async fn fetch_snapshot(
        &self,
        user_id: &UserId,
    ) -> Result<EligibilitySnapshot, EligibilityQueryError>;
}

/// Fixture implementation returning a bare authenticated snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEligibilitySnapshotQuery;

#[async_trait]
impl EligibilitySnapshotQuery for FixtureEligibilitySnapshotQuery {
    async fn fetch_snapshot(
        &self,
        _user_id: &UserId,
    ) -> Result<EligibilitySnapshot, EligibilityQueryError> {
        Ok(EligibilitySnapshot {
            authenticated: true,
            ..EligibilitySnapshot::default()
        })
    }
}

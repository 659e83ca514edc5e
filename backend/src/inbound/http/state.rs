//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{EligibilitySnapshotQuery, VerificationMaintenance};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Snapshot loader for the eligibility endpoints.
    pub eligibility: Arc<dyn EligibilitySnapshotQuery>,
    /// The maintenance sweep behind its driving port.
    pub maintenance: Arc<dyn VerificationMaintenance>,
    /// Shared secret protecting the maintenance trigger. `None` leaves the
    /// endpoint open, for deployments where the ingress enforces access.
    pub maintenance_secret: Option<String>,
}

impl HttpState {
    /// Construct state from port implementations.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use amity_backend::domain::ports::{
    ///     FixtureEligibilitySnapshotQuery, FixtureVerificationMaintenance,
    /// };
    /// use amity_backend::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::new(
    ///     Arc::new(FixtureEligibilitySnapshotQuery),
    ///     Arc::new(FixtureVerificationMaintenance),
    ///     Some("s3cret".to_owned()),
    /// );
    /// let _maintenance = state.maintenance.clone();
    /// ```
    pub fn new(
        eligibility: Arc<dyn EligibilitySnapshotQuery>,
        maintenance: Arc<dyn VerificationMaintenance>,
        maintenance_secret: Option<String>,
    ) -> Self {
        Self {
            eligibility,
            maintenance,
            maintenance_secret,
        }
    }
}

//! Driving port for the verification maintenance sweep.

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::maintenance::MaintenanceSummary;

/// Port the HTTP trigger drives; implemented by
/// [`crate::domain::VerificationMaintenanceService`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationMaintenance: Send + Sync {
    /// Run one full sweep (expiry phase, then reminder phase).
    async fn run(&self) -> Result<MaintenanceSummary, DomainError>;
}

/// Fixture implementation reporting an empty sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVerificationMaintenance;

#[async_trait]
impl VerificationMaintenance for FixtureVerificationMaintenance {
    async fn run(&self) -> Result<MaintenanceSummary, DomainError> {
        Ok(MaintenanceSummary::default())
    }
}

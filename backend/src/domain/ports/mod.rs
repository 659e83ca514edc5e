//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod audit_log;
mod eligibility_query;
mod mailer;
mod maintenance;
mod reminder_log;
mod verification_repository;

#[cfg(test)]
pub use audit_log::MockVerificationAuditLog;
pub use audit_log::{
    AuditLogError, FixtureVerificationAuditLog, VerificationAuditLog, VerificationEvent,
    VerificationEventKind,
};
#[cfg(test)]
pub use eligibility_query::MockEligibilitySnapshotQuery;
pub use eligibility_query::{
    EligibilityQueryError, EligibilitySnapshotQuery, FixtureEligibilitySnapshotQuery,
};
#[cfg(test)]
pub use mailer::MockExpiryMailer;
pub use mailer::{ExpiryMailer, FixtureExpiryMailer, MailerError};
#[cfg(test)]
pub use maintenance::MockVerificationMaintenance;
pub use maintenance::{FixtureVerificationMaintenance, VerificationMaintenance};
#[cfg(test)]
pub use reminder_log::MockReminderLog;
pub use reminder_log::{FixtureReminderLog, ReminderLog, ReminderLogError};
#[cfg(test)]
pub use verification_repository::MockVerificationProfileRepository;
pub use verification_repository::{
    ExpiredVerification, FixtureVerificationProfileRepository, ReminderCandidate,
    VerificationProfileRepository, VerificationRepositoryError,
};

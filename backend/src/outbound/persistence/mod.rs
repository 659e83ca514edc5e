//! Diesel/PostgreSQL persistence adapters.

pub mod diesel_audit_log;
pub mod diesel_eligibility_query;
pub mod diesel_reminder_log;
pub mod diesel_verification_repository;
pub mod models;
pub mod pool;
pub mod schema;

pub use diesel_audit_log::DieselVerificationAuditLog;
pub use diesel_eligibility_query::DieselEligibilitySnapshotQuery;
pub use diesel_reminder_log::DieselReminderLog;
pub use diesel_verification_repository::DieselVerificationProfileRepository;
pub use pool::{DbPool, PoolConfig, PoolError};

//! Domain types and services.
//!
//! Purpose: define the eligibility gate and the verification-lifecycle
//! maintenance sweep as pure logic over strongly typed snapshots, keeping all
//! I/O behind the ports in [`ports`]. Types are immutable; invariants and
//! serialisation contracts are documented on each type.

pub mod consent;
pub mod eligibility;
pub mod error;
pub mod maintenance;
pub mod ports;
pub mod profile;
pub mod reminder;
pub mod subscription;
pub mod user;
pub mod verification;

pub use self::consent::{ConsentRecord, PolicyVersions, UserConsents};
pub use self::eligibility::{
    AppFeature, BookingRequirements, CompanionRequirements, EligibilitySnapshot, EvaluationMode,
    RequirementCheck, RequirementKey, can_access_feature, evaluate_booking_requirements,
    evaluate_companion_requirements,
};
pub use self::error::{DomainError, ErrorCode};
pub use self::maintenance::{MaintenanceSummary, VerificationMaintenanceService};
pub use self::profile::{ProfileCompletion, ProfileSnapshot};
pub use self::reminder::{
    REMINDER_THRESHOLD_DAYS, REMINDER_WINDOW_DAYS, ReminderChannel, ReminderKey, whole_days_until,
};
pub use self::subscription::{
    FriendsFeature, FriendsUsage, Limit, SubscriptionTier, TierLimits, can_use_friends_feature,
};
pub use self::user::{UserId, UserIdValidationError};
pub use self::verification::{
    ID_VERIFICATION_VALIDITY_DAYS, IdVerification, IdVerificationStatus, VerificationState,
};

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

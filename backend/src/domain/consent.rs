//! User consents and policy versioning.
//!
//! A versioned consent (terms, privacy) only counts as accepted when the
//! stored version equals the currently deployed required version. Bumping a
//! policy version therefore forces re-consent without touching stored rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Policy versions currently required for a consent to count as accepted.
///
/// The deployed defaults live in [`PolicyVersions::current`]; tests construct
/// arbitrary versions to exercise the mismatch rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVersions {
    /// Required terms-of-service version.
    pub terms: String,
    /// Required privacy-policy version.
    pub privacy: String,
}

/// Terms-of-service version shipped with this deployment.
pub const CURRENT_TERMS_VERSION: &str = "2.1";
/// Privacy-policy version shipped with this deployment.
pub const CURRENT_PRIVACY_VERSION: &str = "2.0";

impl PolicyVersions {
    /// The versions required by this deployment.
    pub fn current() -> Self {
        Self {
            terms: CURRENT_TERMS_VERSION.to_owned(),
            privacy: CURRENT_PRIVACY_VERSION.to_owned(),
        }
    }
}

impl Default for PolicyVersions {
    fn default() -> Self {
        Self::current()
    }
}

/// A single accept-flag with its timestamp and, where applicable, the policy
/// version the user accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Whether the user has accepted.
    pub accepted: bool,
    /// When the user accepted, if ever.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Stored policy version at acceptance time. `None` for unversioned
    /// consents (age confirmation, electronic signature).
    pub version: Option<String>,
}

impl ConsentRecord {
    /// An accepted record for the given version.
    pub fn accepted_version(version: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            accepted: true,
            accepted_at: Some(at),
            version: Some(version.into()),
        }
    }

    /// An accepted record without version tracking.
    pub fn accepted_at(at: DateTime<Utc>) -> Self {
        Self {
            accepted: true,
            accepted_at: Some(at),
            version: None,
        }
    }

    /// Whether this record satisfies the given required version.
    ///
    /// Unversioned requirements (`required == None`) only need the flag; a
    /// versioned requirement additionally needs an exact version match, so a
    /// stale stored version is treated as unaccepted.
    pub fn satisfies(&self, required: Option<&str>) -> bool {
        if !self.accepted {
            return false;
        }
        match required {
            None => true,
            Some(required) => self.version.as_deref() == Some(required),
        }
    }
}

/// Per-user consent state.
///
/// Created empty on signup, mutated only by explicit accept actions.
/// Revocation resets fields to defaults; nothing is hard-deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConsents {
    /// Terms-of-service acceptance (versioned).
    pub terms: ConsentRecord,
    /// Privacy-policy acceptance (versioned).
    pub privacy: ConsentRecord,
    /// Age confirmation (18+).
    pub age_confirmed: ConsentRecord,
    /// Electronic-signature consent.
    pub electronic_signature: ConsentRecord,
    /// Companion agreement, required to offer companionship.
    pub companion_agreement: ConsentRecord,
    /// Marketing communications opt-in. Not a gate input.
    pub marketing_opt_in: bool,
}

impl UserConsents {
    /// Whether the stored terms acceptance matches the required version.
    pub fn terms_accepted(&self, required: &PolicyVersions) -> bool {
        self.terms.satisfies(Some(required.terms.as_str()))
    }

    /// Whether the stored privacy acceptance matches the required version.
    pub fn privacy_accepted(&self, required: &PolicyVersions) -> bool {
        self.privacy.satisfies(Some(required.privacy.as_str()))
    }
}

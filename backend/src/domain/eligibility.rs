//! The eligibility gate.
//!
//! A pure evaluation over an [`EligibilitySnapshot`]: no I/O, no side
//! effects, no hidden context. Callers materialise the snapshot (from the
//! database or from client state) and ask whether a named action is
//! permitted. Failures are first-class `met: false` results carrying a
//! human-readable reason and a remediation pointer; the gate never errors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::consent::{PolicyVersions, UserConsents};
use super::profile::ProfileSnapshot;
use super::subscription::{FriendsFeature, FriendsUsage, SubscriptionTier, can_use_friends_feature};
use super::verification::VerificationState;

/// Route of the sign-in screen.
pub const SIGN_IN_ROUTE: &str = "/auth/sign-in";

/// A named boolean gate with its reason and remediation pointer.
///
/// The reason strings are fixed copy, not computed; a satisfied check carries
/// an empty reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequirementCheck {
    /// Whether the requirement is met.
    pub met: bool,
    /// Human-readable reason shown when unmet.
    pub requirement: String,
    /// Short label for the remediation action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Route the remediation action navigates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate_to: Option<String>,
}

impl RequirementCheck {
    /// A met check with no reason.
    pub fn satisfied() -> Self {
        Self {
            met: true,
            requirement: String::new(),
            action: None,
            navigate_to: None,
        }
    }

    /// An unmet check with its remediation.
    pub fn unmet(
        requirement: impl Into<String>,
        action: impl Into<String>,
        navigate_to: impl Into<String>,
    ) -> Self {
        Self {
            met: false,
            requirement: requirement.into(),
            action: Some(action.into()),
            navigate_to: Some(navigate_to.into()),
        }
    }

    fn gate(met: bool, key: RequirementKey) -> Self {
        if met {
            Self::satisfied()
        } else {
            let copy = key.remediation();
            Self::unmet(copy.requirement, copy.action, copy.navigate_to)
        }
    }
}

/// Named requirement keys, in fixed priority order.
///
/// The declaration order is the tie-break for which single reason a client
/// shows first; [`RequirementKey::BOOKING`] preserves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum RequirementKey {
    /// A session is present.
    Authenticated,
    /// The user confirmed they are 18 or older.
    AgeConfirmed,
    /// Current terms-of-service version accepted.
    TermsAccepted,
    /// Current privacy-policy version accepted.
    PrivacyAccepted,
    /// Email ownership confirmed.
    EmailVerified,
    /// Phone ownership confirmed.
    PhoneVerified,
    /// ID verification valid and unexpired.
    IdVerified,
    /// Profile photo present.
    PhotoVerified,
    /// All seven required profile fields present.
    ProfileComplete,
    /// Companion agreement accepted (companion flow only).
    CompanionAgreementAccepted,
}

/// Fixed remediation copy for a requirement key.
struct RemediationCopy {
    requirement: &'static str,
    action: &'static str,
    navigate_to: &'static str,
}

impl RequirementKey {
    /// The nine booking keys, in priority order.
    pub const BOOKING: [Self; 9] = [
        Self::Authenticated,
        Self::AgeConfirmed,
        Self::TermsAccepted,
        Self::PrivacyAccepted,
        Self::EmailVerified,
        Self::PhoneVerified,
        Self::IdVerified,
        Self::PhotoVerified,
        Self::ProfileComplete,
    ];

    fn remediation(self) -> RemediationCopy {
        match self {
            Self::Authenticated => RemediationCopy {
                requirement: "Sign in to continue",
                action: "Sign In",
                navigate_to: SIGN_IN_ROUTE,
            },
            Self::AgeConfirmed => RemediationCopy {
                requirement: "Confirm that you are 18 or older",
                action: "Confirm Age",
                navigate_to: "/onboarding/age",
            },
            Self::TermsAccepted => RemediationCopy {
                requirement: "Accept the current Terms of Service",
                action: "Review Terms",
                navigate_to: "/legal/terms",
            },
            Self::PrivacyAccepted => RemediationCopy {
                requirement: "Accept the current Privacy Policy",
                action: "Review Policy",
                navigate_to: "/legal/privacy",
            },
            Self::EmailVerified => RemediationCopy {
                requirement: "Verify your email address",
                action: "Verify Email",
                navigate_to: "/verify/email",
            },
            Self::PhoneVerified => RemediationCopy {
                requirement: "Verify your phone number",
                action: "Verify Phone",
                navigate_to: "/verify/phone",
            },
            Self::IdVerified => RemediationCopy {
                requirement: "Verify your identity with a photo ID",
                action: "Verify ID",
                navigate_to: "/verify/id",
            },
            Self::PhotoVerified => RemediationCopy {
                requirement: "Add a profile photo",
                action: "Add Photo",
                navigate_to: "/profile/photo",
            },
            Self::ProfileComplete => RemediationCopy {
                requirement: "Complete your profile",
                action: "Edit Profile",
                navigate_to: "/profile/edit",
            },
            Self::CompanionAgreementAccepted => RemediationCopy {
                requirement: "Accept the companion agreement",
                action: "Review Agreement",
                navigate_to: "/companion/agreement",
            },
        }
    }
}

/// Progressively stricter bars applied at different points of a booking flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Lighter bar for initiating a booking flow. ID and photo verification
    /// are deferred.
    Entry,
    /// Full bar enforced right before a booking is confirmed.
    Finalize,
}

impl EvaluationMode {
    /// Whether this mode counts `key` towards the unmet set.
    ///
    /// Every check is always computed; the mode only scopes the unmet-set.
    pub fn includes(self, key: RequirementKey) -> bool {
        match self {
            Self::Finalize => true,
            Self::Entry => !matches!(
                key,
                RequirementKey::IdVerified | RequirementKey::PhotoVerified
            ),
        }
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entry => "entry",
            Self::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown evaluation mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown evaluation mode: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for EvaluationMode {
    type Err = ParseModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "entry" => Ok(Self::Entry),
            "finalize" => Ok(Self::Finalize),
            other => Err(ParseModeError(other.to_owned())),
        }
    }
}

/// Immutable snapshot of everything the gate reads.
///
/// Materialised once per evaluation; concurrent evaluations are independent
/// pure computations over their own snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilitySnapshot {
    /// Whether a session is present.
    pub authenticated: bool,
    /// Consent state.
    pub consents: UserConsents,
    /// Verification flags.
    pub verification: VerificationState,
    /// Profile fields.
    pub profile: ProfileSnapshot,
    /// Subscription tier.
    pub tier: SubscriptionTier,
    /// Monthly friends usage counters.
    pub friends_usage: FriendsUsage,
    /// Policy versions required by this deployment.
    pub policy_versions: PolicyVersions,
}

/// Result of evaluating the booking bar.
///
/// All nine checks are individually addressable; `all_met` and
/// `unmet_requirements` are derived from the same mode-scoped subset, so the
/// two can never drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequirements {
    /// Mode the unmet set was scoped to.
    pub mode: EvaluationMode,
    /// Session presence.
    pub authenticated: RequirementCheck,
    /// Age confirmation.
    pub age_confirmed: RequirementCheck,
    /// Versioned terms acceptance.
    pub terms_accepted: RequirementCheck,
    /// Versioned privacy acceptance.
    pub privacy_accepted: RequirementCheck,
    /// Email verification.
    pub email_verified: RequirementCheck,
    /// Phone verification.
    pub phone_verified: RequirementCheck,
    /// ID verification.
    pub id_verified: RequirementCheck,
    /// Photo presence.
    pub photo_verified: RequirementCheck,
    /// Profile completion.
    pub profile_complete: RequirementCheck,
    /// True iff the mode-scoped unmet set is empty.
    pub all_met: bool,
    /// Unmet keys in priority order.
    pub unmet_requirements: Vec<RequirementKey>,
}

impl BookingRequirements {
    /// Address a single check by key.
    ///
    /// `CompanionAgreementAccepted` is not part of the booking bar; booking
    /// evaluation never emits it, so it folds into the profile arm here.
    pub fn check(&self, key: RequirementKey) -> &RequirementCheck {
        match key {
            RequirementKey::Authenticated => &self.authenticated,
            RequirementKey::AgeConfirmed => &self.age_confirmed,
            RequirementKey::TermsAccepted => &self.terms_accepted,
            RequirementKey::PrivacyAccepted => &self.privacy_accepted,
            RequirementKey::EmailVerified => &self.email_verified,
            RequirementKey::PhoneVerified => &self.phone_verified,
            RequirementKey::IdVerified => &self.id_verified,
            RequirementKey::PhotoVerified => &self.photo_verified,
            RequirementKey::ProfileComplete | RequirementKey::CompanionAgreementAccepted => {
                &self.profile_complete
            }
        }
    }

    /// The first unmet check, in priority order.
    pub fn first_unmet(&self) -> Option<&RequirementCheck> {
        self.unmet_requirements.first().map(|key| self.check(*key))
    }
}

/// Result of evaluating the companion bar: the entry booking bar plus the
/// companion agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanionRequirements {
    /// The underlying entry-mode booking evaluation.
    pub booking: BookingRequirements,
    /// Companion-agreement acceptance.
    pub companion_agreement_accepted: RequirementCheck,
    /// True iff the union of unmet sets is empty.
    pub all_met: bool,
    /// Unmet keys: booking keys first, then the companion agreement.
    pub unmet_requirements: Vec<RequirementKey>,
}

impl CompanionRequirements {
    /// The first unmet check, in priority order.
    pub fn first_unmet(&self) -> Option<&RequirementCheck> {
        self.unmet_requirements.first().map(|key| match key {
            RequirementKey::CompanionAgreementAccepted => &self.companion_agreement_accepted,
            other => self.booking.check(*other),
        })
    }
}

fn evaluate(snapshot: &EligibilitySnapshot, key: RequirementKey) -> RequirementCheck {
    let met = match key {
        RequirementKey::Authenticated => snapshot.authenticated,
        RequirementKey::AgeConfirmed => snapshot.consents.age_confirmed.accepted,
        RequirementKey::TermsAccepted => {
            snapshot.consents.terms_accepted(&snapshot.policy_versions)
        }
        RequirementKey::PrivacyAccepted => {
            snapshot.consents.privacy_accepted(&snapshot.policy_versions)
        }
        RequirementKey::EmailVerified => snapshot.verification.email_verified,
        RequirementKey::PhoneVerified => snapshot.verification.phone_verified,
        RequirementKey::IdVerified => snapshot.verification.id_verification.is_verified(),
        RequirementKey::PhotoVerified => snapshot.profile.photo_verified(),
        RequirementKey::ProfileComplete => snapshot.profile.completion().is_complete,
        RequirementKey::CompanionAgreementAccepted => {
            snapshot.consents.companion_agreement.satisfies(None)
        }
    };
    RequirementCheck::gate(met, key)
}

/// Evaluate the booking bar for the given mode.
///
/// Computes all nine checks regardless of mode; the mode determines which
/// keys participate in `all_met` and `unmet_requirements`.
pub fn evaluate_booking_requirements(
    snapshot: &EligibilitySnapshot,
    mode: EvaluationMode,
) -> BookingRequirements {
    let unmet_requirements: Vec<RequirementKey> = RequirementKey::BOOKING
        .into_iter()
        .filter(|key| mode.includes(*key))
        .filter(|key| !evaluate(snapshot, *key).met)
        .collect();

    BookingRequirements {
        mode,
        authenticated: evaluate(snapshot, RequirementKey::Authenticated),
        age_confirmed: evaluate(snapshot, RequirementKey::AgeConfirmed),
        terms_accepted: evaluate(snapshot, RequirementKey::TermsAccepted),
        privacy_accepted: evaluate(snapshot, RequirementKey::PrivacyAccepted),
        email_verified: evaluate(snapshot, RequirementKey::EmailVerified),
        phone_verified: evaluate(snapshot, RequirementKey::PhoneVerified),
        id_verified: evaluate(snapshot, RequirementKey::IdVerified),
        photo_verified: evaluate(snapshot, RequirementKey::PhotoVerified),
        profile_complete: evaluate(snapshot, RequirementKey::ProfileComplete),
        all_met: unmet_requirements.is_empty(),
        unmet_requirements,
    }
}

/// Evaluate the companion bar: the entry booking bar plus the companion
/// agreement, with `all_met`/`unmet_requirements` recomputed over the union.
pub fn evaluate_companion_requirements(snapshot: &EligibilitySnapshot) -> CompanionRequirements {
    let booking = evaluate_booking_requirements(snapshot, EvaluationMode::Entry);
    let companion_agreement_accepted =
        evaluate(snapshot, RequirementKey::CompanionAgreementAccepted);

    let mut unmet_requirements = booking.unmet_requirements.clone();
    if !companion_agreement_accepted.met {
        unmet_requirements.push(RequirementKey::CompanionAgreementAccepted);
    }

    CompanionRequirements {
        booking,
        companion_agreement_accepted,
        all_met: unmet_requirements.is_empty(),
        unmet_requirements,
    }
}

/// Closed set of gateable app features.
///
/// Matched exhaustively: adding a feature without a handler in
/// [`can_access_feature`] is a compile error, never a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppFeature {
    /// Browse companion listings.
    Browse,
    /// View a companion profile.
    ViewProfile,
    /// Start a booking.
    Book,
    /// Message a companion.
    Message,
    /// Leave a review.
    Review,
    /// Begin the become-a-companion flow.
    BecomeCompanion,
    /// Safety centre.
    Safety,
    /// Subscription management.
    Subscription,
    /// A friends-namespace feature, gated by tier limits.
    Friends(FriendsFeature),
}

impl fmt::Display for AppFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browse => f.write_str("browse"),
            Self::ViewProfile => f.write_str("view_profile"),
            Self::Book => f.write_str("book"),
            Self::Message => f.write_str("message"),
            Self::Review => f.write_str("review"),
            Self::BecomeCompanion => f.write_str("become_companion"),
            Self::Safety => f.write_str("safety"),
            Self::Subscription => f.write_str("subscription"),
            Self::Friends(feature) => write!(f, "friends.{feature}"),
        }
    }
}

/// Error returned when parsing an unknown feature name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown app feature: {0}")]
pub struct ParseAppFeatureError(pub String);

impl FromStr for AppFeature {
    type Err = ParseAppFeatureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = value.strip_prefix("friends.") {
            return rest
                .parse::<FriendsFeature>()
                .map(Self::Friends)
                .map_err(|_| ParseAppFeatureError(value.to_owned()));
        }
        match value {
            "browse" => Ok(Self::Browse),
            "view_profile" => Ok(Self::ViewProfile),
            "book" => Ok(Self::Book),
            "message" => Ok(Self::Message),
            "review" => Ok(Self::Review),
            "become_companion" => Ok(Self::BecomeCompanion),
            "safety" => Ok(Self::Safety),
            "subscription" => Ok(Self::Subscription),
            other => Err(ParseAppFeatureError(other.to_owned())),
        }
    }
}

fn authenticated_only(snapshot: &EligibilitySnapshot) -> RequirementCheck {
    RequirementCheck::gate(snapshot.authenticated, RequirementKey::Authenticated)
}

/// Check whether the snapshot's user may access a feature right now.
///
/// Booking-adjacent features surface only the first unmet booking
/// requirement (single-reason UX contract); friends features delegate to the
/// tier-limit check; the remainder require only authentication.
pub fn can_access_feature(snapshot: &EligibilitySnapshot, feature: AppFeature) -> RequirementCheck {
    match feature {
        AppFeature::Book | AppFeature::Message | AppFeature::Review => {
            let requirements = evaluate_booking_requirements(snapshot, EvaluationMode::Entry);
            requirements
                .first_unmet()
                .cloned()
                .unwrap_or_else(RequirementCheck::satisfied)
        }
        AppFeature::BecomeCompanion => {
            let requirements = evaluate_companion_requirements(snapshot);
            requirements
                .first_unmet()
                .cloned()
                .unwrap_or_else(RequirementCheck::satisfied)
        }
        AppFeature::Friends(friends_feature) => can_use_friends_feature(snapshot, friends_feature),
        AppFeature::Browse
        | AppFeature::ViewProfile
        | AppFeature::Safety
        | AppFeature::Subscription => authenticated_only(snapshot),
    }
}

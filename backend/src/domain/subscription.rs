//! Subscription tiers and friends-feature usage ceilings.
//!
//! Counted limits use an explicit [`Limit`] sum type rather than a sentinel
//! value, so "unbounded" is unmistakable at every call site.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::eligibility::{EligibilitySnapshot, RequirementCheck};

/// Route of the subscription screen, used by every upgrade remediation.
pub const SUBSCRIPTION_ROUTE: &str = "/subscription";

/// Four-tier subscription ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    /// No paid plan.
    Free,
    /// Entry paid plan with bounded friends usage.
    Plus,
    /// Unbounded counts; unlocks posting.
    Premium,
    /// Everything, including event creation and priority matching.
    Elite,
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Free
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Free => "free",
            Self::Plus => "plus",
            Self::Premium => "premium",
            Self::Elite => "elite",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subscription tier: {0}")]
pub struct ParseTierError(pub String);

impl FromStr for SubscriptionTier {
    type Err = ParseTierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "free" => Ok(Self::Free),
            "plus" => Ok(Self::Plus),
            "premium" => Ok(Self::Premium),
            "elite" => Ok(Self::Elite),
            other => Err(ParseTierError(other.to_owned())),
        }
    }
}

/// A monthly usage ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    /// At most this many uses per month. Zero means the tier cannot use the
    /// feature at all.
    AtMost(u32),
    /// No ceiling.
    Unbounded,
}

impl Limit {
    /// Whether the feature is available to the tier at all.
    pub fn is_available(self) -> bool {
        !matches!(self, Self::AtMost(0))
    }

    /// Whether `used` has reached the ceiling.
    pub fn is_reached(self, used: u32) -> bool {
        match self {
            Self::AtMost(cap) => used >= cap,
            Self::Unbounded => false,
        }
    }
}

/// Static per-tier feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    /// Monthly friend-match ceiling.
    pub matches_per_month: Limit,
    /// Concurrent group-membership ceiling.
    pub groups_can_join: Limit,
    /// May publish posts to the friends feed.
    pub can_post: bool,
    /// May create events.
    pub can_create_events: bool,
    /// Receives priority in matching.
    pub priority_matching: bool,
}

impl TierLimits {
    /// Look up the static limits for a tier.
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => Self {
                matches_per_month: Limit::AtMost(0),
                groups_can_join: Limit::AtMost(0),
                can_post: false,
                can_create_events: false,
                priority_matching: false,
            },
            SubscriptionTier::Plus => Self {
                matches_per_month: Limit::AtMost(5),
                groups_can_join: Limit::AtMost(3),
                can_post: false,
                can_create_events: false,
                priority_matching: false,
            },
            SubscriptionTier::Premium => Self {
                matches_per_month: Limit::Unbounded,
                groups_can_join: Limit::Unbounded,
                can_post: true,
                can_create_events: false,
                priority_matching: false,
            },
            SubscriptionTier::Elite => Self {
                matches_per_month: Limit::Unbounded,
                groups_can_join: Limit::Unbounded,
                can_post: true,
                can_create_events: true,
                priority_matching: true,
            },
        }
    }
}

/// Monthly friends-feature usage counters.
///
/// Counters are derived by counting collaborator rows scoped to the current
/// calendar month, never incremented in place, so no reset bookkeeping is
/// needed beyond computing the month boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendsUsage {
    /// Matches initiated this calendar month.
    pub matches_this_month: u32,
    /// Groups the user currently belongs to.
    pub groups_joined: u32,
    /// When the monthly counters start from zero again. `None` when the
    /// snapshot source has no clock (e.g. the unauthenticated default).
    pub resets_on: Option<NaiveDate>,
}

impl FriendsUsage {
    /// First day of the next calendar month, when counters start from zero.
    pub fn next_reset_date(today: NaiveDate) -> NaiveDate {
        let (year, month) = if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        };
        // Day 1 of a valid month always exists.
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
    }
}

/// Gated friends features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendsFeature {
    /// Initiate a friend match.
    Match,
    /// Join a friends group.
    JoinGroup,
    /// Publish a post.
    Post,
    /// Create an event.
    CreateEvent,
}

impl fmt::Display for FriendsFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Match => "match",
            Self::JoinGroup => "join_group",
            Self::Post => "post",
            Self::CreateEvent => "create_event",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown friends feature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown friends feature: {0}")]
pub struct ParseFriendsFeatureError(pub String);

impl FromStr for FriendsFeature {
    type Err = ParseFriendsFeatureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "match" => Ok(Self::Match),
            "join_group" => Ok(Self::JoinGroup),
            "post" => Ok(Self::Post),
            "create_event" => Ok(Self::CreateEvent),
            other => Err(ParseFriendsFeatureError(other.to_owned())),
        }
    }
}

fn upgrade_required(requirement: impl Into<String>) -> RequirementCheck {
    RequirementCheck::unmet(requirement, "Upgrade", SUBSCRIPTION_ROUTE)
}

fn counted_feature_check(
    limit: Limit,
    used: u32,
    label: &str,
    resets_on: Option<NaiveDate>,
) -> RequirementCheck {
    if !limit.is_available() {
        // Upsell: the tier has no allowance for this feature at all.
        return upgrade_required(format!("{label} isn't included in your current plan"));
    }
    if limit.is_reached(used) {
        let requirement = match resets_on {
            Some(date) => format!(
                "You've reached your monthly {label} limit; your allowance resets on {}",
                date.format("%-d %B"),
            ),
            None => format!("You've reached your monthly {label} limit"),
        };
        return upgrade_required(requirement);
    }
    RequirementCheck::satisfied()
}

fn capability_check(allowed: bool, requirement: &str) -> RequirementCheck {
    if allowed {
        RequirementCheck::satisfied()
    } else {
        upgrade_required(requirement)
    }
}

/// Check whether the snapshot's user may use a friends feature right now.
///
/// Counted features distinguish "not included in your plan" from "monthly
/// limit reached"; both remediate through the subscription screen.
pub fn can_use_friends_feature(
    snapshot: &EligibilitySnapshot,
    feature: FriendsFeature,
) -> RequirementCheck {
    if !snapshot.authenticated {
        return RequirementCheck::unmet(
            "Sign in to use friends features",
            "Sign In",
            super::eligibility::SIGN_IN_ROUTE,
        );
    }

    let limits = TierLimits::for_tier(snapshot.tier);
    match feature {
        FriendsFeature::Match => counted_feature_check(
            limits.matches_per_month,
            snapshot.friends_usage.matches_this_month,
            "friend matching",
            snapshot.friends_usage.resets_on,
        ),
        FriendsFeature::JoinGroup => counted_feature_check(
            limits.groups_can_join,
            snapshot.friends_usage.groups_joined,
            "group",
            snapshot.friends_usage.resets_on,
        ),
        FriendsFeature::Post => {
            capability_check(limits.can_post, "Posting requires a Premium plan")
        }
        FriendsFeature::CreateEvent => {
            capability_check(limits.can_create_events, "Creating events requires Elite")
        }
    }
}

//! PostgreSQL-backed eligibility snapshot loader using Diesel.
//!
//! Assembles one immutable [`EligibilitySnapshot`] from the profile, consent,
//! subscription, and usage tables. Missing collaborator rows map to their
//! domain defaults rather than errors, so a freshly signed-up user evaluates
//! as "nothing done yet" instead of failing the request.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::consent::{ConsentRecord, PolicyVersions, UserConsents};
use crate::domain::eligibility::EligibilitySnapshot;
use crate::domain::ports::{EligibilityQueryError, EligibilitySnapshotQuery};
use crate::domain::profile::ProfileSnapshot;
use crate::domain::subscription::{FriendsUsage, SubscriptionTier};
use crate::domain::user::UserId;
use crate::domain::verification::{IdVerification, IdVerificationStatus, VerificationState};

use super::models::{ProfileRow, SubscriptionRow, UserConsentsRow};
use super::pool::{DbPool, PoolError};
use super::schema::{friend_matches, group_memberships, profiles, subscriptions, user_consents};

/// Diesel-backed implementation of the `EligibilitySnapshotQuery` port.
#[derive(Clone)]
pub struct DieselEligibilitySnapshotQuery {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselEligibilitySnapshotQuery {
    /// Create a new query adapter with the given pool and clock.
    ///
    /// The clock fixes the calendar-month boundary used for usage counters.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn map_pool_error(error: PoolError) -> EligibilityQueryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            EligibilityQueryError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> EligibilityQueryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            EligibilityQueryError::connection("database connection error")
        }
        _ => EligibilityQueryError::query("database error"),
    }
}

fn parse_status(value: &str, user_id: &UserId) -> IdVerificationStatus {
    match value {
        "none" => IdVerificationStatus::None,
        "pending" => IdVerificationStatus::Pending,
        "verified" => IdVerificationStatus::Verified,
        "expired" => IdVerificationStatus::Expired,
        "rejected" => IdVerificationStatus::Rejected,
        other => {
            warn!(value = other, user_id = %user_id, "unrecognised verification status");
            IdVerificationStatus::None
        }
    }
}

fn parse_tier(value: &str, user_id: &UserId) -> SubscriptionTier {
    value.parse().unwrap_or_else(|_| {
        warn!(value, user_id = %user_id, "unrecognised subscription tier, defaulting to free");
        SubscriptionTier::Free
    })
}

fn consents_from_row(row: UserConsentsRow) -> UserConsents {
    UserConsents {
        terms: ConsentRecord {
            accepted: row.terms_accepted,
            accepted_at: row.terms_accepted_at,
            version: row.terms_version,
        },
        privacy: ConsentRecord {
            accepted: row.privacy_accepted,
            accepted_at: row.privacy_accepted_at,
            version: row.privacy_version,
        },
        age_confirmed: ConsentRecord {
            accepted: row.age_confirmed,
            accepted_at: row.age_confirmed_at,
            version: None,
        },
        electronic_signature: ConsentRecord {
            accepted: row.electronic_signature_accepted,
            accepted_at: row.electronic_signature_accepted_at,
            version: None,
        },
        companion_agreement: ConsentRecord {
            accepted: row.companion_agreement_accepted,
            accepted_at: row.companion_agreement_accepted_at,
            version: None,
        },
        marketing_opt_in: row.marketing_opt_in,
    }
}

fn split_profile_row(row: ProfileRow, user_id: &UserId) -> (ProfileSnapshot, VerificationState) {
    let status = parse_status(&row.id_verification_status, user_id);
    let verification = VerificationState {
        email_verified: row.email_verified,
        phone_verified: row.phone_verified,
        id_verification: IdVerification {
            status,
            verified_at: row.id_verified_at,
            expires_at: row.id_expires_at,
        },
    };
    let profile = ProfileSnapshot {
        display_name: row.display_name,
        avatar_url: row.avatar_url,
        bio: row.bio,
        birth_date: row.birth_date,
        gender: row.gender,
        city: row.city,
        interests: row.interests,
    };
    (profile, verification)
}

/// Midnight UTC on the first of the current month.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first = now
        .date_naive()
        .with_day(1)
        .unwrap_or_else(|| now.date_naive());
    first.and_time(NaiveTime::MIN).and_utc()
}

fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

#[async_trait]
impl EligibilitySnapshotQuery for DieselEligibilitySnapshotQuery {
    async fn fetch_snapshot(
        &self,
        user_id: &UserId,
    ) -> Result<EligibilitySnapshot, EligibilityQueryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuid = *user_id.as_uuid();
        let now = self.clock.utc();
        let since = month_start(now);

        let profile_row: Option<ProfileRow> = profiles::table
            .filter(profiles::user_id.eq(uuid))
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let consents_row: Option<UserConsentsRow> = user_consents::table
            .filter(user_consents::user_id.eq(uuid))
            .select(UserConsentsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let subscription_row: Option<SubscriptionRow> = subscriptions::table
            .filter(subscriptions::user_id.eq(uuid))
            .select(SubscriptionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let matches_this_month: i64 = friend_matches::table
            .filter(
                friend_matches::user_id
                    .eq(uuid)
                    .and(friend_matches::matched_at.ge(since)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let groups_joined: i64 = group_memberships::table
            .filter(group_memberships::user_id.eq(uuid))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let (profile, verification) = profile_row
            .map(|row| split_profile_row(row, user_id))
            .unwrap_or_default();

        Ok(EligibilitySnapshot {
            authenticated: true,
            consents: consents_row.map(consents_from_row).unwrap_or_default(),
            verification,
            profile,
            tier: subscription_row
                .map(|row| parse_tier(&row.tier, user_id))
                .unwrap_or_default(),
            friends_usage: FriendsUsage {
                matches_this_month: clamp_count(matches_this_month),
                groups_joined: clamp_count(groups_joined),
                resets_on: Some(FriendsUsage::next_reset_date(now.date_naive())),
            },
            policy_versions: PolicyVersions::current(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("verified", IdVerificationStatus::Verified)]
    #[case("expired", IdVerificationStatus::Expired)]
    #[case("garbage", IdVerificationStatus::None)]
    fn statuses_parse_with_a_safe_default(
        #[case] stored: &str,
        #[case] expected: IdVerificationStatus,
    ) {
        assert_eq!(parse_status(stored, &UserId::random()), expected);
    }

    #[rstest]
    #[case("elite", SubscriptionTier::Elite)]
    #[case("unknown", SubscriptionTier::Free)]
    fn tiers_parse_with_a_safe_default(#[case] stored: &str, #[case] expected: SubscriptionTier) {
        assert_eq!(parse_tier(stored, &UserId::random()), expected);
    }

    #[test]
    fn month_start_is_midnight_on_the_first() {
        let now = Utc
            .with_ymd_and_hms(2026, 8, 23, 17, 45, 9)
            .single()
            .expect("valid timestamp");
        let start = month_start(now);
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0)
                .single()
                .expect("valid timestamp")
        );
    }

    #[test]
    fn consent_versions_survive_the_row_mapping() {
        let row = UserConsentsRow {
            terms_accepted: true,
            terms_accepted_at: Some(Utc::now()),
            terms_version: Some("2.1".to_owned()),
            privacy_accepted: false,
            privacy_accepted_at: None,
            privacy_version: None,
            age_confirmed: true,
            age_confirmed_at: Some(Utc::now()),
            electronic_signature_accepted: false,
            electronic_signature_accepted_at: None,
            companion_agreement_accepted: false,
            companion_agreement_accepted_at: None,
            marketing_opt_in: true,
        };

        let consents = consents_from_row(row);
        assert!(consents.terms.satisfies(Some("2.1")));
        assert!(!consents.terms.satisfies(Some("2.2")));
        assert!(!consents.privacy.accepted);
        assert!(consents.marketing_opt_in);
    }

    #[test]
    fn oversized_counts_clamp_instead_of_wrapping() {
        assert_eq!(clamp_count(-1), 0);
        assert_eq!(clamp_count(7), 7);
        assert_eq!(clamp_count(i64::MAX), u32::MAX);
    }
}

//! Diesel row types used by the persistence adapters.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    profiles, subscriptions, user_consents, verification_events, verification_reminder_log,
};

/// Queryable row for a user profile.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub interests: Vec<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub id_verification_status: String,
    pub id_verified_at: Option<DateTime<Utc>>,
    pub id_expires_at: Option<DateTime<Utc>>,
}

/// Queryable row for per-user consents.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_consents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserConsentsRow {
    pub terms_accepted: bool,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub terms_version: Option<String>,
    pub privacy_accepted: bool,
    pub privacy_accepted_at: Option<DateTime<Utc>>,
    pub privacy_version: Option<String>,
    pub age_confirmed: bool,
    pub age_confirmed_at: Option<DateTime<Utc>>,
    pub electronic_signature_accepted: bool,
    pub electronic_signature_accepted_at: Option<DateTime<Utc>>,
    pub companion_agreement_accepted: bool,
    pub companion_agreement_accepted_at: Option<DateTime<Utc>>,
    pub marketing_opt_in: bool,
}

/// Queryable row for a subscription.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubscriptionRow {
    pub tier: String,
}

/// Insertable claim row for the reminder dedupe log.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = verification_reminder_log)]
pub(crate) struct NewReminderClaimRow {
    pub user_id: Uuid,
    pub cycle_verified_at: DateTime<Utc>,
    pub threshold_days: i64,
    pub channel: String,
    pub sent_at: DateTime<Utc>,
}

/// Insertable row for the append-only audit log.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = verification_events)]
pub(crate) struct NewVerificationEventRow {
    pub user_id: Uuid,
    pub event_type: String,
    pub details: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

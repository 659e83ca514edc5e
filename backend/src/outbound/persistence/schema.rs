//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly; Diesel uses them for
//! compile-time query validation. Regenerate with `diesel print-schema` when
//! the migrations change.

diesel::table! {
    /// User profiles with verification flags and completion fields.
    profiles (user_id) {
        /// Primary key: the user's UUID.
        user_id -> Uuid,
        /// Contact email used for reminder delivery.
        email -> Nullable<Text>,
        display_name -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        bio -> Nullable<Text>,
        birth_date -> Nullable<Date>,
        gender -> Nullable<Text>,
        city -> Nullable<Text>,
        interests -> Array<Text>,
        email_verified -> Bool,
        phone_verified -> Bool,
        /// ID-verification lifecycle status: `none`, `pending`, `verified`,
        /// `expired`, or `rejected`.
        id_verification_status -> Text,
        id_verified_at -> Nullable<Timestamptz>,
        id_expires_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user consent flags with timestamps and stored policy versions.
    user_consents (user_id) {
        user_id -> Uuid,
        terms_accepted -> Bool,
        terms_accepted_at -> Nullable<Timestamptz>,
        terms_version -> Nullable<Text>,
        privacy_accepted -> Bool,
        privacy_accepted_at -> Nullable<Timestamptz>,
        privacy_version -> Nullable<Text>,
        age_confirmed -> Bool,
        age_confirmed_at -> Nullable<Timestamptz>,
        electronic_signature_accepted -> Bool,
        electronic_signature_accepted_at -> Nullable<Timestamptz>,
        companion_agreement_accepted -> Bool,
        companion_agreement_accepted_at -> Nullable<Timestamptz>,
        marketing_opt_in -> Bool,
    }
}

diesel::table! {
    /// Active subscription tier per user.
    subscriptions (user_id) {
        user_id -> Uuid,
        /// Tier name: `free`, `plus`, `premium`, or `elite`.
        tier -> Text,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Friend matches, counted per calendar month for tier limits.
    friend_matches (id) {
        id -> Uuid,
        user_id -> Uuid,
        matched_at -> Timestamptz,
    }
}

diesel::table! {
    /// Current group memberships, counted for tier limits.
    group_memberships (id) {
        id -> Uuid,
        user_id -> Uuid,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Reminder dedupe log; the composite primary key is the idempotency key.
    verification_reminder_log (user_id, cycle_verified_at, threshold_days, channel) {
        user_id -> Uuid,
        cycle_verified_at -> Timestamptz,
        threshold_days -> Int8,
        /// Delivery channel: `in_app` or `email`.
        channel -> Text,
        sent_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only verification audit events.
    verification_events (id) {
        id -> Int8,
        user_id -> Uuid,
        event_type -> Text,
        details -> Jsonb,
        occurred_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    profiles,
    user_consents,
    subscriptions,
    friend_matches,
    group_memberships,
);

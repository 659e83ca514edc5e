//! PostgreSQL-backed reminder dedupe log using Diesel.
//!
//! The composite primary key of `verification_reminder_log` *is* the
//! idempotency key, so a claim is a single `INSERT .. ON CONFLICT DO NOTHING`
//! and two concurrent sweeps racing on the same key resolve to exactly one
//! winner inside PostgreSQL.
//!
//! A missing `verification_reminder_log` relation (service deployed ahead of
//! the migration) is tolerated: a claim is granted with the write skipped, so
//! reminders keep flowing without dedupe until the migration lands.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};

use crate::domain::ports::{ReminderLog, ReminderLogError};
use crate::domain::reminder::ReminderKey;

use super::models::NewReminderClaimRow;
use super::pool::{DbPool, PoolError};
use super::schema::verification_reminder_log as log;

/// Diesel-backed implementation of the `ReminderLog` port.
#[derive(Clone)]
pub struct DieselReminderLog {
    pool: DbPool,
}

impl DieselReminderLog {
    /// Create a new log with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReminderLogError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ReminderLogError::connection(message)
        }
    }
}

fn is_missing_relation(error: &diesel::result::Error) -> bool {
    match error {
        diesel::result::Error::DatabaseError(_, info) => {
            info.message().contains("does not exist")
        }
        _ => false,
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ReminderLogError {
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
            ReminderLogError::connection("database connection error")
        }
        _ => ReminderLogError::query("database error"),
    }
}

#[async_trait]
impl ReminderLog for DieselReminderLog {
    async fn try_claim(&self, key: &ReminderKey) -> Result<bool, ReminderLogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewReminderClaimRow {
            user_id: key.user_id,
            cycle_verified_at: key.cycle_verified_at,
            threshold_days: key.threshold_days,
            channel: key.channel.as_str().to_owned(),
            sent_at: Utc::now(),
        };

        let result = diesel::insert_into(log::table)
            .values(&row)
            .on_conflict((
                log::user_id,
                log::cycle_verified_at,
                log::threshold_days,
                log::channel,
            ))
            .do_nothing()
            .execute(&mut conn)
            .await;

        match result {
            Ok(inserted) => Ok(inserted == 1),
            Err(error) if is_missing_relation(&error) => {
                // Grant the claim unrecorded: a duplicate reminder beats a
                // silent sweep while the migration catches up.
                warn!(
                    user_id = %key.user_id,
                    threshold_days = key.threshold_days,
                    channel = key.channel.as_str(),
                    "verification_reminder_log relation missing; claim granted without dedupe"
                );
                Ok(true)
            }
            Err(error) => Err(map_diesel_error(error)),
        }
    }

    async fn release(&self, key: &ReminderKey) -> Result<(), ReminderLogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result = diesel::delete(
            log::table.filter(
                log::user_id
                    .eq(key.user_id)
                    .and(log::cycle_verified_at.eq(key.cycle_verified_at))
                    .and(log::threshold_days.eq(key.threshold_days))
                    .and(log::channel.eq(key.channel.as_str())),
            ),
        )
        .execute(&mut conn)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_missing_relation(&error) => {
                // Nothing was claimed against a missing relation, so there is
                // nothing to withdraw.
                debug!(
                    user_id = %key.user_id,
                    "verification_reminder_log relation missing; release skipped"
                );
                Ok(())
            }
            Err(error) => Err(map_diesel_error(error)),
        }
    }
}

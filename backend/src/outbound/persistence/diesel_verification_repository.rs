//! PostgreSQL-backed `VerificationProfileRepository` using Diesel.
//!
//! Carries the two bulk queries of the maintenance sweep: the expiry UPDATE
//! and the reminder-candidate SELECT.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{
    ExpiredVerification, ReminderCandidate, VerificationProfileRepository,
    VerificationRepositoryError,
};

use super::pool::{DbPool, PoolError};
use super::schema::profiles;

const STATUS_VERIFIED: &str = "verified";
const STATUS_EXPIRED: &str = "expired";

/// Diesel-backed implementation of the `VerificationProfileRepository` port.
#[derive(Clone)]
pub struct DieselVerificationProfileRepository {
    pool: DbPool,
}

impl DieselVerificationProfileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> VerificationRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            VerificationRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> VerificationRepositoryError {
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
            VerificationRepositoryError::connection("database connection error")
        }
        _ => VerificationRepositoryError::query("database error"),
    }
}

#[async_trait]
impl VerificationProfileRepository for DieselVerificationProfileRepository {
    async fn expire_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiredVerification>, VerificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // One bulk UPDATE; re-running after a clean sweep matches zero rows.
        let rows: Vec<(Uuid, Option<DateTime<Utc>>)> = diesel::update(
            profiles::table.filter(
                profiles::id_verification_status
                    .eq(STATUS_VERIFIED)
                    .and(profiles::id_expires_at.le(now)),
            ),
        )
        .set((
            profiles::id_verification_status.eq(STATUS_EXPIRED),
            profiles::updated_at.eq(now),
        ))
        .returning((profiles::user_id, profiles::id_expires_at))
        .get_results(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(user_id, previous_expires_at)| match previous_expires_at {
                Some(previous_expires_at) => Some(ExpiredVerification {
                    user_id,
                    previous_expires_at,
                }),
                // The filter requires a non-null expiry; keep the sweep going.
                None => {
                    warn!(%user_id, "expired row missing its expiry timestamp");
                    None
                }
            })
            .collect())
    }

    async fn reminder_candidates(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Vec<ReminderCandidate>, VerificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let window_end = now + Duration::days(window_days);

        let rows: Vec<(
            Uuid,
            Option<String>,
            Option<DateTime<Utc>>,
            Option<DateTime<Utc>>,
        )> = profiles::table
            .filter(
                profiles::id_verification_status
                    .eq(STATUS_VERIFIED)
                    .and(profiles::id_expires_at.gt(now))
                    .and(profiles::id_expires_at.le(window_end)),
            )
            .select((
                profiles::user_id,
                profiles::email,
                profiles::id_verified_at,
                profiles::id_expires_at,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(user_id, email, verified_at, expires_at)| {
                expires_at.map(|expires_at| ReminderCandidate {
                    user_id,
                    email,
                    verified_at,
                    expires_at,
                })
            })
            .collect())
    }
}

//! PostgreSQL-backed verification audit log using Diesel.
//!
//! Append-only. A missing `verification_events` relation (service deployed
//! ahead of the migration) is tolerated: the write is logged and skipped so
//! the maintenance sweep's state transitions are not rolled back over
//! auditing.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};

use crate::domain::ports::{AuditLogError, VerificationAuditLog, VerificationEvent};

use super::models::NewVerificationEventRow;
use super::pool::{DbPool, PoolError};
use super::schema::verification_events;

/// Diesel-backed implementation of the `VerificationAuditLog` port.
#[derive(Clone)]
pub struct DieselVerificationAuditLog {
    pool: DbPool,
}

impl DieselVerificationAuditLog {
    /// Create a new audit log with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AuditLogError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            AuditLogError::connection(message)
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

fn map_diesel_error(error: diesel::result::Error) -> AuditLogError {
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
            AuditLogError::connection("database connection error")
        }
        _ => AuditLogError::query("database error"),
    }
}

#[async_trait]
impl VerificationAuditLog for DieselVerificationAuditLog {
    async fn record(&self, event: &VerificationEvent) -> Result<(), AuditLogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewVerificationEventRow {
            user_id: event.user_id,
            event_type: event.kind.as_str().to_owned(),
            details: event.details.clone(),
            occurred_at: event.occurred_at,
        };

        match diesel::insert_into(verification_events::table)
            .values(&row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(error) if is_missing_relation(&error) => {
                warn!(
                    user_id = %event.user_id,
                    kind = event.kind.as_str(),
                    "verification_events relation missing; audit event skipped"
                );
                Ok(())
            }
            Err(error) => Err(map_diesel_error(error)),
        }
    }
}

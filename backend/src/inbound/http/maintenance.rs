//! Verification-maintenance trigger.
//!
//! ```text
//! POST /internal/verification-maintenance
//! ```
//!
//! Intended for an external scheduler (cron) rather than end users. Guarded
//! by an optional shared-secret header; the sweep itself is idempotent, so a
//! duplicate trigger is harmless.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::DomainError;
use crate::domain::maintenance::MaintenanceSummary;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Header carrying the shared maintenance secret.
pub const MAINTENANCE_SECRET_HEADER: &str = "x-maintenance-secret";

/// JSON body returned by a completed sweep.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceResponse {
    /// Always `true` for a 2xx response.
    pub success: bool,
    /// Verifications transitioned to `expired`.
    pub expired_count: u64,
    /// In-app reminders logged.
    pub in_app_reminder_count: u64,
    /// Reminder emails accepted by the provider.
    pub email_sent_count: u64,
    /// Reminder emails the provider rejected.
    pub email_failed_count: u64,
    /// Whether the email provider was configured for this run.
    pub resend_configured: bool,
}

impl From<MaintenanceSummary> for MaintenanceResponse {
    fn from(summary: MaintenanceSummary) -> Self {
        Self {
            success: true,
            expired_count: summary.expired_count,
            in_app_reminder_count: summary.in_app_reminder_count,
            email_sent_count: summary.email_sent_count,
            email_failed_count: summary.email_failed_count,
            resend_configured: summary.mailer_configured,
        }
    }
}

fn check_secret(state: &HttpState, request: &HttpRequest) -> Result<(), DomainError> {
    let Some(expected) = state.maintenance_secret.as_deref() else {
        return Ok(());
    };
    let presented = request
        .headers()
        .get(MAINTENANCE_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented == Some(expected) {
        Ok(())
    } else {
        Err(DomainError::unauthorized("maintenance secret mismatch"))
    }
}

/// Run one verification maintenance sweep.
#[utoipa::path(
    post,
    path = "/internal/verification-maintenance",
    params(
        ("x-maintenance-secret" = Option<String>, Header, description = "Shared scheduler secret")
    ),
    responses(
        (status = 200, description = "Sweep completed", body = MaintenanceResponse),
        (status = 401, description = "Secret missing or mismatched", body = DomainError),
        (status = 405, description = "Method not allowed", body = DomainError),
        (status = 500, description = "Bulk query failed", body = DomainError),
        (status = 503, description = "Store unavailable", body = DomainError)
    ),
    tags = ["internal"],
    operation_id = "runVerificationMaintenance"
)]
pub async fn run_maintenance(
    state: web::Data<HttpState>,
    request: HttpRequest,
) -> ApiResult<web::Json<MaintenanceResponse>> {
    check_secret(&state, &request)?;
    let summary = state.maintenance.run().await?;
    Ok(web::Json(MaintenanceResponse::from(summary)))
}

/// Fallback for non-POST methods on the maintenance resource.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .json(DomainError::invalid_request("only POST is supported here"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    use crate::domain::ports::{
        FixtureEligibilitySnapshotQuery, FixtureVerificationMaintenance, MockVerificationMaintenance,
    };
    use crate::inbound::http::routes;

    fn state_with(
        maintenance: Arc<dyn crate::domain::ports::VerificationMaintenance>,
        secret: Option<&str>,
    ) -> HttpState {
        HttpState::new(
            Arc::new(FixtureEligibilitySnapshotQuery),
            maintenance,
            secret.map(str::to_owned),
        )
    }

    async fn call(
        state: HttpState,
        request: test::TestRequest,
    ) -> actix_web::dev::ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes::configure),
        )
        .await;
        test::call_service(&app, request.to_request()).await
    }

    #[actix_web::test]
    async fn missing_secret_is_unauthorised() {
        let state = state_with(Arc::new(FixtureVerificationMaintenance), Some("s3cret"));
        let res = call(
            state,
            test::TestRequest::post().uri("/internal/verification-maintenance"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn wrong_secret_is_unauthorised() {
        let state = state_with(Arc::new(FixtureVerificationMaintenance), Some("s3cret"));
        let res = call(
            state,
            test::TestRequest::post()
                .uri("/internal/verification-maintenance")
                .insert_header((MAINTENANCE_SECRET_HEADER, "wrong")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn matching_secret_runs_the_sweep() {
        let mut maintenance = MockVerificationMaintenance::new();
        maintenance.expect_run().times(1).returning(|| {
            Ok(MaintenanceSummary {
                expired_count: 3,
                in_app_reminder_count: 2,
                email_sent_count: 1,
                email_failed_count: 0,
                mailer_configured: true,
            })
        });

        let state = state_with(Arc::new(maintenance), Some("s3cret"));
        let res = call(
            state,
            test::TestRequest::post()
                .uri("/internal/verification-maintenance")
                .insert_header((MAINTENANCE_SECRET_HEADER, "s3cret")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["expiredCount"], 3);
        assert_eq!(body["inAppReminderCount"], 2);
        assert_eq!(body["emailSentCount"], 1);
        assert_eq!(body["emailFailedCount"], 0);
        assert_eq!(body["resendConfigured"], true);
    }

    #[actix_web::test]
    async fn unconfigured_secret_leaves_the_endpoint_open() {
        let state = state_with(Arc::new(FixtureVerificationMaintenance), None);
        let res = call(
            state,
            test::TestRequest::post().uri("/internal/verification-maintenance"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn get_is_method_not_allowed() {
        let state = state_with(Arc::new(FixtureVerificationMaintenance), Some("s3cret"));
        let res = call(
            state,
            test::TestRequest::get().uri("/internal/verification-maintenance"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[actix_web::test]
    async fn sweep_failure_surfaces_the_error_status() {
        let mut maintenance = MockVerificationMaintenance::new();
        maintenance
            .expect_run()
            .returning(|| Err(DomainError::internal("bulk update failed")));

        let state = state_with(Arc::new(maintenance), None);
        let res = call(
            state,
            test::TestRequest::post().uri("/internal/verification-maintenance"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

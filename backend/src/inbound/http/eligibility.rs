//! Eligibility gate HTTP handlers.
//!
//! ```text
//! GET /api/v1/eligibility/booking?mode=entry|finalize
//! GET /api/v1/eligibility/companion
//! GET /api/v1/eligibility/features/{feature}
//! ```
//!
//! Gate failures are never HTTP errors: an unauthenticated or blocked caller
//! receives a normal `200` with `met: false` results. Only malformed requests
//! and infrastructure failures surface as error statuses.

use std::str::FromStr;

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::eligibility::{
    AppFeature, BookingRequirements, CompanionRequirements, EligibilitySnapshot, EvaluationMode,
    RequirementCheck, evaluate_booking_requirements, evaluate_companion_requirements,
    can_access_feature,
};
use crate::domain::ports::EligibilityQueryError;
use crate::domain::DomainError;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Query parameters for the booking evaluation.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    /// Evaluation mode, `entry` (default) or `finalize`.
    pub mode: Option<String>,
}

/// Access decision for a single named feature.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccessResponse {
    /// The feature that was evaluated.
    pub feature: String,
    /// Whether access is currently allowed.
    pub met: bool,
    /// Reason shown when access is blocked.
    pub requirement: String,
    /// Short label for the remediation action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Route the remediation action navigates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate_to: Option<String>,
}

impl FeatureAccessResponse {
    fn new(feature: AppFeature, check: RequirementCheck) -> Self {
        Self {
            feature: feature.to_string(),
            met: check.met,
            requirement: check.requirement,
            action: check.action,
            navigate_to: check.navigate_to,
        }
    }
}

fn map_query_error(error: EligibilityQueryError) -> DomainError {
    match error {
        EligibilityQueryError::Connection { message } => {
            DomainError::service_unavailable(format!("eligibility store unavailable: {message}"))
        }
        EligibilityQueryError::Query { message } => {
            DomainError::internal(format!("eligibility query failed: {message}"))
        }
    }
}

fn parse_mode(query: BookingQuery) -> Result<EvaluationMode, DomainError> {
    match query.mode {
        None => Ok(EvaluationMode::Entry),
        Some(raw) => EvaluationMode::from_str(&raw).map_err(|_| {
            DomainError::invalid_request("mode must be entry or finalize").with_details(json!({
                "field": "mode",
                "value": raw,
            }))
        }),
    }
}

fn parse_feature(raw: &str) -> Result<AppFeature, DomainError> {
    AppFeature::from_str(raw).map_err(|_| {
        DomainError::invalid_request("unknown feature").with_details(json!({
            "field": "feature",
            "value": raw,
        }))
    })
}

/// Load the session user's snapshot, or the unauthenticated default when no
/// session is present.
async fn load_snapshot(
    state: &HttpState,
    session: &SessionContext,
) -> ApiResult<EligibilitySnapshot> {
    match session.user_id() {
        Some(user_id) => state
            .eligibility
            .fetch_snapshot(user_id)
            .await
            .map_err(map_query_error),
        None => Ok(EligibilitySnapshot::default()),
    }
}

/// Evaluate the booking bar for the session user.
#[utoipa::path(
    get,
    path = "/api/v1/eligibility/booking",
    params(BookingQuery),
    responses(
        (status = 200, description = "Booking evaluation", body = BookingRequirements),
        (status = 400, description = "Invalid mode", body = DomainError),
        (status = 503, description = "Service unavailable", body = DomainError)
    ),
    tags = ["eligibility"],
    operation_id = "evaluateBooking"
)]
#[get("/eligibility/booking")]
pub async fn booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<BookingQuery>,
) -> ApiResult<web::Json<BookingRequirements>> {
    let mode = parse_mode(query.into_inner())?;
    let snapshot = load_snapshot(&state, &session).await?;
    Ok(web::Json(evaluate_booking_requirements(&snapshot, mode)))
}

/// Evaluate the companion bar for the session user.
#[utoipa::path(
    get,
    path = "/api/v1/eligibility/companion",
    responses(
        (status = 200, description = "Companion evaluation", body = CompanionRequirements),
        (status = 503, description = "Service unavailable", body = DomainError)
    ),
    tags = ["eligibility"],
    operation_id = "evaluateCompanion"
)]
#[get("/eligibility/companion")]
pub async fn companion(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<CompanionRequirements>> {
    let snapshot = load_snapshot(&state, &session).await?;
    Ok(web::Json(evaluate_companion_requirements(&snapshot)))
}

/// Check access to a single named feature for the session user.
#[utoipa::path(
    get,
    path = "/api/v1/eligibility/features/{feature}",
    params(
        ("feature" = String, Path, description = "Feature name, e.g. `book` or `friends.match`")
    ),
    responses(
        (status = 200, description = "Feature access decision", body = FeatureAccessResponse),
        (status = 400, description = "Unknown feature", body = DomainError),
        (status = 503, description = "Service unavailable", body = DomainError)
    ),
    tags = ["eligibility"],
    operation_id = "checkFeatureAccess"
)]
#[get("/eligibility/features/{feature}")]
pub async fn feature_access(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<FeatureAccessResponse>> {
    let feature = parse_feature(&path.into_inner())?;
    let snapshot = load_snapshot(&state, &session).await?;
    let check = can_access_feature(&snapshot, feature);
    Ok(web::Json(FeatureAccessResponse::new(feature, check)))
}

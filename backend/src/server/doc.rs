//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST API: the
//! eligibility endpoints, the internal maintenance trigger, and the health
//! probes, plus the shared error payload schemas and the session cookie
//! security scheme.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::eligibility::{
    BookingRequirements, CompanionRequirements, EvaluationMode, RequirementCheck, RequirementKey,
};
use crate::domain::{DomainError, ErrorCode};
use crate::inbound::http::eligibility::FeatureAccessResponse;
use crate::inbound::http::maintenance::MaintenanceResponse;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by the auth collaborator.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Amity backend API",
        description = "Eligibility gating and verification-lifecycle endpoints."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::eligibility::booking,
        crate::inbound::http::eligibility::companion,
        crate::inbound::http::eligibility::feature_access,
        crate::inbound::http::maintenance::run_maintenance,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        DomainError,
        ErrorCode,
        RequirementCheck,
        RequirementKey,
        EvaluationMode,
        BookingRequirements,
        CompanionRequirements,
        FeatureAccessResponse,
        MaintenanceResponse,
    )),
    tags(
        (name = "eligibility", description = "Gate evaluations for the session user"),
        (name = "internal", description = "Scheduler-triggered maintenance"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

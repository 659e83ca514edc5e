//! Route registration for the HTTP adapter.

use actix_web::web;

use crate::inbound::http::{eligibility, health, maintenance};

/// Register every HTTP route on the given service config.
///
/// Callers provide `web::Data<HttpState>` and `web::Data<HealthState>` (and
/// session middleware for the eligibility endpoints) on the enclosing `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(eligibility::booking)
            .service(eligibility::companion)
            .service(eligibility::feature_access),
    )
    .service(
        // Explicit fallback so non-POST triggers get a 405 instead of 404.
        web::resource("/internal/verification-maintenance")
            .route(web::post().to(maintenance::run_maintenance))
            .route(web::route().to(maintenance::method_not_allowed)),
    )
    .service(health::ready)
    .service(health::live);
}

//! Eligibility endpoints exercised through the full Actix app, session
//! middleware included.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, test, web};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use amity_backend::domain::ports::{
    EligibilityQueryError, EligibilitySnapshotQuery, FixtureVerificationMaintenance,
};
use amity_backend::domain::{
    ConsentRecord, EligibilitySnapshot, IdVerification, PolicyVersions, ProfileSnapshot,
    SubscriptionTier, UserConsents, UserId, VerificationState,
};
use amity_backend::inbound::http::health::HealthState;
use amity_backend::inbound::http::routes;
use amity_backend::inbound::http::state::HttpState;

const FIXTURE_USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

/// Snapshot query returning one canned snapshot for every user.
struct CannedSnapshotQuery {
    snapshot: EligibilitySnapshot,
}

#[async_trait]
impl EligibilitySnapshotQuery for CannedSnapshotQuery {
    async fn fetch_snapshot(
        &self,
        _user_id: &UserId,
    ) -> Result<EligibilitySnapshot, EligibilityQueryError> {
        Ok(self.snapshot.clone())
    }
}

fn ready_snapshot() -> EligibilitySnapshot {
    let now = Utc::now();
    let versions = PolicyVersions::current();
    EligibilitySnapshot {
        authenticated: true,
        consents: UserConsents {
            terms: ConsentRecord::accepted_version(versions.terms.clone(), now),
            privacy: ConsentRecord::accepted_version(versions.privacy.clone(), now),
            age_confirmed: ConsentRecord::accepted_at(now),
            electronic_signature: ConsentRecord::accepted_at(now),
            companion_agreement: ConsentRecord::accepted_at(now),
            marketing_opt_in: false,
        },
        verification: VerificationState {
            email_verified: true,
            phone_verified: true,
            id_verification: IdVerification::granted(now),
        },
        profile: ProfileSnapshot {
            display_name: Some("Ada".to_owned()),
            avatar_url: Some("https://cdn.example/ada.jpg".to_owned()),
            bio: Some("Hello".to_owned()),
            birth_date: NaiveDate::from_ymd_opt(1995, 4, 2),
            gender: Some("woman".to_owned()),
            city: Some("Leith".to_owned()),
            interests: vec!["hiking".to_owned()],
        },
        tier: SubscriptionTier::Free,
        friends_usage: Default::default(),
        policy_versions: versions,
    }
}

async fn login(session: Session) -> HttpResponse {
    session
        .insert("user_id", FIXTURE_USER)
        .expect("store fixture user id");
    HttpResponse::Ok().finish()
}

async fn spawn_app(
    snapshot: EligibilitySnapshot,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let state = HttpState::new(
        Arc::new(CannedSnapshotQuery { snapshot }),
        Arc::new(FixtureVerificationMaintenance),
        None,
    );
    let health = web::Data::new(HealthState::new());
    health.mark_ready();

    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".into())
        .cookie_secure(false)
        .build();

    test::init_service(
        App::new()
            .app_data(health)
            .app_data(web::Data::new(state))
            .wrap(session)
            .route("/test/login", web::post().to(login))
            .configure(routes::configure),
    )
    .await
}

#[actix_web::test]
async fn unauthenticated_booking_is_a_200_with_every_gate_unmet() {
    let app = spawn_app(ready_snapshot()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/eligibility/booking")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["allMet"], false);
    assert_eq!(body["unmetRequirements"][0], "authenticated");
    assert_eq!(body["authenticated"]["met"], false);
    assert_eq!(body["authenticated"]["navigateTo"], "/auth/sign-in");
}

#[actix_web::test]
async fn logged_in_ready_user_passes_finalize() {
    let app = spawn_app(ready_snapshot()).await;

    let login_res = test::call_service(
        &app,
        test::TestRequest::post().uri("/test/login").to_request(),
    )
    .await;
    let cookie = login_res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/eligibility/booking?mode=finalize")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["allMet"], true);
    assert_eq!(body["mode"], "finalize");
    assert_eq!(body["unmetRequirements"], Value::Array(Vec::new()));
}

#[actix_web::test]
async fn an_unknown_mode_is_rejected_with_details() {
    let app = spawn_app(ready_snapshot()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/eligibility/booking?mode=strict")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "mode");
    assert_eq!(body["details"]["value"], "strict");
}

#[actix_web::test]
async fn an_unknown_feature_name_is_rejected() {
    let app = spawn_app(ready_snapshot()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/eligibility/features/teleport")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "feature");
}

#[actix_web::test]
async fn free_tier_friends_match_remediates_with_an_upgrade() {
    let app = spawn_app(ready_snapshot()).await;

    let login_res = test::call_service(
        &app,
        test::TestRequest::post().uri("/test/login").to_request(),
    )
    .await;
    let cookie = login_res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/eligibility/features/friends.match")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["feature"], "friends.match");
    assert_eq!(body["met"], false);
    assert_eq!(body["action"], "Upgrade");
    assert_eq!(body["navigateTo"], "/subscription");
}

#[actix_web::test]
async fn companion_endpoint_layers_the_agreement() {
    let mut snapshot = ready_snapshot();
    snapshot.consents.companion_agreement = ConsentRecord::default();
    let app = spawn_app(snapshot).await;

    let login_res = test::call_service(
        &app,
        test::TestRequest::post().uri("/test/login").to_request(),
    )
    .await;
    let cookie = login_res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/eligibility/companion")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["allMet"], false);
    assert_eq!(body["unmetRequirements"][0], "companionAgreementAccepted");
    assert_eq!(body["booking"]["allMet"], true);
}

#[actix_web::test]
async fn health_probes_answer_without_a_session() {
    let app = spawn_app(ready_snapshot()).await;

    for uri in ["/health/ready", "/health/live"] {
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "{uri}");
        assert_eq!(
            res.headers()
                .get("cache-control")
                .and_then(|value| value.to_str().ok()),
            Some("no-store"),
            "{uri}"
        );
    }
}

//! Backend entry-point: wires the eligibility and maintenance endpoints.

use std::env;
use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use amity_backend::domain::VerificationMaintenanceService;
use amity_backend::inbound::http::health::HealthState;
use amity_backend::inbound::http::routes;
use amity_backend::inbound::http::state::HttpState;
use amity_backend::outbound::email::ResendMailer;
use amity_backend::outbound::persistence::{
    DbPool, DieselEligibilitySnapshotQuery, DieselReminderLog, DieselVerificationAuditLog,
    DieselVerificationProfileRepository, PoolConfig,
};
use amity_backend::server::config::AppConfig;

fn load_session_key(path: &str) -> std::io::Result<Key> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {path}: {e}"
                )))
            }
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    let key = load_session_key(&config.session_key_file)?;

    let pool = DbPool::new(PoolConfig::new(&config.database_url))
        .await
        .map_err(std::io::Error::other)?;

    let clock = Arc::new(DefaultClock);
    let maintenance = VerificationMaintenanceService::new(
        Arc::new(DieselVerificationProfileRepository::new(pool.clone())),
        Arc::new(DieselReminderLog::new(pool.clone())),
        Arc::new(DieselVerificationAuditLog::new(pool.clone())),
        Arc::new(ResendMailer::new(config.resend.clone())),
        clock.clone(),
    );
    let state = HttpState::new(
        Arc::new(DieselEligibilitySnapshotQuery::new(pool, clock)),
        Arc::new(maintenance),
        config.maintenance_secret.clone(),
    );

    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the readiness probe stays accessible.
    let server_health_state = health_state.clone();
    let cookie_secure = config.cookie_secure;

    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".into())
            .cookie_path("/".into())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .build();

        App::new()
            .app_data(server_health_state.clone())
            .app_data(web::Data::new(state.clone()))
            .wrap(session)
            .configure(routes::configure)
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    server.run().await
}

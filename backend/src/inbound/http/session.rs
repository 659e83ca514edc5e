//! Session-derived caller identity for HTTP handlers.
//!
//! Session establishment (signup/login) is owned by the auth collaborator;
//! the handlers here only need to know who, if anyone, the cookie session
//! belongs to. The extractor resolves that once, so handlers work with a
//! plain `Option<UserId>` instead of the raw session.

use actix_session::{Session, SessionExt};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::domain::UserId;

pub(crate) const USER_ID_KEY: &str = "user_id";

/// The caller identity carried by the cookie session, resolved at extraction.
#[derive(Clone, Debug)]
pub struct SessionContext {
    user_id: Option<UserId>,
}

impl SessionContext {
    /// The authenticated user's id, if the session holds a valid one.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }
}

/// An unreadable, missing, or malformed stored id reads as "no session", so
/// gate evaluations degrade to the unauthenticated path.
fn resolve_user(session: &Session) -> Option<UserId> {
    let raw = match session.get::<String>(USER_ID_KEY) {
        Ok(value) => value?,
        Err(error) => {
            tracing::warn!("failed to read session cookie: {error}");
            return None;
        }
    };
    match UserId::new(raw) {
        Ok(id) => Some(id),
        Err(error) => {
            tracing::warn!("invalid user id in session cookie: {error}");
            None
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.get_session();
        ready(Ok(Self {
            user_id: resolve_user(&session),
        }))
    }
}

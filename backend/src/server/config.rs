//! Typed application configuration read from the environment.
//!
//! Missing or malformed required values are configuration errors surfaced
//! before the server starts, never mid-request.

use std::env;
use std::net::SocketAddr;

use crate::outbound::email::ResendConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing required environment variable {name}")]
    MissingVar { name: &'static str },

    /// An environment variable is present but malformed.
    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Shared secret for the maintenance trigger; `None` leaves it open.
    pub maintenance_secret: Option<String>,
    /// Resend credentials; `None` disables reminder emails.
    pub resend: Option<ResendConfig>,
    /// Path of the session signing key file.
    pub session_key_file: String,
    /// Whether session cookies carry the `Secure` flag.
    pub cookie_secure: bool,
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar { name })
}

fn resend_from_env() -> Result<Option<ResendConfig>, ConfigError> {
    match (optional("RESEND_API_KEY"), optional("RESEND_FROM")) {
        (Some(api_key), Some(from)) => Ok(Some(ResendConfig { api_key, from })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Invalid {
            name: "RESEND_FROM",
            message: "required when RESEND_API_KEY is set".to_owned(),
        }),
        (None, Some(_)) => Err(ConfigError::Invalid {
            name: "RESEND_API_KEY",
            message: "required when RESEND_FROM is set".to_owned(),
        }),
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `DATABASE_URL` is absent, `BIND_ADDR`
    /// does not parse as a socket address, or the Resend variables are only
    /// half-set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;

        let bind_addr = optional("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned())
            .parse::<SocketAddr>()
            .map_err(|error| ConfigError::Invalid {
                name: "BIND_ADDR",
                message: error.to_string(),
            })?;

        let cookie_secure = optional("SESSION_COOKIE_SECURE")
            .map(|value| value != "0")
            .unwrap_or(true);

        Ok(Self {
            database_url,
            bind_addr,
            maintenance_secret: optional("MAINTENANCE_SECRET"),
            resend: resend_from_env()?,
            session_key_file: optional("SESSION_KEY_FILE")
                .unwrap_or_else(|| DEFAULT_SESSION_KEY_FILE.to_owned()),
            cookie_secure,
        })
    }
}

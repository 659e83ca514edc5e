//! Resend-backed expiry mailer.
//!
//! This adapter owns transport details only: authenticating against the
//! Resend HTTP API, assembling the reminder template, and mapping transport
//! and status failures onto the mailer port error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::domain::ports::{ExpiryMailer, MailerError};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials and sender identity for the Resend API.
#[derive(Debug, Clone)]
pub struct ResendConfig {
    /// API key presented as a bearer token.
    pub api_key: String,
    /// Sender address, e.g. `Amity <no-reply@amity.example>`.
    pub from: String,
}

/// Resend implementation of the `ExpiryMailer` port.
///
/// Constructed unconfigured when no API key is present; the maintenance
/// sweep checks [`ExpiryMailer::is_configured`] before doing any email work.
pub struct ResendMailer {
    client: Client,
    config: Option<ResendConfig>,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
    html: String,
}

fn subject_line(days_until_expiry: i64) -> String {
    match days_until_expiry {
        1 => "Your ID verification expires tomorrow".to_owned(),
        days => format!("Your ID verification expires in {days} days"),
    }
}

fn day_phrase(days_until_expiry: i64) -> String {
    match days_until_expiry {
        1 => "tomorrow".to_owned(),
        days => format!("in {days} days"),
    }
}

fn text_body(days_until_expiry: i64, expires_at: DateTime<Utc>) -> String {
    format!(
        "Your ID verification expires {} (on {}).\n\n\
         Re-verify before then to keep booking without interruption.\n\n\
         Open the app and go to Settings > Verification to start.",
        day_phrase(days_until_expiry),
        expires_at.format("%-d %B %Y"),
    )
}

fn html_body(days_until_expiry: i64, expires_at: DateTime<Utc>) -> String {
    format!(
        "<p>Your ID verification expires <strong>{}</strong> (on {}).</p>\
         <p>Re-verify before then to keep booking without interruption.</p>\
         <p>Open the app and go to <strong>Settings &gt; Verification</strong> to start.</p>",
        day_phrase(days_until_expiry),
        expires_at.format("%-d %B %Y"),
    )
}

impl ResendMailer {
    /// Build a mailer. `config = None` produces an unconfigured mailer whose
    /// [`ExpiryMailer::is_configured`] returns false.
    pub fn new(config: Option<ResendConfig>) -> Self {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

#[async_trait]
impl ExpiryMailer for ResendMailer {
    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn send_expiry_reminder(
        &self,
        recipient: &str,
        days_until_expiry: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), MailerError> {
        let Some(config) = self.config.as_ref() else {
            return Err(MailerError::send("resend mailer is not configured"));
        };

        let request = SendEmailRequest {
            from: config.from.as_str(),
            to: [recipient],
            subject: subject_line(days_until_expiry),
            text: text_body(days_until_expiry, expires_at),
            html: html_body(days_until_expiry, expires_at),
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(config.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|error| MailerError::send(format!("transport error: {error}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(days = days_until_expiry, "reminder email accepted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MailerError::send(format!(
                "provider returned {status}: {body}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn expiry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 21, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    #[case(90, "Your ID verification expires in 90 days")]
    #[case(7, "Your ID verification expires in 7 days")]
    #[case(1, "Your ID verification expires tomorrow")]
    fn subject_lines_read_naturally(#[case] days: i64, #[case] expected: &str) {
        assert_eq!(subject_line(days), expected);
    }

    #[test]
    fn bodies_interpolate_the_formatted_expiry_date() {
        let text = text_body(30, expiry());
        assert!(text.contains("in 30 days"));
        assert!(text.contains("21 November 2026"));

        let html = html_body(1, expiry());
        assert!(html.contains("<strong>tomorrow</strong>"));
        assert!(html.contains("21 November 2026"));
    }

    #[test]
    fn missing_config_reads_as_unconfigured() {
        assert!(!ResendMailer::new(None).is_configured());
        assert!(
            ResendMailer::new(Some(ResendConfig {
                api_key: "re_123".to_owned(),
                from: "Amity <no-reply@amity.example>".to_owned(),
            }))
            .is_configured()
        );
    }

    #[actix_web::test]
    async fn unconfigured_send_is_an_error() {
        let mailer = ResendMailer::new(None);
        let err = mailer
            .send_expiry_reminder("ada@example.test", 7, expiry())
            .await
            .expect_err("unconfigured mailer");
        assert!(err.to_string().contains("not configured"));
    }
}

//! Verification-lifecycle maintenance sweep.
//!
//! One invocation runs two phases in sequence over the verified-user
//! population:
//!
//! 1. **Expiry** — bulk-transition verifications past their validity window
//!    to `expired`, with one audit event per row.
//! 2. **Reminders** — for profiles expiring within the reminder window, send
//!    deduplicated reminders at the fixed day-thresholds on the in-app and
//!    email channels.
//!
//! Per-row failures are recovered locally and counted; only the two bulk
//! queries abort the run. Candidate rows are processed sequentially, so
//! within one run there is no race between sends; cross-run races resolve at
//! the reminder-log layer via atomic claims.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::error::DomainError;
use crate::domain::ports::{
    ExpiryMailer, ReminderCandidate, ReminderLog, VerificationAuditLog, VerificationEvent,
    VerificationEventKind, VerificationMaintenance, VerificationProfileRepository,
    VerificationRepositoryError,
};
use crate::domain::reminder::{
    REMINDER_THRESHOLD_DAYS, REMINDER_WINDOW_DAYS, ReminderChannel, ReminderKey, whole_days_until,
};

/// Aggregate counters returned by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceSummary {
    /// Verifications transitioned to `expired` by this run.
    pub expired_count: u64,
    /// In-app reminders logged (the claim itself is the reminder).
    pub in_app_reminder_count: u64,
    /// Reminder emails accepted by the provider.
    pub email_sent_count: u64,
    /// Reminder emails the provider rejected; their claims were released for
    /// retry on the next run.
    pub email_failed_count: u64,
    /// Whether a mail provider was configured for this run.
    pub mailer_configured: bool,
}

/// The maintenance sweep, generic over its ports.
#[derive(Clone)]
pub struct VerificationMaintenanceService<R, L, A, M> {
    profiles: Arc<R>,
    reminder_log: Arc<L>,
    audit: Arc<A>,
    mailer: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<R, L, A, M> VerificationMaintenanceService<R, L, A, M> {
    /// Create a new service over the given ports.
    pub fn new(
        profiles: Arc<R>,
        reminder_log: Arc<L>,
        audit: Arc<A>,
        mailer: Arc<M>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            reminder_log,
            audit,
            mailer,
            clock,
        }
    }
}

fn map_repository_error(error: VerificationRepositoryError) -> DomainError {
    match error {
        VerificationRepositoryError::Connection { message } => {
            DomainError::service_unavailable(format!("profile store unavailable: {message}"))
        }
        VerificationRepositoryError::Query { message } => {
            DomainError::internal(format!("profile store query failed: {message}"))
        }
    }
}

impl<R, L, A, M> VerificationMaintenanceService<R, L, A, M>
where
    R: VerificationProfileRepository,
    L: ReminderLog,
    A: VerificationAuditLog,
    M: ExpiryMailer,
{
    /// Append an audit event, tolerating adapter failures: the sweep's state
    /// transitions must not be rolled back because auditing is unavailable.
    async fn record_event(&self, event: VerificationEvent) {
        if let Err(error) = self.audit.record(&event).await {
            warn!(
                user_id = %event.user_id,
                kind = event.kind.as_str(),
                %error,
                "audit event dropped"
            );
        }
    }

    async fn expire_phase(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let expired = self
            .profiles
            .expire_due(now)
            .await
            .map_err(map_repository_error)?;

        for row in &expired {
            self.record_event(VerificationEvent {
                user_id: row.user_id,
                kind: VerificationEventKind::IdVerificationExpired,
                details: json!({
                    "previousExpiresAt": row.previous_expires_at.to_rfc3339(),
                }),
                occurred_at: now,
            })
            .await;
        }

        Ok(expired.len() as u64)
    }

    async fn send_in_app_reminder(
        &self,
        candidate: &ReminderCandidate,
        cycle: DateTime<Utc>,
        days: i64,
        summary: &mut MaintenanceSummary,
    ) {
        let key = ReminderKey::new(candidate.user_id, cycle, days, ReminderChannel::InApp);
        match self.reminder_log.try_claim(&key).await {
            // The claim row is the in-app reminder; nothing else to deliver.
            Ok(true) => summary.in_app_reminder_count += 1,
            Ok(false) => {}
            Err(error) => {
                // The claim row is the delivery; without it there is nothing
                // for the client to show, so skip and retry next run.
                warn!(user_id = %candidate.user_id, days, %error, "in-app reminder claim failed");
            }
        }
    }

    async fn send_email_reminder(
        &self,
        candidate: &ReminderCandidate,
        recipient: &str,
        cycle: DateTime<Utc>,
        days: i64,
        summary: &mut MaintenanceSummary,
    ) {
        let key = ReminderKey::new(candidate.user_id, cycle, days, ReminderChannel::Email);
        let claimed = match self.reminder_log.try_claim(&key).await {
            Ok(true) => true,
            Ok(false) => return,
            Err(error) => {
                // An unanswerable dedupe check reads as "not yet sent": a
                // duplicate email beats a silently skipped reminder.
                warn!(
                    user_id = %candidate.user_id,
                    days,
                    %error,
                    "email reminder claim failed; sending without dedupe"
                );
                false
            }
        };

        match self
            .mailer
            .send_expiry_reminder(recipient, days, candidate.expires_at)
            .await
        {
            Ok(()) => {
                summary.email_sent_count += 1;
                self.record_event(VerificationEvent {
                    user_id: candidate.user_id,
                    kind: VerificationEventKind::ExpiryReminderEmailed,
                    details: json!({
                        "thresholdDays": days,
                        "expiresAt": candidate.expires_at.to_rfc3339(),
                    }),
                    occurred_at: self.clock.utc(),
                })
                .await;
            }
            Err(error) => {
                summary.email_failed_count += 1;
                warn!(user_id = %candidate.user_id, days, %error, "reminder email send failed");
                // Withdraw the claim so the next run retries the send.
                if claimed {
                    if let Err(release_error) = self.reminder_log.release(&key).await {
                        warn!(
                            user_id = %candidate.user_id,
                            days,
                            %release_error,
                            "failed to release email reminder claim; reminder will not be retried"
                        );
                    }
                }
            }
        }
    }

    async fn reminder_phase(
        &self,
        now: DateTime<Utc>,
        summary: &mut MaintenanceSummary,
    ) -> Result<(), DomainError> {
        let candidates = self
            .profiles
            .reminder_candidates(now, REMINDER_WINDOW_DAYS)
            .await
            .map_err(map_repository_error)?;

        for candidate in &candidates {
            let days = whole_days_until(now, candidate.expires_at);
            if !REMINDER_THRESHOLD_DAYS.contains(&days) {
                continue;
            }
            // A fresh re-verification resets verified_at and therefore opens
            // a new reminder cycle; rows without one fall back to "now".
            let cycle = candidate.verified_at.unwrap_or(now);

            self.send_in_app_reminder(candidate, cycle, days, summary)
                .await;

            if !summary.mailer_configured {
                continue;
            }
            let recipient = candidate
                .email
                .as_deref()
                .map(str::trim)
                .filter(|address| !address.is_empty());
            if let Some(recipient) = recipient {
                self.send_email_reminder(candidate, recipient, cycle, days, summary)
                    .await;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<R, L, A, M> VerificationMaintenance for VerificationMaintenanceService<R, L, A, M>
where
    R: VerificationProfileRepository,
    L: ReminderLog,
    A: VerificationAuditLog,
    M: ExpiryMailer,
{
    async fn run(&self) -> Result<MaintenanceSummary, DomainError> {
        let now = self.clock.utc();
        let mut summary = MaintenanceSummary {
            mailer_configured: self.mailer.is_configured(),
            ..MaintenanceSummary::default()
        };

        summary.expired_count = self.expire_phase(now).await?;
        self.reminder_phase(now, &mut summary).await?;

        info!(
            expired = summary.expired_count,
            in_app = summary.in_app_reminder_count,
            emails_sent = summary.email_sent_count,
            emails_failed = summary.email_failed_count,
            "verification maintenance sweep complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        ExpiredVerification, FixtureVerificationAuditLog, MockExpiryMailer, MockReminderLog,
        MockVerificationAuditLog, MockVerificationProfileRepository, ReminderLogError,
    };
    use chrono::{Duration, Local, TimeZone};
    use uuid::Uuid;

    struct FixtureClock {
        utc_now: DateTime<Utc>,
    }

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc_now.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.utc_now
        }
    }

    fn fixture_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 20, 6, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    fn fixture_clock() -> Arc<dyn Clock> {
        Arc::new(FixtureClock {
            utc_now: fixture_now(),
        })
    }

    fn candidate_expiring_in_days(days: i64) -> ReminderCandidate {
        let now = fixture_now();
        ReminderCandidate {
            user_id: Uuid::new_v4(),
            email: Some("ada@example.test".to_owned()),
            verified_at: Some(now - Duration::days(ID_CYCLE_AGE_DAYS)),
            expires_at: now + Duration::days(days),
        }
    }

    const ID_CYCLE_AGE_DAYS: i64 = 1000;

    fn configured_mailer() -> MockExpiryMailer {
        let mut mailer = MockExpiryMailer::new();
        mailer.expect_is_configured().return_const(true);
        mailer
    }

    fn no_candidate_repo(expired: Vec<ExpiredVerification>) -> MockVerificationProfileRepository {
        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().return_once(move |_| Ok(expired));
        repo.expect_reminder_candidates()
            .returning(|_, _| Ok(Vec::new()));
        repo
    }

    fn service(
        repo: MockVerificationProfileRepository,
        log: MockReminderLog,
        mailer: MockExpiryMailer,
    ) -> VerificationMaintenanceService<
        MockVerificationProfileRepository,
        MockReminderLog,
        FixtureVerificationAuditLog,
        MockExpiryMailer,
    > {
        VerificationMaintenanceService::new(
            Arc::new(repo),
            Arc::new(log),
            Arc::new(FixtureVerificationAuditLog),
            Arc::new(mailer),
            fixture_clock(),
        )
    }

    #[tokio::test]
    async fn expiry_phase_counts_transitioned_rows() {
        let expired = vec![
            ExpiredVerification {
                user_id: Uuid::new_v4(),
                previous_expires_at: fixture_now() - Duration::days(1),
            },
            ExpiredVerification {
                user_id: Uuid::new_v4(),
                previous_expires_at: fixture_now() - Duration::days(40),
            },
        ];
        let svc = service(
            no_candidate_repo(expired),
            MockReminderLog::new(),
            configured_mailer(),
        );

        let summary = svc.run().await.expect("sweep succeeds");
        assert_eq!(summary.expired_count, 2);
        assert!(summary.mailer_configured);
    }

    #[tokio::test]
    async fn rerun_after_a_clean_sweep_expires_nothing() {
        // The repository filter excludes rows already transitioned, so the
        // second run sees nothing to do.
        let svc = service(
            no_candidate_repo(Vec::new()),
            MockReminderLog::new(),
            configured_mailer(),
        );

        let summary = svc.run().await.expect("sweep succeeds");
        assert_eq!(summary.expired_count, 0);
    }

    #[tokio::test]
    async fn expiry_events_are_recorded_per_row() {
        let user_id = Uuid::new_v4();
        let previous = fixture_now() - Duration::days(3);
        let expired = vec![ExpiredVerification {
            user_id,
            previous_expires_at: previous,
        }];

        let mut audit = MockVerificationAuditLog::new();
        audit
            .expect_record()
            .withf(move |event| {
                event.user_id == user_id
                    && event.kind == VerificationEventKind::IdVerificationExpired
                    && event.details["previousExpiresAt"] == previous.to_rfc3339()
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().return_once(move |_| Ok(expired));
        repo.expect_reminder_candidates()
            .returning(|_, _| Ok(Vec::new()));

        let svc = VerificationMaintenanceService::new(
            Arc::new(repo),
            Arc::new(MockReminderLog::new()),
            Arc::new(audit),
            Arc::new(configured_mailer()),
            fixture_clock(),
        );

        svc.run().await.expect("sweep succeeds");
    }

    #[tokio::test]
    async fn threshold_match_sends_on_both_channels() {
        let candidate = candidate_expiring_in_days(30);
        let user_id = candidate.user_id;
        let cycle = candidate.verified_at.expect("cycle timestamp");

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![candidate]));

        let mut log = MockReminderLog::new();
        log.expect_try_claim()
            .withf(move |key| {
                key.user_id == user_id
                    && key.cycle_verified_at == cycle
                    && key.threshold_days == 30
            })
            .times(2)
            .returning(|_| Ok(true));

        let mut mailer = configured_mailer();
        mailer
            .expect_send_expiry_reminder()
            .withf(|recipient, days, _| recipient == "ada@example.test" && *days == 30)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let svc = service(repo, log, mailer);
        let summary = svc.run().await.expect("sweep succeeds");
        assert_eq!(summary.in_app_reminder_count, 1);
        assert_eq!(summary.email_sent_count, 1);
        assert_eq!(summary.email_failed_count, 0);
    }

    #[tokio::test]
    async fn ninety_one_days_out_is_silent_ninety_is_not() {
        let far = candidate_expiring_in_days(91);
        let due = candidate_expiring_in_days(90);

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![far, due]));

        let mut log = MockReminderLog::new();
        // Only the 90-day candidate may produce claims.
        log.expect_try_claim()
            .withf(|key| key.threshold_days == 90)
            .times(2)
            .returning(|_| Ok(true));

        let mut mailer = configured_mailer();
        mailer
            .expect_send_expiry_reminder()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let svc = service(repo, log, mailer);
        let summary = svc.run().await.expect("sweep succeeds");
        assert_eq!(summary.in_app_reminder_count, 1);
        assert_eq!(summary.email_sent_count, 1);
    }

    #[tokio::test]
    async fn already_claimed_keys_send_nothing() {
        let candidate = candidate_expiring_in_days(7);

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![candidate]));

        let mut log = MockReminderLog::new();
        log.expect_try_claim().times(2).returning(|_| Ok(false));

        let mut mailer = configured_mailer();
        mailer.expect_send_expiry_reminder().times(0);

        let svc = service(repo, log, mailer);
        let summary = svc.run().await.expect("sweep succeeds");
        assert_eq!(summary.in_app_reminder_count, 0);
        assert_eq!(summary.email_sent_count, 0);
    }

    #[tokio::test]
    async fn provider_failure_releases_the_claim_for_retry() {
        let candidate = candidate_expiring_in_days(1);
        let user_id = candidate.user_id;

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![candidate]));

        let mut log = MockReminderLog::new();
        log.expect_try_claim().times(2).returning(|_| Ok(true));
        log.expect_release()
            .withf(move |key| {
                key.user_id == user_id && key.channel == ReminderChannel::Email
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut mailer = configured_mailer();
        mailer
            .expect_send_expiry_reminder()
            .times(1)
            .returning(|_, _, _| Err(crate::domain::ports::MailerError::send("rate limited")));

        let svc = service(repo, log, mailer);
        let summary = svc.run().await.expect("sweep succeeds");
        assert_eq!(summary.email_sent_count, 0);
        assert_eq!(summary.email_failed_count, 1);
        // The in-app reminder still landed.
        assert_eq!(summary.in_app_reminder_count, 1);
    }

    #[tokio::test]
    async fn claim_errors_fail_open_and_continue() {
        let first = candidate_expiring_in_days(7);
        let second = candidate_expiring_in_days(30);
        let second_user = second.user_id;

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![first, second]));

        let mut log = MockReminderLog::new();
        log.expect_try_claim()
            .withf(|key| key.threshold_days == 7)
            .times(2)
            .returning(|_| Err(ReminderLogError::query("relation busy")));
        log.expect_try_claim()
            .withf(move |key| key.threshold_days == 30 && key.user_id == second_user)
            .times(2)
            .returning(|_| Ok(true));
        log.expect_release().times(0);

        let mut mailer = configured_mailer();
        // Both candidates get their email: the errored dedupe check reads as
        // "not yet sent" rather than suppressing the reminder.
        mailer
            .expect_send_expiry_reminder()
            .times(2)
            .returning(|_, _, _| Ok(()));

        let svc = service(repo, log, mailer);
        let summary = svc.run().await.expect("sweep succeeds");
        // The in-app claim row could not be written, so only the healthy
        // candidate counts there.
        assert_eq!(summary.in_app_reminder_count, 1);
        assert_eq!(summary.email_sent_count, 2);
        assert_eq!(summary.email_failed_count, 0);
    }

    #[tokio::test]
    async fn send_failure_after_a_failed_claim_releases_nothing() {
        let candidate = candidate_expiring_in_days(1);

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![candidate]));

        let mut log = MockReminderLog::new();
        log.expect_try_claim()
            .times(2)
            .returning(|_| Err(ReminderLogError::query("relation busy")));
        // No claim exists, so a failed send must not delete anything.
        log.expect_release().times(0);

        let mut mailer = configured_mailer();
        mailer
            .expect_send_expiry_reminder()
            .times(1)
            .returning(|_, _, _| Err(crate::domain::ports::MailerError::send("rate limited")));

        let svc = service(repo, log, mailer);
        let summary = svc.run().await.expect("sweep succeeds");
        assert_eq!(summary.email_failed_count, 1);
        assert_eq!(summary.email_sent_count, 0);
    }

    #[tokio::test]
    async fn unconfigured_mailer_skips_email_work_entirely() {
        let candidate = candidate_expiring_in_days(30);

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![candidate]));

        let mut log = MockReminderLog::new();
        log.expect_try_claim()
            .withf(|key| key.channel == ReminderChannel::InApp)
            .times(1)
            .returning(|_| Ok(true));

        let mut mailer = MockExpiryMailer::new();
        mailer.expect_is_configured().return_const(false);
        mailer.expect_send_expiry_reminder().times(0);

        let svc = service(repo, log, mailer);
        let summary = svc.run().await.expect("sweep succeeds");
        assert!(!summary.mailer_configured);
        assert_eq!(summary.in_app_reminder_count, 1);
        assert_eq!(summary.email_sent_count, 0);
    }

    #[tokio::test]
    async fn blank_email_addresses_are_skipped() {
        let mut candidate = candidate_expiring_in_days(30);
        candidate.email = Some("   ".to_owned());

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![candidate]));

        let mut log = MockReminderLog::new();
        log.expect_try_claim()
            .withf(|key| key.channel == ReminderChannel::InApp)
            .times(1)
            .returning(|_| Ok(true));

        let mut mailer = configured_mailer();
        mailer.expect_send_expiry_reminder().times(0);

        let svc = service(repo, log, mailer);
        let summary = svc.run().await.expect("sweep succeeds");
        assert_eq!(summary.email_sent_count, 0);
    }

    #[tokio::test]
    async fn missing_cycle_timestamp_falls_back_to_now() {
        let mut candidate = candidate_expiring_in_days(30);
        candidate.verified_at = None;
        let now = fixture_now();

        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| Ok(Vec::new()));
        repo.expect_reminder_candidates()
            .return_once(move |_, _| Ok(vec![candidate]));

        let mut log = MockReminderLog::new();
        log.expect_try_claim()
            .withf(move |key| key.cycle_verified_at == now)
            .times(2)
            .returning(|_| Ok(true));

        let mut mailer = configured_mailer();
        mailer
            .expect_send_expiry_reminder()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let svc = service(repo, log, mailer);
        svc.run().await.expect("sweep succeeds");
    }

    #[tokio::test]
    async fn bulk_query_failure_aborts_the_run() {
        let mut repo = MockVerificationProfileRepository::new();
        repo.expect_expire_due().returning(|_| {
            Err(VerificationRepositoryError::connection("refused"))
        });

        let svc = service(repo, MockReminderLog::new(), configured_mailer());
        let error = svc.run().await.expect_err("run fails");
        assert_eq!(
            error.code(),
            crate::domain::error::ErrorCode::ServiceUnavailable
        );
    }
}

//! Scheduled expiry reminders.
//!
//! Each sweep sends bulk expiry reminders for every gym. The notified marker
//! keeps a member from being reminded twice in one expiry cycle, so sweeps
//! can run as often as needed.

use std::time::Duration;

use chrono::{FixedOffset, Utc};
use gymflow_core::attendance::local_date;
use gymflow_core::ledger::NotificationLedger;
use gymflow_core::store::{GymStore, MemberStore};
use gymflow_core::types::Timestamp;
use gymflow_core::{
    ChannelKind, ChannelRegistry, DispatchError, ExpiryWindow, NotificationDispatcher,
    WorkflowSettings,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Totals across all gyms for one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub gyms: usize,
    /// Gyms whose run aborted on a store error.
    pub gyms_failed: usize,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Bulk expiry reminders for every gym through one channel.
pub struct ExpiryJob<S> {
    dispatcher: NotificationDispatcher<S>,
    channel: ChannelKind,
    window_days: u32,
    utc_offset: FixedOffset,
}

impl<S> ExpiryJob<S>
where
    S: MemberStore + GymStore + NotificationLedger,
{
    /// Fails with [`DispatchError::ChannelNotConfigured`] when the settings'
    /// default channel has no credentials, before any work is scheduled.
    pub fn new(
        store: S,
        channels: ChannelRegistry,
        settings: &WorkflowSettings,
    ) -> Result<Self, DispatchError> {
        let channel = settings.default_channel;
        if !channels.is_configured(channel) {
            return Err(DispatchError::ChannelNotConfigured(channel));
        }

        let dispatcher = NotificationDispatcher::new(store, channels, settings.phone_rules())
            .with_throttle(settings.dispatch_throttle);

        Ok(Self {
            dispatcher,
            channel,
            window_days: settings.expiry_window_days,
            utc_offset: settings.utc_offset,
        })
    }

    /// Remind every gym's members whose plan expires within the window
    /// starting on the local date of `now`.
    ///
    /// A store failure for one gym is logged and the sweep moves on.
    pub async fn sweep(&self, now: Timestamp) -> Result<SweepSummary, DispatchError> {
        let gym_ids = self.dispatcher.store().list_gym_ids().await?;
        let window = ExpiryWindow::starting(local_date(now, self.utc_offset), self.window_days);

        let mut summary = SweepSummary {
            gyms: gym_ids.len(),
            ..SweepSummary::default()
        };

        for gym_id in gym_ids {
            match self
                .dispatcher
                .send_bulk_expiry(gym_id, window, self.channel)
                .await
            {
                Ok(result) => {
                    summary.total += result.total;
                    summary.successful += result.successful;
                    summary.failed += result.failed;
                    if result.failed > 0 {
                        tracing::warn!(gym_id, errors = ?result.errors, "Some reminders failed");
                    }
                }
                Err(e @ DispatchError::ChannelNotConfigured(_)) => return Err(e),
                Err(e) => {
                    summary.gyms_failed += 1;
                    tracing::error!(gym_id, error = %e, "Expiry sweep failed for gym");
                }
            }
        }

        tracing::info!(
            gyms = summary.gyms,
            gyms_failed = summary.gyms_failed,
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            window_start = %window.start,
            window_end = %window.end,
            "Expiry sweep finished"
        );
        Ok(summary)
    }

    /// Sweep every `interval` until `cancel` fires.
    ///
    /// The first sweep runs immediately. A sweep in progress is finished
    /// before the loop notices cancellation.
    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            channel = %self.channel,
            window_days = self.window_days,
            "Expiry job started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Expiry job stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep(Utc::now()).await {
                        tracing::error!(error = %e, "Expiry sweep aborted");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use chrono::{Days, NaiveDate, TimeZone};
    use gymflow_core::member::fixtures::member;
    use gymflow_core::member::Member;
    use gymflow_core::testing::{InMemoryStore, RecordingChannel};

    use super::*;

    fn now() -> Timestamp {
        // 11:30 in the gym's +05:30 day of 2026-10-18.
        Utc.with_ymd_and_hms(2026, 10, 18, 6, 0, 0).unwrap()
    }

    fn expiring(today: NaiveDate, id: i64, gym_id: i64, name: &str, days: u64) -> Member {
        let mut m = member(id, gym_id, &format!("GM{id:04}"), name);
        m.plan_expiry_date = today.checked_add_days(Days::new(days));
        m
    }

    fn settings() -> WorkflowSettings {
        WorkflowSettings {
            dispatch_throttle: Duration::ZERO,
            ..WorkflowSettings::default()
        }
    }

    fn store_at(today: NaiveDate) -> InMemoryStore {
        let mut told = expiring(today, 4, 2, "Told", 2);
        told.notified_expiry_date = told.plan_expiry_date;

        InMemoryStore::new()
            .with_gym(1, "Iron Temple")
            .with_gym(2, "Flex Studio")
            .with_member(expiring(today, 1, 1, "Asha", 3))
            .with_member(expiring(today, 2, 1, "Later", 10))
            .with_member(expiring(today, 3, 2, "Ravi", 1))
            .with_member(told)
    }

    fn store() -> InMemoryStore {
        store_at(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    #[tokio::test]
    async fn sweep_reminds_each_gym_once_per_cycle() {
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));
        let store = store();
        let job = ExpiryJob::new(
            store.clone(),
            ChannelRegistry::new().with(sms.clone()),
            &settings(),
        )
        .unwrap();

        let first = job.sweep(now()).await.unwrap();
        assert_eq!(
            first,
            SweepSummary {
                gyms: 2,
                gyms_failed: 0,
                total: 2,
                successful: 2,
                failed: 0,
            }
        );
        let sent = sms.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].body.contains("Iron Temple"));
        assert!(sent[1].body.contains("Flex Studio"));
        assert!(store.member(1).unwrap().is_notified_for_current_cycle());

        let second = job.sweep(now()).await.unwrap();
        assert_eq!(second.total, 0);
        assert_eq!(sms.sent().len(), 2);
    }

    #[test]
    fn missing_channel_is_rejected_up_front() {
        let result = ExpiryJob::new(store(), ChannelRegistry::new(), &settings());
        assert_matches!(
            result.map(|_| ()),
            Err(DispatchError::ChannelNotConfigured(ChannelKind::Sms))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_sweeps_immediately_and_stops_on_cancel() {
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));
        // `run` reads the wall clock, so seed relative to the real local date.
        let today = local_date(Utc::now(), settings().utc_offset);
        let job = Arc::new(
            ExpiryJob::new(
                store_at(today),
                ChannelRegistry::new().with(sms.clone()),
                &settings(),
            )
            .unwrap(),
        );
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let job = Arc::clone(&job);
            let cancel = cancel.clone();
            async move { job.run(Duration::from_secs(3600), cancel).await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sms.sent().len(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}

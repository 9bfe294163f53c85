//! Notification dispatcher.
//!
//! Renders a template per member, normalizes the recipient number and sends
//! through one messaging channel, strictly one member at a time with a fixed
//! pause between provider calls. A failure for one member never aborts the
//! batch; it is counted and described in [`BatchResult::errors`].
//!
//! Two concurrent bulk runs for the same gym can both pick up a member that
//! is not yet marked, so delivery is at-least-once.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::channel::{ChannelKind, ChannelRegistry, MessageChannel};
use crate::expiry::{ExpiryFinder, ExpiryWindow, FinderError};
use crate::ledger::NotificationLedger;
use crate::member::ExpiringMember;
use crate::phone::{normalize_phone, PhoneRules};
use crate::store::{GymStore, MemberStore, StoreError};
use crate::templates::{render, MessageContext, TemplateKind, FALLBACK_GYM_NAME};
use crate::types::DbId;

/// Pause between two provider calls in one run.
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(1);

/// Aggregate outcome of one dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// One human-readable line per failed member.
    pub errors: Vec<String>,
}

impl BatchResult {
    fn record_failure(&mut self, message: String) {
        self.failed += 1;
        self.errors.push(message);
    }
}

/// Errors that abort a dispatch run before any message goes out.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Messaging channel '{0}' is not configured")]
    ChannelNotConfigured(ChannelKind),

    #[error("Member {0} not found")]
    MemberNotFound(DbId),

    #[error("Member {0} is not active")]
    MemberInactive(DbId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FinderError> for DispatchError {
    fn from(err: FinderError) -> Self {
        match err {
            FinderError::MemberNotFound(id) => DispatchError::MemberNotFound(id),
            FinderError::MemberInactive(id) => DispatchError::MemberInactive(id),
            FinderError::Store(e) => DispatchError::Store(e),
        }
    }
}

/// Sends member notifications through the configured channels.
///
/// Cheap to clone when `S` is; the API hands a clone to a background task
/// for welcome messages.
#[derive(Clone)]
pub struct NotificationDispatcher<S> {
    store: S,
    channels: ChannelRegistry,
    phone_rules: PhoneRules,
    throttle: Duration,
}

impl<S> NotificationDispatcher<S>
where
    S: MemberStore + GymStore + NotificationLedger,
{
    pub fn new(store: S, channels: ChannelRegistry, phone_rules: PhoneRules) -> Self {
        Self {
            store,
            channels,
            phone_rules,
            throttle: DEFAULT_THROTTLE,
        }
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Welcome message for a newly registered member.
    pub async fn send_welcome(
        &self,
        gym_id: DbId,
        member_id: DbId,
        channel: ChannelKind,
    ) -> Result<BatchResult, DispatchError> {
        let sender = self.resolve_channel(channel)?;
        let member = ExpiryFinder::new(&self.store)
            .find_individual(gym_id, member_id)
            .await?;
        self.run(gym_id, TemplateKind::Welcome, sender, vec![member])
            .await
    }

    /// On-demand expiry reminder for one member.
    ///
    /// Ignores the notified marker and leaves it untouched, so an operator
    /// can resend at will.
    pub async fn send_expiry_reminder(
        &self,
        gym_id: DbId,
        member_id: DbId,
        channel: ChannelKind,
    ) -> Result<BatchResult, DispatchError> {
        let sender = self.resolve_channel(channel)?;
        let member = ExpiryFinder::new(&self.store)
            .find_individual(gym_id, member_id)
            .await?;
        self.run(gym_id, TemplateKind::ExpiryIndividual, sender, vec![member])
            .await
    }

    /// Bulk expiry reminders for every un-notified member expiring in `window`.
    ///
    /// Each confirmed send sets the member's notified marker.
    pub async fn send_bulk_expiry(
        &self,
        gym_id: DbId,
        window: ExpiryWindow,
        channel: ChannelKind,
    ) -> Result<BatchResult, DispatchError> {
        let sender = self.resolve_channel(channel)?;
        let members = ExpiryFinder::new(&self.store)
            .find_expiring(gym_id, window)
            .await?;
        self.run(gym_id, TemplateKind::ExpiryBulk, sender, members)
            .await
    }

    fn resolve_channel(&self, kind: ChannelKind) -> Result<Arc<dyn MessageChannel>, DispatchError> {
        self.channels
            .get(kind)
            .ok_or(DispatchError::ChannelNotConfigured(kind))
    }

    async fn run(
        &self,
        gym_id: DbId,
        kind: TemplateKind,
        sender: Arc<dyn MessageChannel>,
        members: Vec<ExpiringMember>,
    ) -> Result<BatchResult, DispatchError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "dispatch",
            %run_id,
            gym_id,
            kind = %kind,
            channel = %sender.kind(),
        );

        self.run_members(gym_id, kind, sender.as_ref(), &members)
            .instrument(span)
            .await
    }

    async fn run_members(
        &self,
        gym_id: DbId,
        kind: TemplateKind,
        sender: &dyn MessageChannel,
        members: &[ExpiringMember],
    ) -> Result<BatchResult, DispatchError> {
        let gym_name = self
            .store
            .gym_name(gym_id)
            .await?
            .unwrap_or_else(|| FALLBACK_GYM_NAME.to_string());

        let mut result = BatchResult {
            total: members.len(),
            ..BatchResult::default()
        };
        tracing::info!(total = result.total, "Dispatch run started");

        let mut attempted = false;
        for member in members {
            let raw = recipient_number(member, sender.kind());
            let to = match normalize_phone(raw, &self.phone_rules) {
                Ok(to) => to,
                Err(e) => {
                    tracing::warn!(member_id = member.member_id, error = %e, "Skipping recipient");
                    result.record_failure(format!("Invalid phone number for {}", member.name));
                    continue;
                }
            };

            if attempted {
                tokio::time::sleep(self.throttle).await;
            }
            attempted = true;

            let body = render(
                kind,
                &MessageContext {
                    member_name: &member.name,
                    plan: &member.plan,
                    gym_name: &gym_name,
                    expiry_date: member.expiry_date,
                },
            );

            match sender.send(&to, &body).await {
                Ok(()) => {
                    result.successful += 1;
                    tracing::debug!(member_id = member.member_id, "Message sent");
                    if kind.marks_ledger() {
                        self.mark_notified(gym_id, member).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(member_id = member.member_id, error = %e, "Send failed");
                    result.record_failure(format!("Failed to send to {}: {e}", member.name));
                }
            }
        }

        tracing::info!(
            total = result.total,
            successful = result.successful,
            failed = result.failed,
            "Dispatch run finished"
        );
        Ok(result)
    }

    /// Ledger failures after a confirmed send are logged, not counted: the
    /// member did receive the message.
    async fn mark_notified(&self, gym_id: DbId, member: &ExpiringMember) {
        let Some(expiry_date) = member.expiry_date else {
            return;
        };
        match self
            .store
            .mark_notified(gym_id, member.member_id, expiry_date, Utc::now())
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                member_id = member.member_id,
                "Member vanished before the notified marker could be set"
            ),
            Err(e) => tracing::error!(
                member_id = member.member_id,
                error = %e,
                "Failed to set notified marker"
            ),
        }
    }
}

/// WhatsApp goes to the member's WhatsApp number when one is on file.
fn recipient_number(member: &ExpiringMember, channel: ChannelKind) -> &str {
    match (channel, member.whatsapp_number.as_deref()) {
        (ChannelKind::Whatsapp, Some(number)) if !number.trim().is_empty() => number,
        _ => &member.phone,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Days, NaiveDate};

    use super::*;
    use crate::member::fixtures::member;
    use crate::member::{Member, MemberStatus};
    use crate::testing::{InMemoryStore, RecordingChannel};

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn expiring(id: DbId, name: &str, phone: &str, days: u64) -> Member {
        let mut m = member(id, 1, &format!("GM{id:04}"), name);
        m.phone = phone.to_string();
        m.plan_expiry_date = today().checked_add_days(Days::new(days));
        m
    }

    fn dispatcher(
        store: &InMemoryStore,
        channel: &Arc<RecordingChannel>,
    ) -> NotificationDispatcher<InMemoryStore> {
        let channels = ChannelRegistry::new().with(channel.clone());
        NotificationDispatcher::new(store.clone(), channels, PhoneRules::default())
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_run_isolates_invalid_phone() {
        let store = InMemoryStore::new()
            .with_gym(1, "Iron Temple")
            .with_member(expiring(1, "Asha", "9876543210", 1))
            .with_member(expiring(2, "Ravi", "12345", 2))
            .with_member(expiring(3, "Meera", "+91 98765 00000", 3));
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));

        let result = dispatcher(&store, &sms)
            .send_bulk_expiry(1, ExpiryWindow::starting(today(), 5), ChannelKind::Sms)
            .await
            .unwrap();

        assert_eq!(result.total, 3);
        assert_eq!(result.successful, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.errors, vec!["Invalid phone number for Ravi".to_string()]);

        assert!(store.member(1).unwrap().is_notified_for_current_cycle());
        assert!(!store.member(2).unwrap().is_notified_for_current_cycle());
        assert!(store.member(3).unwrap().is_notified_for_current_cycle());

        let sent = sms.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "+919876543210");
        assert!(sent[0].body.contains("Iron Temple is expiring on"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_bulk_run_skips_notified_members() {
        let store = InMemoryStore::new()
            .with_gym(1, "Iron Temple")
            .with_member(expiring(1, "Asha", "9876543210", 1));
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));
        let dispatcher = dispatcher(&store, &sms);
        let window = ExpiryWindow::starting(today(), 5);

        let first = dispatcher
            .send_bulk_expiry(1, window, ChannelKind::Sms)
            .await
            .unwrap();
        let second = dispatcher
            .send_bulk_expiry(1, window, ChannelKind::Sms)
            .await
            .unwrap();

        assert_eq!(first.successful, 1);
        assert_eq!(second.total, 0);
        assert_eq!(sms.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_failure_is_counted_and_batch_continues() {
        let store = InMemoryStore::new()
            .with_gym(1, "Iron Temple")
            .with_member(expiring(1, "Asha", "9876543210", 1))
            .with_member(expiring(2, "Ravi", "9876500000", 2));
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms).failing_for("+919876543210"));

        let result = dispatcher(&store, &sms)
            .send_bulk_expiry(1, ExpiryWindow::starting(today(), 5), ChannelKind::Sms)
            .await
            .unwrap();

        assert_eq!(result.successful, 1);
        assert_eq!(result.failed, 1);
        assert!(result.errors[0].starts_with("Failed to send to Asha: provider returned HTTP 400"));
        assert!(!store.member(1).unwrap().is_notified_for_current_cycle());
        assert!(store.member(2).unwrap().is_notified_for_current_cycle());
    }

    #[tokio::test(start_paused = true)]
    async fn ledger_failure_still_counts_as_sent() {
        let store = InMemoryStore::new()
            .with_gym(1, "Iron Temple")
            .with_member(expiring(1, "Asha", "9876543210", 1));
        store.fail_ledger_updates();
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));

        let result = dispatcher(&store, &sms)
            .send_bulk_expiry(1, ExpiryWindow::starting(today(), 5), ChannelKind::Sms)
            .await
            .unwrap();

        assert_eq!(result.successful, 1);
        assert!(result.errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sends_are_throttled() {
        let store = InMemoryStore::new()
            .with_gym(1, "Iron Temple")
            .with_member(expiring(1, "A", "9876543210", 1))
            .with_member(expiring(2, "B", "9876543211", 1))
            .with_member(expiring(3, "C", "9876543212", 1));
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));

        let started = tokio::time::Instant::now();
        dispatcher(&store, &sms)
            .send_bulk_expiry(1, ExpiryWindow::starting(today(), 5), ChannelKind::Sms)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn missing_channel_aborts_before_any_work() {
        let store = InMemoryStore::new().with_member(expiring(1, "Asha", "9876543210", 1));
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));

        let err = dispatcher(&store, &sms)
            .send_bulk_expiry(1, ExpiryWindow::starting(today(), 5), ChannelKind::Whatsapp)
            .await
            .unwrap_err();

        assert_matches!(err, DispatchError::ChannelNotConfigured(ChannelKind::Whatsapp));
        assert!(sms.sent().is_empty());
    }

    #[tokio::test]
    async fn individual_reminder_does_not_mark_ledger() {
        let mut told = expiring(1, "Asha", "9876543210", 2);
        told.notified_expiry_date = told.plan_expiry_date;
        let store = InMemoryStore::new()
            .with_gym(1, "Iron Temple")
            .with_member(expiring(2, "Ravi", "9876500000", 2))
            .with_member(told);
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));
        let dispatcher = dispatcher(&store, &sms);

        let resent = dispatcher
            .send_expiry_reminder(1, 1, ChannelKind::Sms)
            .await
            .unwrap();
        assert_eq!(resent.successful, 1);

        dispatcher
            .send_expiry_reminder(1, 2, ChannelKind::Sms)
            .await
            .unwrap();
        assert!(store.member(2).unwrap().notified_expiry_date.is_none());

        let sent = sms.sent();
        assert!(sent[0].body.contains("Iron Temple expires on"));
    }

    #[tokio::test]
    async fn single_member_modes_require_active_member() {
        let mut lapsed = expiring(1, "Asha", "9876543210", 2);
        lapsed.status = MemberStatus::Inactive;
        let store = InMemoryStore::new().with_member(lapsed);
        let sms = Arc::new(RecordingChannel::new(ChannelKind::Sms));
        let dispatcher = dispatcher(&store, &sms);

        assert_matches!(
            dispatcher.send_expiry_reminder(1, 1, ChannelKind::Sms).await,
            Err(DispatchError::MemberInactive(1))
        );
        assert_matches!(
            dispatcher.send_welcome(1, 9, ChannelKind::Sms).await,
            Err(DispatchError::MemberNotFound(9))
        );
        assert!(sms.sent().is_empty());
    }

    #[tokio::test]
    async fn welcome_uses_fallback_gym_name_and_whatsapp_number() {
        let mut m = expiring(1, "Asha", "9876543210", 30);
        m.whatsapp_number = Some("91 90000 11111".to_string());
        let store = InMemoryStore::new().with_member(m);
        let whatsapp = Arc::new(RecordingChannel::new(ChannelKind::Whatsapp));
        let channels = ChannelRegistry::new().with(whatsapp.clone());
        let dispatcher = NotificationDispatcher::new(store, channels, PhoneRules::default());

        let result = dispatcher
            .send_welcome(1, 1, ChannelKind::Whatsapp)
            .await
            .unwrap();

        assert_eq!(result.successful, 1);
        let sent = whatsapp.sent();
        assert_eq!(sent[0].to, "+919000011111");
        assert!(sent[0].body.starts_with("🏋️ Welcome to Your Gym, Asha!"));
    }

    #[test]
    fn sms_always_uses_primary_phone() {
        let mut m = ExpiringMember::from(&expiring(1, "Asha", "9876543210", 1));
        m.whatsapp_number = Some("9000011111".to_string());
        assert_eq!(recipient_number(&m, ChannelKind::Sms), "9876543210");
        assert_eq!(recipient_number(&m, ChannelKind::Whatsapp), "9000011111");
    }
}

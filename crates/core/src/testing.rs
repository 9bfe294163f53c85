//! In-memory fakes of the store and channel seams.
//!
//! Compiled for this crate's tests and, through the `testing` feature, for
//! other workspace crates' tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::attendance::{AttendanceRecord, AttendanceStatus, NewCheckIn};
use crate::channel::{ChannelKind, MessageChannel, SendError};
use crate::expiry::{is_bulk_candidate, ExpiryWindow};
use crate::ledger::NotificationLedger;
use crate::member::{ExpiringMember, Member, MemberStatus};
use crate::store::{AttendanceStore, GymStore, MemberStore, StoreError};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Default)]
struct State {
    gyms: BTreeMap<DbId, String>,
    members: BTreeMap<DbId, Member>,
    attendance: BTreeMap<DbId, AttendanceRecord>,
    next_record_id: DbId,
    conflict_on_next_insert: bool,
    ledger_broken: bool,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_gym(self, id: DbId, name: &str) -> Self {
        self.lock().gyms.insert(id, name.to_string());
        self
    }

    pub fn with_member(self, member: Member) -> Self {
        self.lock().members.insert(member.id, member);
        self
    }

    pub fn member(&self, id: DbId) -> Option<Member> {
        self.lock().members.get(&id).cloned()
    }

    /// Make the next `insert_check_in` fail as if a concurrent check-in won.
    pub fn fail_next_insert_with_conflict(&self) {
        self.lock().conflict_on_next_insert = true;
    }

    /// Make every `mark_notified` call fail.
    pub fn fail_ledger_updates(&self) {
        self.lock().ledger_broken = true;
    }
}

#[async_trait]
impl MemberStore for InMemoryStore {
    async fn find_member(&self, gym_id: DbId, member_id: DbId) -> Result<Option<Member>, StoreError> {
        Ok(self
            .lock()
            .members
            .get(&member_id)
            .filter(|m| m.gym_id == gym_id)
            .cloned())
    }

    async fn list_members(
        &self,
        gym_id: DbId,
        status: Option<MemberStatus>,
    ) -> Result<Vec<Member>, StoreError> {
        Ok(self
            .lock()
            .members
            .values()
            .filter(|m| m.gym_id == gym_id)
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect())
    }

    async fn list_expiring_members(
        &self,
        gym_id: DbId,
        window: ExpiryWindow,
    ) -> Result<Vec<ExpiringMember>, StoreError> {
        Ok(self
            .lock()
            .members
            .values()
            .filter(|m| m.gym_id == gym_id && is_bulk_candidate(m, &window))
            .map(ExpiringMember::from)
            .collect())
    }
}

#[async_trait]
impl GymStore for InMemoryStore {
    async fn gym_name(&self, gym_id: DbId) -> Result<Option<String>, StoreError> {
        Ok(self.lock().gyms.get(&gym_id).cloned())
    }

    async fn list_gym_ids(&self) -> Result<Vec<DbId>, StoreError> {
        Ok(self.lock().gyms.keys().copied().collect())
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn find_open_record(
        &self,
        gym_id: DbId,
        member_id: DbId,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .lock()
            .attendance
            .values()
            .find(|r| r.gym_id == gym_id && r.member_id == member_id && r.is_open())
            .cloned())
    }

    async fn insert_check_in(&self, check_in: &NewCheckIn) -> Result<AttendanceRecord, StoreError> {
        let mut state = self.lock();
        if std::mem::take(&mut state.conflict_on_next_insert) {
            return Err(StoreError::Conflict("uq_attendance_open_session".to_string()));
        }

        state.next_record_id += 1;
        let record = AttendanceRecord {
            id: state.next_record_id,
            gym_id: check_in.gym_id,
            member_id: check_in.member_id,
            method: check_in.method,
            status: AttendanceStatus::CheckedIn,
            check_in_time: check_in.check_in_time,
            check_out_time: None,
            duration_minutes: None,
        };
        state.attendance.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_record(
        &self,
        gym_id: DbId,
        record_id: DbId,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .lock()
            .attendance
            .get(&record_id)
            .filter(|r| r.gym_id == gym_id)
            .cloned())
    }

    async fn complete_check_out(
        &self,
        gym_id: DbId,
        record_id: DbId,
        check_out_time: Timestamp,
        duration_minutes: i64,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let mut state = self.lock();
        let Some(record) = state
            .attendance
            .get_mut(&record_id)
            .filter(|r| r.gym_id == gym_id && r.is_open())
        else {
            return Ok(None);
        };

        record.status = AttendanceStatus::CheckedOut;
        record.check_out_time = Some(check_out_time);
        record.duration_minutes = Some(duration_minutes);
        Ok(Some(record.clone()))
    }

    async fn list_check_ins_between(
        &self,
        gym_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self
            .lock()
            .attendance
            .values()
            .filter(|r| r.gym_id == gym_id && r.check_in_time >= from && r.check_in_time < to)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationLedger for InMemoryStore {
    async fn mark_notified(
        &self,
        gym_id: DbId,
        member_id: DbId,
        expiry_date: NaiveDate,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        if state.ledger_broken {
            return Err(StoreError::Backend("ledger unavailable".to_string()));
        }
        match state.members.get_mut(&member_id).filter(|m| m.gym_id == gym_id) {
            Some(member) => {
                member.notified_expiry_date = Some(expiry_date);
                member.notified_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// A message captured by [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
}

/// Channel that records every send and can reject chosen recipients.
#[derive(Debug)]
pub struct RecordingChannel {
    kind: ChannelKind,
    sent: Mutex<Vec<SentMessage>>,
    failing: HashSet<String>,
}

impl RecordingChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            sent: Mutex::new(Vec::new()),
            failing: HashSet::new(),
        }
    }

    /// Reject sends to `to` (normalized form) with HTTP 400.
    pub fn failing_for(mut self, to: &str) -> Self {
        self.failing.insert(to.to_string());
        self
    }

    /// Successfully delivered messages, in send order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), SendError> {
        if self.failing.contains(to) {
            return Err(SendError::Rejected {
                status: 400,
                body: format!("invalid recipient {to}"),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentMessage {
                to: to.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}

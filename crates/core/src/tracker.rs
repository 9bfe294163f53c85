//! Attendance session tracker: check-in, check-out and today's view.

use chrono::FixedOffset;
use serde::Serialize;

use crate::attendance::{
    day_bounds, local_date, session_minutes, summarize_day, AttendanceRecord, CheckInMethod,
    DaySummary, NewCheckIn,
};
use crate::matcher::{match_member, MatchError};
use crate::member::{Member, MemberStatus};
use crate::store::{AttendanceStore, MemberStore, StoreError};
use crate::types::{DbId, Timestamp};

#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("Member {0} not found")]
    MemberNotFound(DbId),

    #[error("Member {0} is not active")]
    MemberInactive(DbId),

    /// `record_id` is `None` when the open session was only detected by the
    /// store's uniqueness constraint.
    #[error("Member {member_id} is already checked in")]
    AlreadyCheckedIn {
        member_id: DbId,
        record_id: Option<DbId>,
    },

    #[error("Attendance record {0} not found")]
    RecordNotFound(DbId),

    #[error("Attendance record {0} is already checked out")]
    AlreadyCheckedOut(DbId),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One day of attendance, split into members still inside and finished sessions.
#[derive(Debug, Clone, Serialize)]
pub struct TodayView {
    pub summary: DaySummary,
    pub active: Vec<AttendanceRecord>,
    pub completed: Vec<AttendanceRecord>,
}

/// Attendance workflow over a member + attendance store.
///
/// `utc_offset` is the gym's local offset; it decides which calendar day a
/// check-in belongs to.
pub struct AttendanceTracker<'a, S: ?Sized> {
    store: &'a S,
    utc_offset: FixedOffset,
}

impl<'a, S> AttendanceTracker<'a, S>
where
    S: MemberStore + AttendanceStore + ?Sized,
{
    pub fn new(store: &'a S, utc_offset: FixedOffset) -> Self {
        Self { store, utc_offset }
    }

    /// Open a session for `member_id`.
    ///
    /// The existence check runs first; a concurrent check-in that slips past
    /// it is caught by the store's one-open-session constraint and reported
    /// the same way.
    pub async fn check_in(
        &self,
        gym_id: DbId,
        member_id: DbId,
        method: CheckInMethod,
        at: Timestamp,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let member = self
            .store
            .find_member(gym_id, member_id)
            .await?
            .ok_or(AttendanceError::MemberNotFound(member_id))?;

        self.open_session(&member, method, at).await
    }

    /// Resolve a front-desk or QR identifier to an active member, then check in.
    pub async fn check_in_by_identifier(
        &self,
        gym_id: DbId,
        identifier: &str,
        method: CheckInMethod,
        at: Timestamp,
    ) -> Result<(Member, AttendanceRecord), AttendanceError> {
        let members = self
            .store
            .list_members(gym_id, Some(MemberStatus::Active))
            .await?;
        let member = match_member(identifier, &members)?.clone();

        let record = self.open_session(&member, method, at).await?;
        Ok((member, record))
    }

    async fn open_session(
        &self,
        member: &Member,
        method: CheckInMethod,
        at: Timestamp,
    ) -> Result<AttendanceRecord, AttendanceError> {
        if !member.is_active() {
            return Err(AttendanceError::MemberInactive(member.id));
        }

        if let Some(open) = self.store.find_open_record(member.gym_id, member.id).await? {
            return Err(AttendanceError::AlreadyCheckedIn {
                member_id: member.id,
                record_id: Some(open.id),
            });
        }

        let new = NewCheckIn {
            gym_id: member.gym_id,
            member_id: member.id,
            method,
            check_in_time: at,
        };

        let record = match self.store.insert_check_in(&new).await {
            Ok(record) => record,
            Err(StoreError::Conflict(constraint)) => {
                tracing::warn!(
                    gym_id = member.gym_id,
                    member_id = member.id,
                    constraint = %constraint,
                    "Concurrent check-in rejected by store"
                );
                return Err(AttendanceError::AlreadyCheckedIn {
                    member_id: member.id,
                    record_id: None,
                });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            gym_id = record.gym_id,
            member_id = record.member_id,
            record_id = record.id,
            method = %method,
            "Member checked in"
        );
        Ok(record)
    }

    /// Close an open session and store its duration.
    pub async fn check_out(
        &self,
        gym_id: DbId,
        record_id: DbId,
        at: Timestamp,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let record = self
            .store
            .find_record(gym_id, record_id)
            .await?
            .ok_or(AttendanceError::RecordNotFound(record_id))?;

        if !record.is_open() {
            return Err(AttendanceError::AlreadyCheckedOut(record_id));
        }

        let minutes = session_minutes(record.check_in_time, at);

        // The update only matches while the record is still open, so of two
        // racing check-outs exactly one wins.
        let closed = self
            .store
            .complete_check_out(gym_id, record_id, at, minutes)
            .await?
            .ok_or(AttendanceError::AlreadyCheckedOut(record_id))?;

        tracing::info!(
            gym_id,
            member_id = closed.member_id,
            record_id,
            duration_minutes = minutes,
            "Member checked out"
        );
        Ok(closed)
    }

    /// Records checked in on the gym's current local day.
    pub async fn today(&self, gym_id: DbId, now: Timestamp) -> Result<TodayView, AttendanceError> {
        let day = local_date(now, self.utc_offset);
        let (from, to) = day_bounds(day, self.utc_offset);
        let records = self.store.list_check_ins_between(gym_id, from, to).await?;

        let summary = summarize_day(&records, day, self.utc_offset);
        let (active, completed): (Vec<_>, Vec<_>) =
            records.into_iter().partition(AttendanceRecord::is_open);

        Ok(TodayView {
            summary,
            active,
            completed,
        })
    }
}

//! Storage seams used by the workflows.
//!
//! Implemented against PostgreSQL by `gymflow-db`'s `PgStore` and by
//! in-memory fakes in tests. Every method takes the gym id explicitly; there
//! is no ambient "current gym".

use async_trait::async_trait;

use crate::attendance::{AttendanceRecord, NewCheckIn};
use crate::expiry::ExpiryWindow;
use crate::member::{ExpiringMember, Member, MemberStatus};
use crate::types::{DbId, Timestamp};

/// Failure reported by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A row did not match the expected shape (unknown status, bad column).
    #[error("Malformed {entity} row: {message}")]
    Decode {
        entity: &'static str,
        message: String,
    },

    /// A uniqueness or exclusion constraint rejected the write.
    #[error("Constraint violated: {0}")]
    Conflict(String),

    /// Anything else from the backend (connection, timeout, SQL error).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn find_member(&self, gym_id: DbId, member_id: DbId)
        -> Result<Option<Member>, StoreError>;

    /// Members of a gym, optionally filtered by status.
    async fn list_members(
        &self,
        gym_id: DbId,
        status: Option<MemberStatus>,
    ) -> Result<Vec<Member>, StoreError>;

    /// Active members whose plan expires inside `window` and who have not been
    /// notified for their current expiry cycle.
    async fn list_expiring_members(
        &self,
        gym_id: DbId,
        window: ExpiryWindow,
    ) -> Result<Vec<ExpiringMember>, StoreError>;
}

#[async_trait]
pub trait GymStore: Send + Sync {
    /// Display name of a gym, `None` if the gym does not exist.
    async fn gym_name(&self, gym_id: DbId) -> Result<Option<String>, StoreError>;

    async fn list_gym_ids(&self) -> Result<Vec<DbId>, StoreError>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// The member's unresolved (not checked out) record, if any.
    async fn find_open_record(
        &self,
        gym_id: DbId,
        member_id: DbId,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Insert a new `checked_in` record. A concurrent open session for the
    /// same member surfaces as [`StoreError::Conflict`].
    async fn insert_check_in(&self, check_in: &NewCheckIn) -> Result<AttendanceRecord, StoreError>;

    async fn find_record(
        &self,
        gym_id: DbId,
        record_id: DbId,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Resolve a record, only if it is still `checked_in`.
    ///
    /// Returns `None` when the record was already checked out (or vanished)
    /// by the time the update ran.
    async fn complete_check_out(
        &self,
        gym_id: DbId,
        record_id: DbId,
        check_out_time: Timestamp,
        duration_minutes: i64,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Records whose check-in falls in `[from, to)`.
    async fn list_check_ins_between(
        &self,
        gym_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;
}

//! [`PgStore`]: the core storage traits over PostgreSQL.

use async_trait::async_trait;
use chrono::NaiveDate;
use gymflow_core::attendance::{AttendanceRecord, NewCheckIn};
use gymflow_core::expiry::ExpiryWindow;
use gymflow_core::ledger::NotificationLedger;
use gymflow_core::member::{ExpiringMember, Member, MemberStatus};
use gymflow_core::store::{AttendanceStore, GymStore, MemberStore, StoreError};
use gymflow_core::types::{DbId, Timestamp};

use crate::repositories::{AttendanceRepo, GymRepo, MemberRepo};
use crate::DbPool;

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Store backed by a shared connection pool. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map a sqlx error to the store taxonomy.
///
/// Unique violations become [`StoreError::Conflict`] carrying the constraint
/// name so callers can tell which invariant fired.
pub fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::Conflict(constraint);
        }
    }
    StoreError::Backend(err.to_string())
}

fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl MemberStore for PgStore {
    async fn find_member(&self, gym_id: DbId, member_id: DbId) -> Result<Option<Member>, StoreError> {
        MemberRepo::find_by_id(&self.pool, gym_id, member_id)
            .await
            .map_err(store_error)?
            .map(Member::try_from)
            .transpose()
    }

    async fn list_members(
        &self,
        gym_id: DbId,
        status: Option<MemberStatus>,
    ) -> Result<Vec<Member>, StoreError> {
        let rows = MemberRepo::list(&self.pool, gym_id, status.map(MemberStatus::as_str))
            .await
            .map_err(store_error)?;
        decode_all(rows)
    }

    async fn list_expiring_members(
        &self,
        gym_id: DbId,
        window: ExpiryWindow,
    ) -> Result<Vec<ExpiringMember>, StoreError> {
        let rows = MemberRepo::list_expiring(&self.pool, gym_id, window.start, window.end)
            .await
            .map_err(store_error)?;
        let members: Vec<Member> = decode_all(rows)?;
        Ok(members.iter().map(ExpiringMember::from).collect())
    }
}

#[async_trait]
impl GymStore for PgStore {
    async fn gym_name(&self, gym_id: DbId) -> Result<Option<String>, StoreError> {
        let gym = GymRepo::find_by_id(&self.pool, gym_id)
            .await
            .map_err(store_error)?;
        Ok(gym.map(|g| g.name))
    }

    async fn list_gym_ids(&self) -> Result<Vec<DbId>, StoreError> {
        GymRepo::list_ids(&self.pool).await.map_err(store_error)
    }
}

#[async_trait]
impl AttendanceStore for PgStore {
    async fn find_open_record(
        &self,
        gym_id: DbId,
        member_id: DbId,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        AttendanceRepo::find_open(&self.pool, gym_id, member_id)
            .await
            .map_err(store_error)?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn insert_check_in(&self, check_in: &NewCheckIn) -> Result<AttendanceRecord, StoreError> {
        let row = AttendanceRepo::insert_check_in(&self.pool, check_in)
            .await
            .map_err(store_error)?;
        AttendanceRecord::try_from(row)
    }

    async fn find_record(
        &self,
        gym_id: DbId,
        record_id: DbId,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        AttendanceRepo::find_by_id(&self.pool, gym_id, record_id)
            .await
            .map_err(store_error)?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn complete_check_out(
        &self,
        gym_id: DbId,
        record_id: DbId,
        check_out_time: Timestamp,
        duration_minutes: i64,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        AttendanceRepo::complete_check_out(
            &self.pool,
            gym_id,
            record_id,
            check_out_time,
            duration_minutes,
        )
        .await
        .map_err(store_error)?
        .map(AttendanceRecord::try_from)
        .transpose()
    }

    async fn list_check_ins_between(
        &self,
        gym_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = AttendanceRepo::list_between(&self.pool, gym_id, from, to)
            .await
            .map_err(store_error)?;
        decode_all(rows)
    }
}

#[async_trait]
impl NotificationLedger for PgStore {
    async fn mark_notified(
        &self,
        gym_id: DbId,
        member_id: DbId,
        expiry_date: NaiveDate,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        MemberRepo::mark_notified(&self.pool, gym_id, member_id, expiry_date, at)
            .await
            .map_err(store_error)
    }
}

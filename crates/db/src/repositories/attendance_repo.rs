//! Repository for the `attendance` table.

use gymflow_core::attendance::NewCheckIn;
use gymflow_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::attendance::AttendanceRow;

const COLUMNS: &str = "id, gym_id, member_id, method, status, check_in_time, check_out_time, \
    duration_minutes";

/// Provides attendance session operations.
pub struct AttendanceRepo;

impl AttendanceRepo {
    /// The member's `checked_in` record, if any.
    pub async fn find_open(
        pool: &PgPool,
        gym_id: DbId,
        member_id: DbId,
    ) -> Result<Option<AttendanceRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance \
             WHERE gym_id = $1 AND member_id = $2 AND status = 'checked_in'"
        );
        sqlx::query_as::<_, AttendanceRow>(&query)
            .bind(gym_id)
            .bind(member_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a `checked_in` record.
    ///
    /// Fails with a unique violation on `uq_attendance_open_session` when the
    /// member already has an open session.
    pub async fn insert_check_in(
        pool: &PgPool,
        input: &NewCheckIn,
    ) -> Result<AttendanceRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance (gym_id, member_id, method, status, check_in_time) \
             VALUES ($1, $2, $3, 'checked_in', $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceRow>(&query)
            .bind(input.gym_id)
            .bind(input.member_id)
            .bind(input.method.as_str())
            .bind(input.check_in_time)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        gym_id: DbId,
        id: DbId,
    ) -> Result<Option<AttendanceRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM attendance WHERE gym_id = $1 AND id = $2");
        sqlx::query_as::<_, AttendanceRow>(&query)
            .bind(gym_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Close a session. Matches only while the record is still `checked_in`;
    /// returns `None` otherwise.
    pub async fn complete_check_out(
        pool: &PgPool,
        gym_id: DbId,
        id: DbId,
        check_out_time: Timestamp,
        duration_minutes: i64,
    ) -> Result<Option<AttendanceRow>, sqlx::Error> {
        let query = format!(
            "UPDATE attendance \
             SET status = 'checked_out', check_out_time = $3, duration_minutes = $4 \
             WHERE gym_id = $1 AND id = $2 AND status = 'checked_in' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceRow>(&query)
            .bind(gym_id)
            .bind(id)
            .bind(check_out_time)
            .bind(duration_minutes)
            .fetch_optional(pool)
            .await
    }

    /// Records checked in during `[from, to)`, oldest first.
    pub async fn list_between(
        pool: &PgPool,
        gym_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<AttendanceRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM attendance \
             WHERE gym_id = $1 AND check_in_time >= $2 AND check_in_time < $3 \
             ORDER BY check_in_time"
        );
        sqlx::query_as::<_, AttendanceRow>(&query)
            .bind(gym_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }
}

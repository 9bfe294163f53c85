//! Repository for the `members` table.

use chrono::NaiveDate;
use gymflow_core::member::{format_user_id, MemberStatus, Registration};
use gymflow_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::member::MemberRow;

/// Column list for `members` queries.
pub(crate) const COLUMNS: &str = "id, gym_id, user_id, name, phone, whatsapp_number, plan, status, \
    join_date, last_payment, plan_expiry_date, notified_expiry_date, notified_at, created_at";

/// Provides CRUD and ledger operations for members.
pub struct MemberRepo;

impl MemberRepo {
    /// Insert a member, assigning the next `GM####` code for the gym.
    ///
    /// The gym's sequence is bumped in the same transaction, so concurrent
    /// registrations serialize on the gym row. Returns `RowNotFound` if the
    /// gym does not exist.
    pub async fn create(
        pool: &PgPool,
        gym_id: DbId,
        input: &Registration,
    ) -> Result<MemberRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let seq: i64 = sqlx::query_scalar(
            "UPDATE gyms SET member_seq = member_seq + 1 WHERE id = $1 RETURNING member_seq",
        )
        .bind(gym_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO members \
                (gym_id, user_id, name, phone, whatsapp_number, plan, status, \
                 join_date, last_payment, plan_expiry_date) \
             VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, MemberRow>(&query)
            .bind(gym_id)
            .bind(format_user_id(seq))
            .bind(&input.name)
            .bind(&input.phone)
            .bind(&input.whatsapp_number)
            .bind(&input.plan)
            .bind(input.join_date)
            .bind(input.last_payment)
            .bind(input.plan_expiry_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        gym_id: DbId,
        id: DbId,
    ) -> Result<Option<MemberRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM members WHERE gym_id = $1 AND id = $2");
        sqlx::query_as::<_, MemberRow>(&query)
            .bind(gym_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Members of a gym ordered by code, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        gym_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<MemberRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM members \
             WHERE gym_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY user_id"
        );
        sqlx::query_as::<_, MemberRow>(&query)
            .bind(gym_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Active members expiring in `[start, end]` who were not reminded for
    /// their current expiry date.
    pub async fn list_expiring(
        pool: &PgPool,
        gym_id: DbId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MemberRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM members \
             WHERE gym_id = $1 \
               AND status = 'active' \
               AND plan_expiry_date BETWEEN $2 AND $3 \
               AND notified_expiry_date IS DISTINCT FROM plan_expiry_date \
             ORDER BY plan_expiry_date, id"
        );
        sqlx::query_as::<_, MemberRow>(&query)
            .bind(gym_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Set the notified marker for `expiry_date`.
    ///
    /// Returns `false` if the member does not exist in this gym.
    pub async fn mark_notified(
        pool: &PgPool,
        gym_id: DbId,
        id: DbId,
        expiry_date: NaiveDate,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE members \
             SET notified_expiry_date = $3, notified_at = $4, updated_at = NOW() \
             WHERE gym_id = $1 AND id = $2",
        )
        .bind(gym_id)
        .bind(id)
        .bind(expiry_date)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change lifecycle status. `None` if no such member in the gym.
    pub async fn update_status(
        pool: &PgPool,
        gym_id: DbId,
        id: DbId,
        status: MemberStatus,
    ) -> Result<Option<MemberRow>, sqlx::Error> {
        let query = format!(
            "UPDATE members SET status = $3, updated_at = NOW() \
             WHERE gym_id = $1 AND id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MemberRow>(&query)
            .bind(gym_id)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }
}

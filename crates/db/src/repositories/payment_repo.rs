//! Repository for the `payments` table.

use gymflow_core::payment::{NewPayment, Renewal};
use gymflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::member::MemberRow;
use crate::models::payment::Payment;
use crate::repositories::member_repo::COLUMNS as MEMBER_COLUMNS;

const COLUMNS: &str =
    "id, gym_id, member_id, amount, method, plan, paid_on, new_expiry_date, created_at";

/// Provides payment and renewal operations.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Record a payment and apply the renewal to the member atomically.
    ///
    /// The member is reactivated and the notified marker cleared, which
    /// starts a new expiry cycle. Returns `RowNotFound` if the member does
    /// not exist in this gym.
    pub async fn record_renewal(
        pool: &PgPool,
        gym_id: DbId,
        member_id: DbId,
        payment: &NewPayment,
        renewal: &Renewal,
    ) -> Result<(Payment, MemberRow), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let member_query = format!(
            "UPDATE members \
             SET plan = $3, last_payment = $4, plan_expiry_date = $5, status = 'active', \
                 notified_expiry_date = NULL, notified_at = NULL, updated_at = NOW() \
             WHERE gym_id = $1 AND id = $2 \
             RETURNING {MEMBER_COLUMNS}"
        );
        let member = sqlx::query_as::<_, MemberRow>(&member_query)
            .bind(gym_id)
            .bind(member_id)
            .bind(&renewal.plan)
            .bind(renewal.paid_on)
            .bind(renewal.plan_expiry_date)
            .fetch_one(&mut *tx)
            .await?;

        let payment_query = format!(
            "INSERT INTO payments \
                (gym_id, member_id, amount, method, plan, paid_on, new_expiry_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&payment_query)
            .bind(gym_id)
            .bind(member_id)
            .bind(payment.amount)
            .bind(payment.method.as_str())
            .bind(&renewal.plan)
            .bind(renewal.paid_on)
            .bind(renewal.plan_expiry_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((payment, member))
    }

    /// A member's payments, newest first.
    pub async fn list_for_member(
        pool: &PgPool,
        gym_id: DbId,
        member_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE gym_id = $1 AND member_id = $2 \
             ORDER BY paid_on DESC, id DESC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(gym_id)
            .bind(member_id)
            .fetch_all(pool)
            .await
    }
}

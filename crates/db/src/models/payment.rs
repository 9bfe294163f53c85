//! Payment entity model.

use chrono::NaiveDate;
use gymflow_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub gym_id: DbId,
    pub member_id: DbId,
    pub amount: i64,
    pub method: String,
    pub plan: String,
    pub paid_on: NaiveDate,
    pub new_expiry_date: NaiveDate,
    pub created_at: Timestamp,
}

//! Member row model and its conversion into the domain type.

use chrono::NaiveDate;
use gymflow_core::member::Member;
use gymflow_core::store::StoreError;
use gymflow_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_column;

/// A raw row from the `members` table.
#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub id: DbId,
    pub gym_id: DbId,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub whatsapp_number: Option<String>,
    pub plan: String,
    pub status: String,
    pub join_date: NaiveDate,
    pub last_payment: Option<NaiveDate>,
    pub plan_expiry_date: Option<NaiveDate>,
    pub notified_expiry_date: Option<NaiveDate>,
    pub notified_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl TryFrom<MemberRow> for Member {
    type Error = StoreError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Member {
            status: parse_column("member", &row.status)?,
            id: row.id,
            gym_id: row.gym_id,
            user_id: row.user_id,
            name: row.name,
            phone: row.phone,
            whatsapp_number: row.whatsapp_number,
            plan: row.plan,
            join_date: row.join_date,
            last_payment: row.last_payment,
            plan_expiry_date: row.plan_expiry_date,
            notified_expiry_date: row.notified_expiry_date,
            notified_at: row.notified_at,
            created_at: row.created_at,
        })
    }
}

//! Gym entity model.

use gymflow_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `gyms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Gym {
    pub id: DbId,
    pub name: String,
    /// Last member sequence number handed out.
    pub member_seq: i64,
    pub created_at: Timestamp,
}

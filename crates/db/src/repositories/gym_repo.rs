//! Repository for the `gyms` table.

use gymflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::gym::Gym;

const COLUMNS: &str = "id, name, member_seq, created_at";

/// Read access to gyms. Gyms are provisioned outside this service.
pub struct GymRepo;

impl GymRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Gym>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM gyms WHERE id = $1");
        sqlx::query_as::<_, Gym>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All gym ids, ascending. Used by the scheduled expiry sweep.
    pub async fn list_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM gyms ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

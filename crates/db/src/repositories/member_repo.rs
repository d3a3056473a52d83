//! Repository for the `members` table.

use sqlx::PgPool;

use crate::models::member::{CreateMember, Member};

const COLUMNS: &str = "id, first_name, last_name, created_at, updated_at";

/// Read access to the member directory, plus inserts for seeding.
pub struct MemberRepo;

impl MemberRepo {
    pub async fn create(pool: &PgPool, input: &CreateMember) -> Result<Member, sqlx::Error> {
        let query = format!(
            "INSERT INTO members (first_name, last_name)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .fetch_one(pool)
            .await
    }

    /// List every member in roster order (last name, first name, id).
    pub async fn list(pool: &PgPool) -> Result<Vec<Member>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM members ORDER BY last_name, first_name, id");
        sqlx::query_as::<_, Member>(&query).fetch_all(pool).await
    }
}

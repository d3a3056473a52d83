//! Repository for the `schedules` table.

use sqlx::PgPool;
use steeple_core::schedule::ScheduleInput;
use steeple_core::types::DbId;

use crate::models::schedule::Schedule;

const COLUMNS: &str = "\
    id, title, day_of_week, service_name, preacher, location, latitude, longitude, \
    starts_at, ends_at, recurrence_rule, created_at, updated_at";

/// Provides CRUD operations for schedules.
pub struct ScheduleRepo;

impl ScheduleRepo {
    pub async fn create(pool: &PgPool, input: &ScheduleInput) -> Result<Schedule, sqlx::Error> {
        let query = format!(
            "INSERT INTO schedules
                (title, day_of_week, service_name, preacher, location,
                 latitude, longitude, starts_at, ends_at, recurrence_rule)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(&input.title)
            .bind(&input.day_of_week)
            .bind(&input.service_name)
            .bind(&input.preacher)
            .bind(&input.location)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.recurrence_rule.as_label())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Schedule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM schedules WHERE id = $1");
        sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all schedules by anchor date-time, oldest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Schedule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM schedules ORDER BY starts_at, id");
        sqlx::query_as::<_, Schedule>(&query).fetch_all(pool).await
    }

    /// Replace every editable field. Returns `None` if no row with `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &ScheduleInput,
    ) -> Result<Option<Schedule>, sqlx::Error> {
        let query = format!(
            "UPDATE schedules SET
                title = $2,
                day_of_week = $3,
                service_name = $4,
                preacher = $5,
                location = $6,
                latitude = $7,
                longitude = $8,
                starts_at = $9,
                ends_at = $10,
                recurrence_rule = $11
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.day_of_week)
            .bind(&input.service_name)
            .bind(&input.preacher)
            .bind(&input.location)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(input.recurrence_rule.as_label())
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a schedule. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Repository for the `attendance_records` table.
//!
//! Reads always return the full roster for an occasion: every member, with
//! their record when one exists. Writes run in a transaction and answer with
//! the roster as it stands after commit.

use sqlx::{PgConnection, PgPool};
use steeple_core::attendance::{AttendanceEntry, AttendanceKey, AttendanceRow};

use crate::models::attendance::{AttendanceRecord, RosterRow};

const RECORD_COLUMNS: &str = "\
    id, member_id, service_date, service_type, status, notes, created_at, updated_at";

/// Members left-joined with their record for `($1, $2)`.
const ROSTER_QUERY: &str = "\
    SELECT m.id AS member_id, m.first_name, m.last_name, \
           COALESCE(ar.status, 'absent') AS status, \
           COALESCE(ar.notes, '') AS notes \
    FROM members m \
    LEFT JOIN attendance_records ar \
           ON ar.member_id = m.id \
          AND ar.service_date = $1 \
          AND ar.service_type = $2 \
    ORDER BY m.last_name, m.first_name, m.id";

const UPSERT_QUERY: &str = "\
    INSERT INTO attendance_records (member_id, service_date, service_type, status, notes) \
    VALUES ($1, $2, $3, $4, $5) \
    ON CONFLICT ON CONSTRAINT uq_attendance_records_occasion_member \
    DO UPDATE SET status = EXCLUDED.status, notes = EXCLUDED.notes";

/// Provides roster reads, batch upserts and the move operation.
pub struct AttendanceRepo;

impl AttendanceRepo {
    /// One row per member for `key`, defaulting to absent with no note.
    pub async fn load_roster(
        pool: &PgPool,
        key: AttendanceKey,
    ) -> Result<Vec<AttendanceRow>, sqlx::Error> {
        let rows = sqlx::query_as::<_, RosterRow>(ROSTER_QUERY)
            .bind(key.date)
            .bind(key.service_type.as_str())
            .fetch_all(pool)
            .await?;

        rows.into_iter()
            .map(|row| AttendanceRow::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e))))
            .collect()
    }

    /// Stored records for `key` only, without the member join.
    pub async fn list_records(
        pool: &PgPool,
        key: AttendanceKey,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records
             WHERE service_date = $1 AND service_type = $2
             ORDER BY member_id"
        );
        sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(key.date)
            .bind(key.service_type.as_str())
            .fetch_all(pool)
            .await
    }

    /// Replace the record of every member in `entries` under `key`.
    /// Members not in `entries` keep whatever they had.
    pub async fn upsert_batch(
        pool: &PgPool,
        key: AttendanceKey,
        entries: &[AttendanceEntry],
    ) -> Result<Vec<AttendanceRow>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        upsert_entries(&mut *tx, key, entries).await?;
        tx.commit().await?;

        Self::load_roster(pool, key).await
    }

    /// Delete every record under `from`, then upsert `entries` under `to`,
    /// all in one transaction.
    ///
    /// Destination records for members outside `entries` survive. Moving an
    /// occasion onto itself is a plain upsert.
    pub async fn move_batch(
        pool: &PgPool,
        from: AttendanceKey,
        to: AttendanceKey,
        entries: &[AttendanceEntry],
    ) -> Result<Vec<AttendanceRow>, sqlx::Error> {
        if from == to {
            return Self::upsert_batch(pool, to, entries).await;
        }

        let mut tx = pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM attendance_records WHERE service_date = $1 AND service_type = $2",
        )
        .bind(from.date)
        .bind(from.service_type.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        upsert_entries(&mut *tx, to, entries).await?;
        tx.commit().await?;

        tracing::debug!(%from, %to, removed, moved = entries.len(), "Attendance moved");

        Self::load_roster(pool, to).await
    }
}

async fn upsert_entries(
    conn: &mut PgConnection,
    key: AttendanceKey,
    entries: &[AttendanceEntry],
) -> Result<(), sqlx::Error> {
    for entry in entries {
        sqlx::query(UPSERT_QUERY)
            .bind(entry.member_id)
            .bind(key.date)
            .bind(key.service_type.as_str())
            .bind(entry.status.as_str())
            .bind(&entry.notes)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

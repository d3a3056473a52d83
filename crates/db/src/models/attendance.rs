//! Attendance record model and the roster row produced by the member join.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use steeple_core::attendance::{AttendanceRow, MemberRef};
use steeple_core::error::CoreError;
use steeple_core::types::{DbId, Timestamp};

/// A row from the `attendance_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceRecord {
    pub id: DbId,
    pub member_id: DbId,
    pub service_date: NaiveDate,
    pub service_type: String,
    pub status: String,
    pub notes: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One member joined with their record for an occasion. Members without a
/// record come back as `absent` with an empty note.
#[derive(Debug, Clone, FromRow)]
pub struct RosterRow {
    pub member_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub notes: String,
}

impl TryFrom<RosterRow> for AttendanceRow {
    type Error = CoreError;

    fn try_from(row: RosterRow) -> Result<Self, Self::Error> {
        Ok(AttendanceRow {
            status: row.status.parse()?,
            member: MemberRef {
                id: row.member_id,
                first_name: row.first_name,
                last_name: row.last_name,
            },
            notes: row.notes,
        })
    }
}

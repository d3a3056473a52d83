//! Shared query parameter types for API handlers.

use chrono::NaiveDateTime;
use serde::Deserialize;
use steeple_core::attendance::{AttendanceKey, ServiceType};

/// Identifies an occasion: `?date=2024-05-05&type=worship`.
#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub date: chrono::NaiveDate,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
}

impl AttendanceQuery {
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey::new(self.date, self.service_type)
    }
}

/// Half-open window `[from, to)` for occurrence listing, plus an optional cap.
///
/// `from` defaults to the server's current local time and `to` to 90 days
/// after `from`.
#[derive(Debug, Deserialize)]
pub struct OccurrenceWindow {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub limit: Option<usize>,
}

/// Optional `?at=` override for read-time annotations.
#[derive(Debug, Deserialize)]
pub struct AtParams {
    pub at: Option<NaiveDateTime>,
}

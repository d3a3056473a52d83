//! Schedule entity model.
//!
//! Writes go through [`steeple_core::schedule::ScheduleInput`], which is
//! shared with the console client.

use serde::Serialize;
use sqlx::FromRow;
use steeple_core::recurrence::{RecurrenceRule, ScheduleTiming};
use steeple_core::schedule::ScheduleDefinition;
use steeple_core::types::{DbId, LocalDateTime, Timestamp};

/// A row from the `schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Schedule {
    pub id: DbId,
    pub title: Option<String>,
    pub day_of_week: String,
    pub service_name: String,
    pub preacher: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub starts_at: LocalDateTime,
    pub ends_at: Option<LocalDateTime>,
    /// `none`, `weekly`, `monthly_last_week` or a free-text label.
    pub recurrence_rule: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Schedule {
    pub fn timing(&self) -> ScheduleTiming {
        ScheduleTiming {
            id: self.id,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            rule: RecurrenceRule::parse(&self.recurrence_rule),
        }
    }
}

impl From<Schedule> for ScheduleDefinition {
    fn from(row: Schedule) -> Self {
        ScheduleDefinition {
            recurrence_rule: RecurrenceRule::parse(&row.recurrence_rule),
            id: row.id,
            title: row.title,
            day_of_week: row.day_of_week,
            service_name: row.service_name,
            preacher: row.preacher,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
        }
    }
}

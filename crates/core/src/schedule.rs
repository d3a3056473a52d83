//! Schedule definitions and their validation rules.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::recurrence::{RecurrenceRule, ScheduleTiming};
use crate::types::{DbId, LocalDateTime};

/// Body of `POST /schedules` and `PUT /schedules/{id}`.
///
/// `PUT` replaces every field, so optional fields can be cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub title: Option<String>,
    pub day_of_week: String,
    pub service_name: String,
    pub preacher: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub starts_at: LocalDateTime,
    pub ends_at: Option<LocalDateTime>,
    #[serde(default)]
    pub recurrence_rule: RecurrenceRule,
}

/// A persisted schedule as the console sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDefinition {
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
    pub recurrence_rule: RecurrenceRule,
}

impl ScheduleDefinition {
    pub fn from_input(id: DbId, input: ScheduleInput) -> Self {
        Self {
            id,
            title: input.title,
            day_of_week: input.day_of_week,
            service_name: input.service_name,
            preacher: input.preacher,
            location: input.location,
            latitude: input.latitude,
            longitude: input.longitude,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            recurrence_rule: input.recurrence_rule,
        }
    }

    pub fn timing(&self) -> ScheduleTiming {
        ScheduleTiming {
            id: self.id,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            rule: self.recurrence_rule.clone(),
        }
    }
}

/// Validate a schedule before it is persisted.
///
/// - `service_name` and `day_of_week` must be non-blank.
/// - latitude and longitude are both set or both absent, and within range.
/// - `ends_at`, when set, is not before `starts_at`.
pub fn validate_schedule(input: &ScheduleInput) -> Result<(), CoreError> {
    if input.service_name.trim().is_empty() {
        return Err(CoreError::Validation("service_name is required".to_string()));
    }
    if input.day_of_week.trim().is_empty() {
        return Err(CoreError::Validation("day_of_week is required".to_string()));
    }

    match (input.latitude, input.longitude) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(CoreError::Validation(format!(
                    "latitude must be between -90 and 90, got {lat}"
                )));
            }
            if !(-180.0..=180.0).contains(&lng) {
                return Err(CoreError::Validation(format!(
                    "longitude must be between -180 and 180, got {lng}"
                )));
            }
        }
        (None, None) => {}
        _ => {
            return Err(CoreError::Validation(
                "latitude and longitude must be provided together".to_string(),
            ));
        }
    }

    if let Some(ends_at) = input.ends_at {
        if ends_at < input.starts_at {
            return Err(CoreError::Validation(
                "ends_at must not be before starts_at".to_string(),
            ));
        }
    }

    Ok(())
}

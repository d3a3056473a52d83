//! Recurrence resolution for schedule definitions.
//!
//! Everything here is pure and deterministic given `(schedule, now)`. Times
//! are naive wall-clock values; there is no timezone or DST handling.
//!
//! Supported rules:
//! - `none`: a one-time gathering at the anchor date-time.
//! - `weekly`: every week on the anchor's weekday and time-of-day.
//! - `monthly_last_week`: once a month, on the anchor's weekday falling in
//!   the final seven days of the month, at the anchor's time-of-day.
//! - anything else is a custom display label and resolves like `none`.
//!
//! A series never yields an occurrence before its anchor or after its end.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::{DbId, LocalDateTime};

/// Upper bound on occurrences returned by one enumeration request.
pub const MAX_OCCURRENCES: usize = 366;

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

pub const RULE_NONE: &str = "none";
pub const RULE_WEEKLY: &str = "weekly";
pub const RULE_MONTHLY_LAST_WEEK: &str = "monthly_last_week";

/// How a schedule repeats. Stored and transmitted as its label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecurrenceRule {
    #[default]
    None,
    Weekly,
    MonthlyLastWeek,
    /// Free-text label such as "Quarterly". Shown as-is, never computed.
    Custom(String),
}

impl RecurrenceRule {
    /// Parse a stored label. Blank input means a one-time schedule.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | RULE_NONE => RecurrenceRule::None,
            RULE_WEEKLY => RecurrenceRule::Weekly,
            RULE_MONTHLY_LAST_WEEK | "monthly-last-week" => RecurrenceRule::MonthlyLastWeek,
            _ => RecurrenceRule::Custom(trimmed.to_string()),
        }
    }

    /// The label persisted in `schedules.recurrence_rule`.
    pub fn as_label(&self) -> &str {
        match self {
            RecurrenceRule::None => RULE_NONE,
            RecurrenceRule::Weekly => RULE_WEEKLY,
            RecurrenceRule::MonthlyLastWeek => RULE_MONTHLY_LAST_WEEK,
            RecurrenceRule::Custom(label) => label,
        }
    }

    /// Whether the resolver computes repeat dates for this rule.
    pub fn is_computable(&self) -> bool {
        matches!(self, RecurrenceRule::Weekly | RecurrenceRule::MonthlyLastWeek)
    }

    /// Human-facing label for badges.
    pub fn display_label(&self) -> String {
        match self {
            RecurrenceRule::None => "One-time".to_string(),
            RecurrenceRule::Weekly => "Weekly".to_string(),
            RecurrenceRule::MonthlyLastWeek => "Last week of the month".to_string(),
            RecurrenceRule::Custom(label) => label.clone(),
        }
    }
}

impl From<String> for RecurrenceRule {
    fn from(value: String) -> Self {
        RecurrenceRule::parse(&value)
    }
}

impl From<RecurrenceRule> for String {
    fn from(value: RecurrenceRule) -> Self {
        value.as_label().to_string()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The part of a schedule definition the resolver looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleTiming {
    pub id: DbId,
    pub starts_at: LocalDateTime,
    pub ends_at: Option<LocalDateTime>,
    pub rule: RecurrenceRule,
}

/// Earliest occurrence at or after `now`, or `None` when the schedule has
/// nothing left to show (one-time in the past, series ended).
pub fn next_occurrence(timing: &ScheduleTiming, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if timing.ends_at.is_some_and(|end| end < now) {
        return None;
    }

    let anchor = timing.starts_at;
    let candidate = match timing.rule {
        RecurrenceRule::Weekly => next_weekly(anchor, now.max(anchor)),
        RecurrenceRule::MonthlyLastWeek => next_monthly_last_week(anchor, now.max(anchor)),
        RecurrenceRule::None | RecurrenceRule::Custom(_) => (anchor >= now).then_some(anchor),
    }?;

    match timing.ends_at {
        Some(end) if candidate > end => None,
        _ => Some(candidate),
    }
}

/// All occurrences in the half-open window `[from, to)`, ascending, at most
/// `limit` of them.
pub fn occurrences_between(
    timing: &ScheduleTiming,
    from: NaiveDateTime,
    to: NaiveDateTime,
    limit: usize,
) -> Vec<NaiveDateTime> {
    let mut found = Vec::new();
    let mut cursor = from;

    while found.len() < limit {
        let Some(at) = next_occurrence(timing, cursor) else {
            break;
        };
        if at >= to {
            break;
        }
        found.push(at);
        let Some(next) = at.checked_add_signed(Duration::seconds(1)) else {
            break;
        };
        cursor = next;
    }

    found
}

/// The id of the single schedule whose next occurrence is soonest.
///
/// Schedules without a resolvable occurrence are skipped. Equal instants
/// resolve to the lower id so the highlight is stable between renders.
pub fn upcoming_schedule_id<'a, I>(schedules: I, now: NaiveDateTime) -> Option<DbId>
where
    I: IntoIterator<Item = &'a ScheduleTiming>,
{
    schedules
        .into_iter()
        .filter_map(|t| next_occurrence(t, now).map(|at| (at, t.id)))
        .min()
        .map(|(_, id)| id)
}

/// Whether `timing` is the one upcoming schedule among `all`.
pub fn is_upcoming(timing: &ScheduleTiming, all: &[ScheduleTiming], now: NaiveDateTime) -> bool {
    upcoming_schedule_id(all, now) == Some(timing.id)
}

// ---------------------------------------------------------------------------
// Calendar helpers
// ---------------------------------------------------------------------------

/// First date on or after `from` that falls on `weekday`. `None` past the
/// end of the calendar.
fn on_or_after(from: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (weekday.num_days_from_monday() + 7 - from.weekday().num_days_from_monday()) % 7;
    from.checked_add_days(Days::new(u64::from(ahead)))
}

fn next_weekly(anchor: NaiveDateTime, floor: NaiveDateTime) -> Option<NaiveDateTime> {
    let candidate = on_or_after(floor.date(), anchor.weekday())?.and_time(anchor.time());
    if candidate >= floor {
        Some(candidate)
    } else {
        candidate.checked_add_days(Days::new(7))
    }
}

fn next_monthly_last_week(anchor: NaiveDateTime, floor: NaiveDateTime) -> Option<NaiveDateTime> {
    let (year, month) = (floor.year(), floor.month());
    let this_month = last_weekday_of_month(year, month, anchor.weekday())?.and_time(anchor.time());
    if this_month >= floor {
        return Some(this_month);
    }

    let (next_year, next_month) = month_after(year, month);
    Some(last_weekday_of_month(next_year, next_month, anchor.weekday())?.and_time(anchor.time()))
}

/// The `weekday` inside the final seven days of the month.
fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    let back = (last.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back)))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = month_after(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn month_after(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

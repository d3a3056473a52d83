//! Attendance occasions, roster rows, and batch validation.
//!
//! An occasion is identified by an [`AttendanceKey`] (calendar day plus
//! service type). Every known member appears once on the roster for an
//! occasion; members without a stored record default to absent with an
//! empty note.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length (in characters) of a per-member attendance note.
pub const MAX_NOTES_LEN: usize = 2000;

// ---------------------------------------------------------------------------
// Service type
// ---------------------------------------------------------------------------

/// The kind of gathering attendance is taken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Worship,
    BibleStudy,
    Event,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::Worship,
        ServiceType::BibleStudy,
        ServiceType::Event,
    ];

    /// The label stored in `attendance_records.service_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Worship => "worship",
            ServiceType::BibleStudy => "bible_study",
            ServiceType::Event => "event",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown service type: '{s}'. Valid types: worship, bible_study, event"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Attendance status
// ---------------------------------------------------------------------------

/// Presence of one member at one occasion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    #[default]
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn is_present(self) -> bool {
        self == AttendanceStatus::Present
    }
}

impl FromStr for AttendanceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            _ => Err(CoreError::Validation(format!(
                "Unknown attendance status: '{s}'. Valid statuses: present, absent"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Occasion key
// ---------------------------------------------------------------------------

/// The (date, service type) pair attendance is recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceKey {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
}

impl AttendanceKey {
    pub fn new(date: NaiveDate, service_type: ServiceType) -> Self {
        Self { date, service_type }
    }

    /// Whether this occasion lies strictly after `today`.
    pub fn is_future(&self, today: NaiveDate) -> bool {
        self.date > today
    }
}

impl fmt::Display for AttendanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.date, self.service_type)
    }
}

// ---------------------------------------------------------------------------
// Roster rows
// ---------------------------------------------------------------------------

/// The member fields shown on an attendance roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
}

impl MemberRef {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One roster line: a known member and their status at an occasion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub member: MemberRef,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: String,
}

impl AttendanceRow {
    /// The default row for a member with no stored record.
    pub fn absent(member: MemberRef) -> Self {
        Self {
            member,
            status: AttendanceStatus::Absent,
            notes: String::new(),
        }
    }

    /// Whether the row says nothing beyond the absent-with-no-note default.
    pub fn is_default(&self) -> bool {
        self.status == AttendanceStatus::Absent && self.notes.is_empty()
    }

    /// The write request that would persist this row as shown.
    pub fn entry(&self) -> AttendanceEntry {
        AttendanceEntry {
            member_id: self.member.id,
            status: self.status,
            notes: self.notes.clone(),
        }
    }
}

/// A write request for one member at an occasion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub member_id: DbId,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: String,
}

/// Full roster for one occasion, as returned by the attendance endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSheet {
    #[serde(flatten)]
    pub key: AttendanceKey,
    pub items: Vec<AttendanceRow>,
}

/// Head-count for one occasion. Members without a record count as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    #[serde(flatten)]
    pub key: AttendanceKey,
    pub present: usize,
    pub absent: usize,
    pub total: usize,
}

/// Count present and absent members over a full roster.
pub fn summarize(key: AttendanceKey, rows: &[AttendanceRow]) -> AttendanceSummary {
    let present = rows.iter().filter(|r| r.status.is_present()).count();
    AttendanceSummary {
        key,
        present,
        absent: rows.len() - present,
        total: rows.len(),
    }
}

// ---------------------------------------------------------------------------
// Save vs. move
// ---------------------------------------------------------------------------

/// What a submitted attendance sheet turns into, decided once at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveCommand {
    /// The sheet is saved under the occasion it was loaded from.
    SaveInPlace {
        key: AttendanceKey,
        entries: Vec<AttendanceEntry>,
    },
    /// The sheet is moved to another occasion and merged with what is there.
    RelocateAndMerge {
        from: AttendanceKey,
        to: AttendanceKey,
        entries: Vec<AttendanceEntry>,
    },
}

impl SaveCommand {
    /// Compare the occasion the rows were loaded under with the one selected
    /// now. A self-move is always a plain save.
    pub fn decide(
        original: AttendanceKey,
        selected: AttendanceKey,
        entries: Vec<AttendanceEntry>,
    ) -> Self {
        if original == selected {
            SaveCommand::SaveInPlace {
                key: selected,
                entries,
            }
        } else {
            SaveCommand::RelocateAndMerge {
                from: original,
                to: selected,
                entries,
            }
        }
    }

    /// The occasion that holds the rows once the command succeeds.
    pub fn target(&self) -> AttendanceKey {
        match self {
            SaveCommand::SaveInPlace { key, .. } => *key,
            SaveCommand::RelocateAndMerge { to, .. } => *to,
        }
    }

    pub fn entries(&self) -> &[AttendanceEntry] {
        match self {
            SaveCommand::SaveInPlace { entries, .. } => entries,
            SaveCommand::RelocateAndMerge { entries, .. } => entries,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject dates strictly after `today`. Attendance cannot be pre-recorded.
pub fn ensure_not_future(date: NaiveDate, today: NaiveDate) -> Result<(), CoreError> {
    if date > today {
        return Err(CoreError::Validation(format!(
            "Attendance cannot be recorded for a future date ({date})"
        )));
    }
    Ok(())
}

/// Validate a batch write for `key` as of `today`.
///
/// Checks the date guard, that each member appears at most once, and that
/// notes stay within [`MAX_NOTES_LEN`].
pub fn validate_batch(
    key: &AttendanceKey,
    entries: &[AttendanceEntry],
    today: NaiveDate,
) -> Result<(), CoreError> {
    ensure_not_future(key.date, today)?;

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.member_id) {
            return Err(CoreError::Validation(format!(
                "Member {} appears more than once in the batch",
                entry.member_id
            )));
        }
        if entry.notes.chars().count() > MAX_NOTES_LEN {
            return Err(CoreError::Validation(format!(
                "Notes for member {} exceed {MAX_NOTES_LEN} characters",
                entry.member_id
            )));
        }
    }
    Ok(())
}

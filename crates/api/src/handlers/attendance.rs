//! Handlers for attendance rosters.
//!
//! Reads return one row per member. Writes validate the batch, persist it,
//! and answer with the roster of the occasion written to.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use steeple_core::attendance::{
    summarize, validate_batch, AttendanceEntry, AttendanceKey, AttendanceSheet, SaveCommand,
    ServiceType,
};
use steeple_db::repositories::AttendanceRepo;

use crate::error::AppResult;
use crate::query::AttendanceQuery;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /attendance`: `{date, type, items}`.
#[derive(Debug, Deserialize)]
pub struct UpsertAttendanceRequest {
    #[serde(flatten)]
    pub key: AttendanceKey,
    pub items: Vec<AttendanceEntry>,
}

/// Body of `PUT /attendance`.
#[derive(Debug, Deserialize)]
pub struct MoveAttendanceRequest {
    pub from_date: NaiveDate,
    pub from_type: ServiceType,
    pub to_date: NaiveDate,
    pub to_type: ServiceType,
    pub items: Vec<AttendanceEntry>,
}

impl MoveAttendanceRequest {
    fn from_key(&self) -> AttendanceKey {
        AttendanceKey::new(self.from_date, self.from_type)
    }

    fn to_key(&self) -> AttendanceKey {
        AttendanceKey::new(self.to_date, self.to_type)
    }
}

/// The server's local calendar day, used for the future-date guard.
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// GET /api/v1/attendance?date=&type=
pub async fn get_roster(
    State(state): State<AppState>,
    Query(params): Query<AttendanceQuery>,
) -> AppResult<impl IntoResponse> {
    let key = params.key();
    let items = AttendanceRepo::load_roster(&state.pool, key).await?;

    Ok(Json(DataResponse {
        data: AttendanceSheet { key, items },
    }))
}

/// GET /api/v1/attendance/records?date=&type=
///
/// Only the rows actually stored for the occasion, with their timestamps.
/// Members without a record are not listed.
pub async fn list_records(
    State(state): State<AppState>,
    Query(params): Query<AttendanceQuery>,
) -> AppResult<impl IntoResponse> {
    let records = AttendanceRepo::list_records(&state.pool, params.key()).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/attendance/summary?date=&type=
///
/// Head-count over the full roster; members without a record count as absent.
pub async fn get_summary(
    State(state): State<AppState>,
    Query(params): Query<AttendanceQuery>,
) -> AppResult<impl IntoResponse> {
    let key = params.key();
    let rows = AttendanceRepo::load_roster(&state.pool, key).await?;

    Ok(Json(DataResponse {
        data: summarize(key, &rows),
    }))
}

/// POST /api/v1/attendance
///
/// Upsert the listed members' records in place. Members not listed keep
/// their current record.
pub async fn upsert(
    State(state): State<AppState>,
    Json(input): Json<UpsertAttendanceRequest>,
) -> AppResult<impl IntoResponse> {
    validate_batch(&input.key, &input.items, today())?;

    let items = AttendanceRepo::upsert_batch(&state.pool, input.key, &input.items).await?;

    tracing::info!(key = %input.key, rows = input.items.len(), "Attendance saved",);

    Ok(Json(DataResponse {
        data: AttendanceSheet {
            key: input.key,
            items,
        },
    }))
}

/// PUT /api/v1/attendance
///
/// Move an occasion's records to another occasion and merge them with what
/// is already there. Identical keys degrade to an upsert.
pub async fn relocate(
    State(state): State<AppState>,
    Json(input): Json<MoveAttendanceRequest>,
) -> AppResult<impl IntoResponse> {
    let (from, to) = (input.from_key(), input.to_key());
    validate_batch(&to, &input.items, today())?;

    let command = SaveCommand::decide(from, to, input.items);
    let items = match &command {
        SaveCommand::SaveInPlace { key, entries } => {
            AttendanceRepo::upsert_batch(&state.pool, *key, entries).await?
        }
        SaveCommand::RelocateAndMerge { from, to, entries } => {
            AttendanceRepo::move_batch(&state.pool, *from, *to, entries).await?
        }
    };

    tracing::info!(%from, %to, rows = command.entries().len(), "Attendance moved",);

    Ok(Json(DataResponse {
        data: AttendanceSheet {
            key: command.target(),
            items,
        },
    }))
}

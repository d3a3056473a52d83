//! Handlers for schedule definitions and their read-time annotations.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use steeple_core::board::annotate;
use steeple_core::error::CoreError;
use steeple_core::recurrence::{occurrences_between, MAX_OCCURRENCES};
use steeple_core::schedule::{validate_schedule, ScheduleDefinition, ScheduleInput};
use steeple_core::types::DbId;
use steeple_db::repositories::ScheduleRepo;

use crate::error::{AppError, AppResult};
use crate::query::{AtParams, OccurrenceWindow};
use crate::response::DataResponse;
use crate::state::AppState;

/// Default occurrence window when `to` is omitted.
const DEFAULT_WINDOW_DAYS: i64 = 90;

/// Response of the occurrences endpoint.
#[derive(Debug, Serialize)]
pub struct OccurrenceList {
    pub schedule_id: DbId,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub occurrences: Vec<NaiveDateTime>,
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Schedule",
        id,
    })
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/schedules
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let schedules = ScheduleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: schedules }))
}

/// GET /api/v1/schedules/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let schedule = ScheduleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: schedule }))
}

/// POST /api/v1/schedules
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ScheduleInput>,
) -> AppResult<impl IntoResponse> {
    validate_schedule(&input)?;

    let schedule = ScheduleRepo::create(&state.pool, &input).await?;

    tracing::info!(
        schedule_id = schedule.id,
        rule = %schedule.recurrence_rule,
        "Schedule created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: schedule })))
}

/// PUT /api/v1/schedules/{id}
///
/// Full replace: omitted optional fields are cleared.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ScheduleInput>,
) -> AppResult<impl IntoResponse> {
    validate_schedule(&input)?;

    let schedule = ScheduleRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(schedule_id = id, "Schedule updated",);

    Ok(Json(DataResponse { data: schedule }))
}

/// DELETE /api/v1/schedules/{id}
///
/// Permanent. Attendance records are keyed by occasion, not schedule, so
/// nothing else is removed.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !ScheduleRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }

    tracing::info!(schedule_id = id, "Schedule deleted",);

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Read-time annotations
// ---------------------------------------------------------------------------

/// GET /api/v1/schedules/overview?at=
///
/// Every schedule with its next occurrence, upcoming flag and badge,
/// computed against `at` (default: the server's local clock).
pub async fn overview(
    State(state): State<AppState>,
    Query(params): Query<AtParams>,
) -> AppResult<impl IntoResponse> {
    let at = params.at.unwrap_or_else(now);
    let schedules: Vec<ScheduleDefinition> = ScheduleRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(ScheduleDefinition::from)
        .collect();

    Ok(Json(DataResponse {
        data: annotate(&schedules, at),
    }))
}

/// GET /api/v1/schedules/{id}/occurrences?from=&to=&limit=
///
/// Concrete occurrences in `[from, to)`, at most `MAX_OCCURRENCES`.
pub async fn occurrences(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(window): Query<OccurrenceWindow>,
) -> AppResult<impl IntoResponse> {
    let schedule = ScheduleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let from = window.from.unwrap_or_else(now);
    let to = match window.to {
        Some(to) => to,
        None => default_window_end(from)?,
    };
    if to <= from {
        return Err(AppError::BadRequest("`to` must be after `from`".to_string()));
    }
    let limit = window.limit.unwrap_or(MAX_OCCURRENCES).min(MAX_OCCURRENCES);

    Ok(Json(DataResponse {
        data: OccurrenceList {
            schedule_id: id,
            from,
            to,
            occurrences: occurrences_between(&schedule.timing(), from, to, limit),
        },
    }))
}

fn default_window_end(from: NaiveDateTime) -> AppResult<NaiveDateTime> {
    from.checked_add_signed(Duration::days(DEFAULT_WINDOW_DAYS))
        .ok_or_else(|| AppError::BadRequest("`from` is too far in the future".to_string()))
}

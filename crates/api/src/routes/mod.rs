pub mod attendance;
pub mod health;
pub mod member;
pub mod schedule;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /attendance                                 roster (GET), upsert (POST), move (PUT)
/// /attendance/summary                         present/absent head-count (GET)
/// /attendance/records                         stored rows for an occasion (GET)
///
/// /members                                    member directory (GET)
///
/// /schedules                                  list, create
/// /schedules/overview                         annotated list with next occurrence
/// /schedules/{id}                             get, replace, delete
/// /schedules/{id}/occurrences                 occurrences in a window
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/attendance", attendance::router())
        .nest("/members", member::router())
        .nest("/schedules", schedule::router())
}

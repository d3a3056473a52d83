use axum::routing::get;
use axum::Router;

use crate::handlers::schedule;
use crate::state::AppState;

/// Routes mounted at `/schedules`.
///
/// ```text
/// GET    /                      -> list
/// POST   /                      -> create
/// GET    /overview              -> overview
/// GET    /{id}                  -> get_by_id
/// PUT    /{id}                  -> update
/// DELETE /{id}                  -> delete
/// GET    /{id}/occurrences      -> occurrences
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(schedule::list).post(schedule::create))
        .route("/overview", get(schedule::overview))
        .route(
            "/{id}",
            get(schedule::get_by_id)
                .put(schedule::update)
                .delete(schedule::delete),
        )
        .route("/{id}/occurrences", get(schedule::occurrences))
}

use axum::routing::get;
use axum::Router;

use crate::handlers::attendance;
use crate::state::AppState;

/// Routes mounted at `/attendance`.
///
/// ```text
/// GET    /?date=&type=          -> get_roster
/// POST   /                      -> upsert
/// PUT    /                      -> relocate
/// GET    /summary?date=&type=   -> get_summary
/// GET    /records?date=&type=   -> list_records
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(attendance::get_roster)
                .post(attendance::upsert)
                .put(attendance::relocate),
        )
        .route("/summary", get(attendance::get_summary))
        .route("/records", get(attendance::list_records))
}

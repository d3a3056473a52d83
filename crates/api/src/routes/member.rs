use axum::routing::get;
use axum::Router;

use crate::handlers::member;
use crate::state::AppState;

/// Routes mounted at `/members`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(member::list))
}

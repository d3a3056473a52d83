use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use steeple_core::attendance::MemberRef;
use steeple_db::models::member::Member;
use steeple_db::repositories::MemberRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/members
///
/// The member directory in roster order.
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let members: Vec<MemberRef> = MemberRepo::list(&state.pool)
        .await?
        .iter()
        .map(Member::to_ref)
        .collect();
    Ok(Json(DataResponse { data: members }))
}

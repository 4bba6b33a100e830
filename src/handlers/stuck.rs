use axum::extract::State;
use axum::response::Json as ResponseJson;

use super::AppState;
use crate::models::StuckObject;

/// The full current registry snapshot as JSON.
pub async fn list_stuck_objects(State(state): State<AppState>) -> ResponseJson<Vec<StuckObject>> {
    ResponseJson(state.registry.list())
}

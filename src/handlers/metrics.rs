use axum::extract::State;

use super::AppState;
use crate::error::Result;

/// Prometheus scrape endpoint.
pub async fn export(State(state): State<AppState>) -> Result<String> {
    state.metrics.render()
}

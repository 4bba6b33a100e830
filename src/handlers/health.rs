use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json as ResponseJson;
use serde_json::{Value, json};

use super::AppState;

/// Liveness: the process is up; the body reports whether a scan cycle is
/// currently in flight.
pub async fn healthz(State(state): State<AppState>) -> ResponseJson<Value> {
    ResponseJson(json!({
        "status": "ok",
        "scanning": state.health.is_scanning(),
    }))
}

/// Readiness: 503 until cluster access has been verified.
pub async fn readyz(
    State(state): State<AppState>,
) -> Result<&'static str, (StatusCode, &'static str)> {
    if state.health.is_connected() {
        Ok("ok")
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, "not connected"))
    }
}

pub async fn version() -> ResponseJson<Value> {
    ResponseJson(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

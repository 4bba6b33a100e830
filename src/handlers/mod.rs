pub mod health;
pub mod metrics;
pub mod stuck;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::health::Health;
use crate::metrics::Metrics;
use crate::registry::StuckRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StuckRegistry>,
    pub metrics: Arc<Metrics>,
    pub health: Arc<Health>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics::export))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/version", get(health::version))
        .route("/stuck-objects", get(stuck::list_stuck_objects))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::{http::StatusCode, response::Json as ResponseJson};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("discovery error: {0}")]
    Discovery(String),
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// A Kubernetes 404. Benign in several places: a discovered resource kind
    /// that is not actually served, or an object that vanished between calls.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Kube(kube::Error::Api(err)) if err.code == 404)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Kube(_) if self.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ResponseJson(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

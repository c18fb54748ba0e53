use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Everything that can go wrong between receiving a repository URL and
/// returning a velocity series.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid repository URL: {0}")]
    Validation(String),
    #[error("repository not found")]
    RepositoryNotFound,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("repository needs at least two commits")]
    InsufficientHistory,
    #[error("invalid data structure in upstream response")]
    UpstreamData,
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl AnalysisError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::Validation(_) => StatusCode::BAD_REQUEST,
            AnalysisError::RepositoryNotFound => StatusCode::NOT_FOUND,
            AnalysisError::RateLimited => StatusCode::FORBIDDEN,
            AnalysisError::InsufficientHistory => StatusCode::BAD_REQUEST,
            AnalysisError::UpstreamData => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

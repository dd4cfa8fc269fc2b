//! HTTP error mapping (spec.md §7 "Propagation rule": errors inside the
//! search/navigation path propagate to the caller as 5xx with a short
//! message; engine errors surface via `JobStatus`, not as a request failure,
//! except `AlreadyRunning`/`NoConnector` which are caller mistakes (4xx)).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use knowledge_engine::EngineError;
use knowledge_search::SearchError;
use knowledge_store::StoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Engine(EngineError::AlreadyRunning(_)) => StatusCode::CONFLICT,
            ApiError::Engine(EngineError::NoConnector(_)) => StatusCode::NOT_FOUND,
            ApiError::Search(_) | ApiError::Store(_) | ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

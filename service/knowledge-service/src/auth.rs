//! Shared-secret auth (spec.md §6: "guarded by a shared-secret header on
//! every route except health/root"). No teacher precedent; grounded on the
//! pack's own axum manifests (`tower-http`'s `trace`/`cors` layers already
//! in this crate's dependency table) for where such middleware sits.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

const API_KEY_HEADER: &str = "x-api-key";

pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(expected) = &state.config.api_key else {
        // No key configured: auth is a no-op (spec.md §6 "keys absent at
        // start-up do not prevent boot").
        return Ok(next.run(request).await);
    };

    let provided = request.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(expected.as_str()) {
        Ok(next.run(request).await)
    } else {
        Err(ApiError::Unauthorized)
    }
}

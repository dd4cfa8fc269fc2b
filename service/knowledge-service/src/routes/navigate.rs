//! `POST /navigate` (spec.md §6, §4.8).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use knowledge_search::{Direction, NavigateRequest, NavigateResponse, Scope};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NavigateBody {
    pub id: String,
    pub direction: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_scope() -> String {
    "chunk".to_string()
}

fn default_limit() -> usize {
    20
}

fn parse_direction(raw: &str) -> Result<Direction, ApiError> {
    match raw {
        "prev" => Ok(Direction::Prev),
        "next" => Ok(Direction::Next),
        "siblings" => Ok(Direction::Siblings),
        "parent" => Ok(Direction::Parent),
        "children" => Ok(Direction::Children),
        other => Err(ApiError::BadRequest(format!("unknown navigation direction: {other}"))),
    }
}

fn parse_scope(raw: &str) -> Result<Scope, ApiError> {
    match raw {
        "chunk" => Ok(Scope::Chunk),
        "datapoint" => Ok(Scope::Datapoint),
        "context" => Ok(Scope::Context),
        other => Err(ApiError::BadRequest(format!("unknown navigation scope: {other}"))),
    }
}

pub async fn navigate(State(state): State<AppState>, Json(body): Json<NavigateBody>) -> Result<Json<NavigateResponse>, ApiError> {
    let request = NavigateRequest {
        id: body.id,
        direction: parse_direction(&body.direction)?,
        scope: parse_scope(&body.scope)?,
        limit: body.limit,
    };
    Ok(Json(state.navigation.navigate(request).await?))
}

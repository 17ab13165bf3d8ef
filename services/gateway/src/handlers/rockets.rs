use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use reconciler::SortOptions;
use types::rocket::{RocketState, RocketSummary};

/// GET /rockets/:id
pub async fn get_rocket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RocketState>, AppError> {
    match state.repository.get(&id).await? {
        Some(rocket) => Ok(Json(rocket)),
        None => Err(AppError::NotFound(format!(
            "Rocket with ID {id} not found"
        ))),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    sort: String,
    #[serde(default)]
    order: String,
}

/// GET /rockets?sort=&order=
///
/// Unknown sort fields fall back to `id`, unknown orders to ascending.
pub async fn list_rockets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RocketSummary>>, AppError> {
    let options = SortOptions::parse(&params.sort, &params.order);
    let rockets = state.repository.list(options).await?;
    Ok(Json(rockets))
}

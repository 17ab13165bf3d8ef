use crate::handlers::{messages, rockets};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/messages", post(messages::submit_message))
        .route("/rockets", get(rockets::list_rockets))
        .route("/rockets/:id", get(rockets::get_rocket))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

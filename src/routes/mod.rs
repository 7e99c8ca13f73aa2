use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::FeedbackStore,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{
        providers::{CatalogProvider, ContextInterpreter},
        PipelineSettings,
    },
};

pub mod feedback;
pub mod recommendations;

/// Shared application state
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub interpreter: Arc<dyn ContextInterpreter>,
    pub store: Arc<dyn FeedbackStore>,
    pub settings: PipelineSettings,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            // Top to bottom is outside in: the trace span needs the request ID
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/recommendations/:id", get(recommendations::get_recommendation))
        .route("/feedback", post(feedback::submit))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

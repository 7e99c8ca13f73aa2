use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::FeedbackRequest,
    routes::AppState,
    services::feedback,
};

/// Handler for listener feedback; learning happens after the response
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<StatusCode> {
    tracing::info!(
        request_id = %request_id,
        listener_id = %request.listener_id,
        track_id = %request.track_id,
        "Processing feedback"
    );

    feedback::submit_feedback(
        state.catalog.clone(),
        state.store.clone(),
        &state.settings,
        request,
    )
    .await?;

    Ok(StatusCode::ACCEPTED)
}

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{RecommendationRecord, RecommendationRequest, RecommendationResponse},
    routes::AppState,
    services::recommendations,
};

/// Handler for the recommendation endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        listener_id = %request.listener_id,
        reference_count = request.reference_track_ids.len(),
        limit = request.limit,
        "Processing recommendation request"
    );

    let response = recommendations::recommend(
        state.catalog.clone(),
        state.interpreter.clone(),
        state.store.clone(),
        &state.settings,
        request,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        recommendation_id = %response.recommendation_id,
        tracks = response.tracks.len(),
        "Recommendation completed"
    );

    Ok(Json(response))
}

/// Returns the stored audit record of an earlier recommendation
pub async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RecommendationRecord>> {
    state
        .store
        .get_recommendation(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Recommendation {} not found", id)))
}

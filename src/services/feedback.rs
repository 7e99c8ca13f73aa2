use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    db::FeedbackStore,
    error::{AppError, AppResult},
    models::{FeedbackEvent, FeedbackRequest},
    services::{feedback_learner, providers::CatalogProvider, recommendations::PipelineSettings},
};

/// Records one piece of listener feedback.
///
/// The event is stored with the track's current audio features so later
/// affinity scoring never has to go back to the catalog. When the track came
/// from a recommendation and the listener engaged with it, the weights used
/// for that recommendation are reinforced in the background. The returned
/// handle belongs to that task, if one was started.
pub async fn submit_feedback(
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn FeedbackStore>,
    settings: &PipelineSettings,
    request: FeedbackRequest,
) -> AppResult<Option<JoinHandle<()>>> {
    if !request.listen_seconds.is_finite() || request.listen_seconds < 0.0 {
        return Err(AppError::InvalidInput(
            "listen_seconds must be a non-negative number".to_string(),
        ));
    }

    let track_id = request.track_id.trim().to_string();
    if track_id.is_empty() {
        return Err(AppError::InvalidInput("track_id cannot be empty".to_string()));
    }

    let features = catalog
        .get_features(vec![track_id.clone()])
        .await?
        .into_iter()
        .find(|f| f.track_id == track_id)
        .map(|f| f.features)
        .ok_or_else(|| {
            AppError::NotFound(format!("No audio features for track {}", track_id))
        })?;

    let event = FeedbackEvent {
        track_id,
        features,
        signal: request.signal,
        listen_seconds: request.listen_seconds,
        timestamp: Utc::now(),
    };

    let recommendation_id = match request.recommendation_id {
        Some(id) => linked_recommendation(store.as_ref(), request.listener_id, id).await?,
        None => None,
    };

    store
        .record_feedback(request.listener_id, &event, recommendation_id)
        .await?;

    tracing::info!(
        listener_id = %request.listener_id,
        track_id = %event.track_id,
        signal = ?event.signal,
        listen_seconds = event.listen_seconds,
        "Feedback recorded"
    );

    let Some(recommendation_id) = recommendation_id else {
        return Ok(None);
    };

    if !feedback_learner::is_engaged(&event, settings.engagement_min_listen_seconds) {
        return Ok(None);
    }

    let listener_id = request.listener_id;
    let handle = tokio::spawn(async move {
        if let Err(e) =
            reinforce_context(store, listener_id, recommendation_id, &event.track_id).await
        {
            tracing::warn!(
                error = %e,
                recommendation_id = %recommendation_id,
                "Failed to reinforce context weights"
            );
        }
    });

    Ok(Some(handle))
}

/// The recommendation an event may be linked to: one that exists and belongs
/// to the listener. Anything else is unlinked so the event is still stored.
async fn linked_recommendation(
    store: &dyn FeedbackStore,
    listener_id: Uuid,
    recommendation_id: Uuid,
) -> AppResult<Option<Uuid>> {
    match store.get_recommendation(recommendation_id).await? {
        Some(record) if record.listener_id == listener_id => Ok(Some(record.id)),
        Some(_) => {
            tracing::warn!(
                listener_id = %listener_id,
                recommendation_id = %recommendation_id,
                "Recommendation belongs to another listener, storing feedback unlinked"
            );
            Ok(None)
        }
        None => {
            tracing::warn!(
                recommendation_id = %recommendation_id,
                "Unknown recommendation, storing feedback unlinked"
            );
            Ok(None)
        }
    }
}

/// Stores the weights of a recommendation as the listener's learned weights
/// for its situation.
///
/// Returns whether anything was stored. Recommendations belonging to another
/// listener, or not containing the track, are ignored.
pub async fn reinforce_context(
    store: Arc<dyn FeedbackStore>,
    listener_id: Uuid,
    recommendation_id: Uuid,
    track_id: &str,
) -> AppResult<bool> {
    let Some(record) = store.get_recommendation(recommendation_id).await? else {
        tracing::debug!(recommendation_id = %recommendation_id, "Unknown recommendation");
        return Ok(false);
    };

    if record.listener_id != listener_id || !record.track_ids.iter().any(|id| id == track_id) {
        tracing::debug!(
            recommendation_id = %recommendation_id,
            "Feedback does not match recommendation"
        );
        return Ok(false);
    }

    store
        .save_learned_context(listener_id, &record.context_key, &record.weights)
        .await?;

    tracing::info!(
        listener_id = %listener_id,
        context_key = %record.context_key,
        "Context weights reinforced"
    );

    Ok(true)
}

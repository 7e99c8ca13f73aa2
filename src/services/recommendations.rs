use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{
    config::Config,
    db::FeedbackStore,
    error::{AppError, AppResult},
    models::{
        AudioFeatureVector, Candidate, ContextWeights, FeedbackEvent, RecommendationRecord,
        RecommendationRequest, RecommendationResponse, RecommendedTrack, ReferenceProfile,
        ScoredCandidate, TrackSummary,
    },
    services::{
        context_weights, diversifier, feedback_learner, profile,
        providers::{CatalogProvider, ContextInterpreter},
        ranking,
    },
};

pub const MAX_LIMIT: i64 = 50;

/// Tunables of the recommendation and feedback pipelines
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub feedback_history_limit: i64,
    pub search_limit_per_query: usize,
    pub learning_rate: f64,
    pub engagement_min_listen_seconds: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            feedback_history_limit: 500,
            search_limit_per_query: 20,
            learning_rate: feedback_learner::DEFAULT_LEARNING_RATE,
            engagement_min_listen_seconds: 30.0,
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            feedback_history_limit: config.feedback_history_limit,
            search_limit_per_query: config.search_limit_per_query,
            learning_rate: config.learning_rate,
            engagement_min_listen_seconds: config.engagement_min_listen_seconds,
        }
    }
}

/// Result of one pass through the recommendation core
#[derive(Debug, Clone)]
pub struct RecommendationOutcome {
    pub profile: ReferenceProfile,
    pub weights: ContextWeights,
    pub results: Vec<ScoredCandidate>,
}

/// The recommendation core: profile, weight, rank, diversify.
///
/// Pure and synchronous. Candidates must arrive complete and deduplicated.
/// Fails only when `reference_features` is empty.
pub fn generate_recommendations(
    reference_features: &[AudioFeatureVector],
    weights: ContextWeights,
    history: &[FeedbackEvent],
    candidates: Vec<Candidate>,
    limit: usize,
    now: DateTime<Utc>,
) -> AppResult<RecommendationOutcome> {
    let profile = profile::build(reference_features)?;
    let target = context_weights::apply_weights(&profile, &weights);
    let ranked = ranking::rank(candidates, &target, history, now);
    let results = diversifier::diversify(&ranked, limit);

    Ok(RecommendationOutcome {
        profile,
        weights,
        results,
    })
}

fn validate(request: &RecommendationRequest) -> AppResult<(Vec<String>, usize)> {
    let mut seen = HashSet::new();
    let reference_ids: Vec<String> = request
        .reference_track_ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect();

    if reference_ids.is_empty() || reference_ids.len() > profile::MAX_REFERENCE_TRACKS {
        return Err(AppError::InvalidInput(format!(
            "Provide between 1 and {} reference tracks",
            profile::MAX_REFERENCE_TRACKS
        )));
    }

    if request.context.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Context description cannot be empty".to_string(),
        ));
    }

    if request.limit < 1 || request.limit > MAX_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "Limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    Ok((reference_ids, request.limit as usize))
}

/// Interprets the context, falling back to neutral weights when unavailable
async fn resolve_weights(
    interpreter: &Arc<dyn ContextInterpreter>,
    context: &str,
    learned: Option<&ContextWeights>,
) -> ContextWeights {
    let prior = learned.and_then(|w| serde_json::to_value(w).ok());

    match interpreter.interpret(context, prior).await {
        Ok(weights) => weights,
        Err(e) => {
            tracing::warn!(error = %e, "Context interpretation failed, using neutral weights");
            ContextWeights::neutral()
        }
    }
}

/// Runs the search queries concurrently and merges the hits in query order.
///
/// Duplicates and excluded IDs are dropped. Fails only if every query fails.
async fn search_candidates(
    catalog: &Arc<dyn CatalogProvider>,
    queries: Vec<String>,
    per_query: usize,
    exclude: &HashSet<String>,
) -> AppResult<Vec<TrackSummary>> {
    let mut tasks = JoinSet::new();

    for (index, query) in queries.into_iter().enumerate() {
        let catalog = Arc::clone(catalog);
        tasks.spawn(async move { (index, catalog.search_tracks(&query, per_query).await) });
    }

    let mut pages = Vec::new();
    let mut errors = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(tracks))) => pages.push((index, tracks)),
            Ok((_, Err(e))) => {
                tracing::error!(error = %e, "Candidate search failed");
                errors.push(e);
            }
            Err(e) => {
                tracing::error!(error = %e, "Task join error");
                errors.push(AppError::Internal(e.to_string()));
            }
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            success_count = pages.len(),
            error_count = errors.len(),
            "Partial candidate search failure"
        );
    }

    if pages.is_empty() && !errors.is_empty() {
        return Err(AppError::ExternalApi(
            "Failed to fetch any candidate tracks".to_string(),
        ));
    }

    // Completion order is arbitrary; query order keeps rankings reproducible
    pages.sort_by_key(|(index, _)| *index);

    let mut seen: HashSet<String> = exclude.clone();
    Ok(pages
        .into_iter()
        .flat_map(|(_, tracks)| tracks)
        .filter(|track| seen.insert(track.id.clone()))
        .collect())
}

/// Attaches features to search hits, dropping tracks the catalog has no analysis for
async fn attach_features(
    catalog: &Arc<dyn CatalogProvider>,
    summaries: Vec<TrackSummary>,
) -> AppResult<Vec<Candidate>> {
    if summaries.is_empty() {
        return Ok(Vec::new());
    }

    let ids = summaries.iter().map(|s| s.id.clone()).collect();
    let mut by_id: HashMap<String, AudioFeatureVector> = catalog
        .get_features(ids)
        .await?
        .into_iter()
        .map(|f| (f.track_id, f.features))
        .collect();

    Ok(summaries
        .into_iter()
        .filter_map(|summary| {
            let features = by_id.remove(&summary.id)?;
            Some(Candidate::from_summary(summary, features))
        })
        .collect())
}

/// Full recommendation pipeline for one request.
///
/// Interprets the context (neutral on failure), blends in weights learned
/// from earlier engagement, fans out catalog searches, runs the core and
/// stores an audit record.
pub async fn recommend(
    catalog: Arc<dyn CatalogProvider>,
    interpreter: Arc<dyn ContextInterpreter>,
    store: Arc<dyn FeedbackStore>,
    settings: &PipelineSettings,
    request: RecommendationRequest,
) -> AppResult<RecommendationResponse> {
    let start = Instant::now();
    let (reference_ids, limit) = validate(&request)?;
    let listener_id = request.listener_id;
    let context_key = feedback_learner::context_key(&request.context);

    tracing::info!(
        listener_id = %listener_id,
        references = reference_ids.len(),
        limit,
        provider = catalog.name(),
        "Starting recommendation"
    );

    // 1. Context weights, nudged towards what worked before in this situation
    let learned = store.learned_context(listener_id, &context_key).await?;
    let interpreted = resolve_weights(&interpreter, &request.context, learned.as_ref()).await;
    let weights = feedback_learner::adjust(interpreted, learned.as_ref(), settings.learning_rate);

    // 2. Reference features and artists
    let reference_features: Vec<AudioFeatureVector> = catalog
        .get_features(reference_ids.clone())
        .await?
        .into_iter()
        .map(|f| f.features)
        .collect();

    if reference_features.is_empty() {
        return Err(AppError::InsufficientInput(
            "No audio features available for the reference tracks".to_string(),
        ));
    }

    let reference_tracks = catalog.get_tracks(reference_ids.clone()).await?;

    // 3. Candidate fan-out: the situation itself plus each reference artist
    let mut queries = vec![request.context.trim().to_string()];
    for track in &reference_tracks {
        if !queries.contains(&track.artist) {
            queries.push(track.artist.clone());
        }
    }

    let exclude: HashSet<String> = reference_ids.iter().cloned().collect();
    let summaries =
        search_candidates(&catalog, queries, settings.search_limit_per_query, &exclude).await?;
    let candidates = attach_features(&catalog, summaries).await?;

    tracing::info!(
        listener_id = %listener_id,
        candidates = candidates.len(),
        "Candidates gathered"
    );

    // 4. Personal history and the core
    let history = store
        .get_feedback(listener_id, settings.feedback_history_limit)
        .await?;

    let outcome = generate_recommendations(
        &reference_features,
        weights,
        &history,
        candidates,
        limit,
        Utc::now(),
    )?;

    // 5. Audit record
    let record = RecommendationRecord {
        id: Uuid::new_v4(),
        listener_id,
        context_text: request.context.clone(),
        context_key,
        weights: outcome.weights,
        profile: outcome.profile,
        track_ids: outcome
            .results
            .iter()
            .map(|s| s.candidate.track_id.clone())
            .collect(),
        created_at: Utc::now(),
    };
    store.save_recommendation(&record).await?;

    tracing::info!(
        listener_id = %listener_id,
        recommendation_id = %record.id,
        results = outcome.results.len(),
        history = history.len(),
        learned_context = learned.is_some(),
        processing_time_ms = start.elapsed().as_millis(),
        "Recommendation completed"
    );

    Ok(RecommendationResponse {
        recommendation_id: record.id,
        reference_profile: outcome.profile,
        context_weights: outcome.weights,
        tracks: outcome.results.iter().map(RecommendedTrack::from).collect(),
    })
}

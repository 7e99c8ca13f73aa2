//! Listener feedback persistence.
//!
//! Rows are decoded into typed [`FeedbackEvent`]s here, once, so nothing past
//! this boundary handles raw records.

use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        AudioFeatureVector, ContextWeights, FeedbackEvent, FeedbackSignal, RecommendationRecord,
        ReferenceProfile,
    },
};

/// Storage for feedback history, served recommendations and learned contexts
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Most recent feedback first, at most `limit` events
    async fn get_feedback(&self, listener_id: Uuid, limit: i64) -> AppResult<Vec<FeedbackEvent>>;

    /// Appends one event to the listener's history
    async fn record_feedback(
        &self,
        listener_id: Uuid,
        event: &FeedbackEvent,
        recommendation_id: Option<Uuid>,
    ) -> AppResult<()>;

    async fn save_recommendation(&self, record: &RecommendationRecord) -> AppResult<()>;

    async fn get_recommendation(&self, id: Uuid) -> AppResult<Option<RecommendationRecord>>;

    /// Weights that previously earned engagement for this situation
    async fn learned_context(
        &self,
        listener_id: Uuid,
        context_key: &str,
    ) -> AppResult<Option<ContextWeights>>;

    async fn save_learned_context(
        &self,
        listener_id: Uuid,
        context_key: &str,
        weights: &ContextWeights,
    ) -> AppResult<()>;
}

#[derive(Debug, FromRow)]
struct FeedbackRow {
    track_id: String,
    features: Json<AudioFeatureVector>,
    signal: i16,
    listen_seconds: f64,
    created_at: DateTime<Utc>,
}

impl FeedbackRow {
    /// `None` for rows whose signal is outside {-1, 0, 1}
    fn into_event(self) -> Option<FeedbackEvent> {
        let signal = FeedbackSignal::from_score(self.signal)?;
        Some(FeedbackEvent {
            track_id: self.track_id,
            features: self.features.0,
            signal,
            listen_seconds: self.listen_seconds,
            timestamp: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecommendationRow {
    id: Uuid,
    listener_id: Uuid,
    context_text: String,
    context_key: String,
    weights: Json<ContextWeights>,
    profile: Json<ReferenceProfile>,
    track_ids: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<RecommendationRow> for RecommendationRecord {
    fn from(row: RecommendationRow) -> Self {
        Self {
            id: row.id,
            listener_id: row.listener_id,
            context_text: row.context_text,
            context_key: row.context_key,
            weights: row.weights.0,
            profile: row.profile.0,
            track_ids: row.track_ids,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed [`FeedbackStore`]
#[derive(Clone)]
pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn get_feedback(&self, listener_id: Uuid, limit: i64) -> AppResult<Vec<FeedbackEvent>> {
        let rows: Vec<FeedbackRow> = sqlx::query_as(
            r#"
            SELECT track_id, features, signal, listen_seconds, created_at
            FROM feedback_events
            WHERE listener_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(listener_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total = rows.len();
        let events: Vec<FeedbackEvent> = rows.into_iter().filter_map(FeedbackRow::into_event).collect();

        if events.len() < total {
            tracing::warn!(
                listener_id = %listener_id,
                dropped = total - events.len(),
                "Skipped feedback rows with unknown signal"
            );
        }

        Ok(events)
    }

    async fn record_feedback(
        &self,
        listener_id: Uuid,
        event: &FeedbackEvent,
        recommendation_id: Option<Uuid>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback_events
                (listener_id, recommendation_id, track_id, features, signal, listen_seconds, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(listener_id)
        .bind(recommendation_id)
        .bind(&event.track_id)
        .bind(Json(event.features))
        .bind(event.signal.score())
        .bind(event.listen_seconds)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_recommendation(&self, record: &RecommendationRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendations
                (id, listener_id, context_text, context_key, weights, profile, track_ids, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.listener_id)
        .bind(&record.context_text)
        .bind(&record.context_key)
        .bind(Json(record.weights))
        .bind(Json(record.profile))
        .bind(&record.track_ids)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_recommendation(&self, id: Uuid) -> AppResult<Option<RecommendationRecord>> {
        let row: Option<RecommendationRow> = sqlx::query_as(
            r#"
            SELECT id, listener_id, context_text, context_key, weights, profile, track_ids, created_at
            FROM recommendations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RecommendationRecord::from))
    }

    async fn learned_context(
        &self,
        listener_id: Uuid,
        context_key: &str,
    ) -> AppResult<Option<ContextWeights>> {
        let weights: Option<Json<ContextWeights>> = sqlx::query_scalar(
            r#"
            SELECT weights
            FROM learned_contexts
            WHERE listener_id = $1 AND context_key = $2
            "#,
        )
        .bind(listener_id)
        .bind(context_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(weights.map(|w| w.0))
    }

    async fn save_learned_context(
        &self,
        listener_id: Uuid,
        context_key: &str,
        weights: &ContextWeights,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO learned_contexts (listener_id, context_key, weights, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (listener_id, context_key)
            DO UPDATE SET weights = EXCLUDED.weights, updated_at = NOW()
            "#,
        )
        .bind(listener_id)
        .bind(context_key)
        .bind(Json(*weights))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

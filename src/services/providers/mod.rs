/// External collaborators of the recommendation pipeline
///
/// The catalog supplies candidate tracks and their audio features; the context
/// interpreter turns a free-text listening situation into weights. Both are
/// held as trait objects so the pipeline can be driven by test doubles.
use crate::{
    error::AppResult,
    models::{ContextWeights, TrackFeatures, TrackSummary},
};

pub mod catalog;
pub mod interpreter;

pub use catalog::HttpCatalogProvider;
pub use interpreter::HttpContextInterpreter;

/// Trait for track catalog / audio-feature providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search tracks by free text, best matches first
    async fn search_tracks(&self, query: &str, limit: usize) -> AppResult<Vec<TrackSummary>>;

    /// Look up track metadata by ID
    ///
    /// Unknown IDs are omitted from the result.
    async fn get_tracks(&self, track_ids: Vec<String>) -> AppResult<Vec<TrackSummary>>;

    /// Fetch audio features in bulk
    ///
    /// Tracks without analysis are omitted from the result.
    async fn get_features(&self, track_ids: Vec<String>) -> AppResult<Vec<TrackFeatures>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for natural-language context interpreters
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContextInterpreter: Send + Sync {
    /// Interpret a listening situation into context weights
    ///
    /// Fails with `ContextInterpretationUnavailable` when the interpreter
    /// cannot be reached or returns garbage.
    async fn interpret(
        &self,
        text: &str,
        prior_preferences: Option<serde_json::Value>,
    ) -> AppResult<ContextWeights>;
}

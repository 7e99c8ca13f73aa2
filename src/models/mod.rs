use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod context;
pub mod features;
pub mod feedback;
pub mod profile;
pub mod track;

pub use context::ContextWeights;
pub use features::{AudioFeatureVector, TrackFeatures};
pub use feedback::{FeedbackEvent, FeedbackSignal};
pub use profile::{ReferenceProfile, WeightedProfile};
pub use track::{Candidate, ScoredCandidate, TrackSummary};

// ============================================================================
// Recommendation API Types
// ============================================================================

fn default_limit() -> i64 {
    20
}

/// Request for a fresh recommendation list
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub listener_id: Uuid,
    /// 1-5 catalog track IDs describing the desired sound
    pub reference_track_ids: Vec<String>,
    /// Free-text description of the listening situation
    pub context: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// One track in a recommendation response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedTrack {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub similarity: f64,
    pub personal_affinity: f64,
    pub blended_score: f64,
    pub confidence: f64,
}

impl From<&ScoredCandidate> for RecommendedTrack {
    fn from(scored: &ScoredCandidate) -> Self {
        Self {
            track_id: scored.candidate.track_id.clone(),
            name: scored.candidate.name.clone(),
            artist: scored.candidate.artist.clone(),
            similarity: scored.similarity,
            personal_affinity: scored.personal_affinity,
            blended_score: scored.blended_score,
            confidence: scored.confidence,
        }
    }
}

/// Response with the ranked tracks plus the intermediate profile and weights
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub recommendation_id: Uuid,
    pub reference_profile: ReferenceProfile,
    pub context_weights: ContextWeights,
    pub tracks: Vec<RecommendedTrack>,
}

/// Persisted audit record of one recommendation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationRecord {
    pub id: Uuid,
    pub listener_id: Uuid,
    pub context_text: String,
    /// Normalized context text used to match similar situations
    pub context_key: String,
    pub weights: ContextWeights,
    pub profile: ReferenceProfile,
    pub track_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A listener reacting to a track
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub listener_id: Uuid,
    pub track_id: String,
    pub signal: FeedbackSignal,
    #[serde(default)]
    pub listen_seconds: f64,
    /// The recommendation the track came from, if any
    #[serde(default)]
    pub recommendation_id: Option<Uuid>,
}

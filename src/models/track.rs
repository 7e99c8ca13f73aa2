use serde::{Deserialize, Serialize};

use super::AudioFeatureVector;

/// Catalog search hit, before features are attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    /// Primary (first credited) artist
    pub artist: String,
}

/// A track considered for recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub features: AudioFeatureVector,
}

impl Candidate {
    pub fn from_summary(summary: TrackSummary, features: AudioFeatureVector) -> Self {
        Self {
            track_id: summary.id,
            name: summary.name,
            artist: summary.artist,
            features,
        }
    }
}

/// A candidate annotated with its scores for one ranking pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Weighted cosine similarity to the target profile, in [0, 1]
    pub similarity: f64,
    /// Listener-specific affinity, in [0, 1]
    pub personal_affinity: f64,
    pub blended_score: f64,
    /// `1 - distance` over the primary perceptual features, floored at 0
    pub confidence: f64,
}

use serde::{Deserialize, Serialize};

use super::{AudioFeatureVector, ContextWeights};

/// Centroid of the listener's reference tracks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProfile {
    pub features: AudioFeatureVector,
    pub track_count: usize,
}

/// A reference profile nudged by context weights.
///
/// The weights travel with the profile so the scorer can use them as
/// per-feature importance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedProfile {
    pub features: AudioFeatureVector,
    pub weights: ContextWeights,
}

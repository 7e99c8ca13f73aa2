use crate::{
    models::{AudioFeatureVector, ContextWeights, WeightedProfile},
    services::normalizer::{normalize, NormalizedFeatures},
};

/// Per-feature importance used by the weighted cosine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureWeights {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub loudness: f64,
    pub mode: f64,
    pub key: f64,
}

impl Default for FeatureWeights {
    /// Weights used when no listening context is involved
    fn default() -> Self {
        Self {
            valence: 0.8,
            energy: 0.8,
            danceability: 0.7,
            acousticness: 0.6,
            instrumentalness: 0.4,
            liveness: 0.3,
            speechiness: 0.3,
            tempo: 0.5,
            loudness: 0.2,
            mode: 0.3,
            key: 0.2,
        }
    }
}

impl FeatureWeights {
    /// Primary perceptual features take their importance from the context
    pub fn from_context(context: &ContextWeights) -> Self {
        Self {
            valence: context.valence,
            energy: context.energy,
            danceability: context.danceability,
            acousticness: context.acousticness,
            ..Self::default()
        }
    }

    fn weighted_pairs(&self, a: &NormalizedFeatures, b: &NormalizedFeatures) -> [(f64, f64); 11] {
        let pair = |w: f64, x: f64, y: f64| (w * x, w * y);
        [
            pair(self.valence, a.valence, b.valence),
            pair(self.energy, a.energy, b.energy),
            pair(self.danceability, a.danceability, b.danceability),
            pair(self.acousticness, a.acousticness, b.acousticness),
            pair(self.instrumentalness, a.instrumentalness, b.instrumentalness),
            pair(self.liveness, a.liveness, b.liveness),
            pair(self.speechiness, a.speechiness, b.speechiness),
            pair(self.tempo, a.tempo, b.tempo),
            pair(self.loudness, a.loudness, b.loudness),
            pair(self.mode, a.mode, b.mode),
            pair(self.key, a.key, b.key),
        ]
    }
}

/// Weighted cosine similarity between two feature vectors, in [0, 1].
///
/// With `context` set, the four primary perceptual features are weighted by
/// the context weights; otherwise [`FeatureWeights::default`] applies. A zero
/// norm on either side yields 0.
pub fn similarity(
    target: &AudioFeatureVector,
    candidate: &AudioFeatureVector,
    context: Option<&ContextWeights>,
) -> f64 {
    let weights = context
        .map(FeatureWeights::from_context)
        .unwrap_or_default();
    cosine(&weights, &normalize(target), &normalize(candidate))
}

/// Similarity of a candidate to a context-weighted target profile
pub fn profile_similarity(profile: &WeightedProfile, candidate: &AudioFeatureVector) -> f64 {
    similarity(&profile.features, candidate, Some(&profile.weights))
}

fn cosine(weights: &FeatureWeights, a: &NormalizedFeatures, b: &NormalizedFeatures) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (wa, wb) in weights.weighted_pairs(a, b) {
        dot += wa * wb;
        norm_a += wa * wa;
        norm_b += wb * wb;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        // Degenerate vector
        return 0.0;
    }

    let score = dot / denominator;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Euclidean distance over valence, energy, danceability and acousticness
pub fn euclidean_distance(a: &AudioFeatureVector, b: &AudioFeatureVector) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    [
        a.valence - b.valence,
        a.energy - b.energy,
        a.danceability - b.danceability,
        a.acousticness - b.acousticness,
    ]
    .iter()
    .map(|d| d * d)
    .sum::<f64>()
    .sqrt()
}

/// Confidence that a candidate matches the target, `max(0, 1 - distance)`
pub fn confidence(target: &AudioFeatureVector, candidate: &AudioFeatureVector) -> f64 {
    (1.0 - euclidean_distance(target, candidate)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::ReferenceProfile, services::context_weights::apply_weights};

    const EPSILON: f64 = 1e-9;

    fn track(valence: f64, energy: f64, danceability: f64, acousticness: f64) -> AudioFeatureVector {
        AudioFeatureVector {
            valence,
            energy,
            danceability,
            acousticness,
            instrumentalness: 0.1,
            liveness: 0.15,
            speechiness: 0.05,
            tempo: 120.0,
            loudness: -8.0,
            mode: 1,
            key: 5,
            time_signature: 4,
        }
    }

    #[test]
    fn test_self_similarity_is_one() {
        let samples = [
            track(0.8, 0.7, 0.6, 0.2),
            track(0.0, 0.0, 0.0, 0.0),
            track(1.0, 1.0, 1.0, 1.0),
            AudioFeatureVector {
                tempo: 310.0,
                loudness: -59.0,
                key: 0,
                mode: 0,
                ..track(0.1, 0.9, 0.3, 0.7)
            },
        ];

        for sample in &samples {
            assert!((similarity(sample, sample, None) - 1.0).abs() < EPSILON);
            let context = ContextWeights::new(0.9, 0.1, 0.4, 0.7, 1.2);
            assert!((similarity(sample, sample, Some(&context)) - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_self_similarity_survives_extreme_tempo() {
        let extreme = AudioFeatureVector {
            tempo: 1e160,
            loudness: 1e160,
            ..track(0.8, 0.7, 0.6, 0.2)
        };

        assert!((similarity(&extreme, &extreme, None) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_similarity_is_bounded_and_symmetric() {
        let a = track(0.9, 0.8, 0.7, 0.1);
        let b = track(0.1, 0.2, 0.3, 0.9);

        let ab = similarity(&a, &b, None);
        let ba = similarity(&b, &a, None);
        assert!((0.0..=1.0).contains(&ab));
        assert!((ab - ba).abs() < EPSILON);
        assert!(ab < 1.0);
    }

    #[test]
    fn test_closer_tracks_score_higher() {
        let target = track(0.8, 0.7, 0.6, 0.2);
        let near = track(0.75, 0.7, 0.6, 0.25);
        let far = track(0.1, 0.2, 0.1, 0.95);

        assert!(similarity(&target, &near, None) > similarity(&target, &far, None));
    }

    #[test]
    fn test_zero_norm_yields_zero() {
        let silent = AudioFeatureVector {
            loudness: -60.0,
            ..Default::default()
        };
        let other = track(0.5, 0.5, 0.5, 0.5);

        assert_eq!(similarity(&silent, &other, None), 0.0);
        assert_eq!(similarity(&silent, &silent, None), 0.0);
    }

    #[test]
    fn test_zero_context_weight_ignores_feature() {
        let a = track(0.9, 0.5, 0.5, 0.5);
        let b = track(0.1, 0.5, 0.5, 0.5);
        let ignore_valence = ContextWeights::new(0.0, 0.5, 0.5, 0.5, 1.0);

        assert!((similarity(&a, &b, Some(&ignore_valence)) - 1.0).abs() < EPSILON);
        assert!(similarity(&a, &b, None) < 1.0);
    }

    #[test]
    fn test_identical_to_weighted_target_has_full_confidence() {
        let profile = ReferenceProfile {
            features: track(0.8, 0.7, 0.6, 0.2),
            track_count: 1,
        };
        let weighted = apply_weights(&profile, &ContextWeights::new(0.7, 0.9, 0.5, 0.3, 1.1));
        let candidate = weighted.features;

        assert!((profile_similarity(&weighted, &candidate) - 1.0).abs() < EPSILON);
        assert_eq!(confidence(&weighted.features, &candidate), 1.0);
    }

    #[test]
    fn test_euclidean_distance_over_primary_features() {
        let a = track(0.0, 0.0, 0.0, 0.0);
        let b = AudioFeatureVector {
            tempo: 200.0,
            ..track(1.0, 1.0, 1.0, 1.0)
        };

        assert!((euclidean_distance(&a, &b) - 2.0).abs() < EPSILON);
        assert_eq!(confidence(&a, &b), 0.0);
    }
}

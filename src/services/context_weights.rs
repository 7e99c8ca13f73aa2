use crate::models::{
    context::{clamp_tempo_modifier, clamp_weight, NEUTRAL_WEIGHT},
    ContextWeights, ReferenceProfile, WeightedProfile,
};

/// Largest relative change a single context weight can make to a feature
const PERTURBATION_STRENGTH: f64 = 0.5;

/// Multiplicative factor for one weight, centered so 0.5 maps to 1.0
fn perturbation(weight: f64) -> f64 {
    1.0 + (clamp_weight(weight) - NEUTRAL_WEIGHT) * PERTURBATION_STRENGTH
}

fn perturb(value: f64, weight: f64) -> f64 {
    let scaled = value * perturbation(weight);
    if scaled.is_finite() {
        scaled.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Nudges the reference profile towards the listening context.
///
/// Valence, energy, danceability and acousticness are scaled by a factor in
/// [0.75, 1.25] and clamped to [0, 1]; tempo is scaled by the tempo modifier.
/// Neutral weights return the profile's features unchanged.
pub fn apply_weights(profile: &ReferenceProfile, weights: &ContextWeights) -> WeightedProfile {
    let mut features = profile.features;

    features.valence = perturb(features.valence, weights.valence);
    features.energy = perturb(features.energy, weights.energy);
    features.danceability = perturb(features.danceability, weights.danceability);
    features.acousticness = perturb(features.acousticness, weights.acousticness);
    features.tempo *= clamp_tempo_modifier(weights.tempo_modifier);

    WeightedProfile {
        features,
        weights: *weights,
    }
}

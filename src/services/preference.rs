use chrono::{DateTime, Utc};

use crate::{
    models::{AudioFeatureVector, FeedbackEvent},
    services::similarity::similarity,
};

/// Affinity for listeners without usable history
pub const NEUTRAL_AFFINITY: f64 = 0.5;

/// e-folding time of the taste decay, in days
const DECAY_DAYS: f64 = 30.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// `exp(-days_since / 30)`; events dated in the future count as fresh
pub fn time_decay(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - timestamp).num_seconds() as f64 / SECONDS_PER_DAY;
    (-days.max(0.0) / DECAY_DAYS).exp()
}

/// Listener affinity for a candidate, derived only from that listener's history.
///
/// Each upvoted event contributes its similarity to the candidate, weighted by
/// signal strength and recency. Downvotes and skips are ignored, so a history
/// without upvotes stays at the neutral 0.5.
pub fn score(candidate: &AudioFeatureVector, history: &[FeedbackEvent], now: DateTime<Utc>) -> f64 {
    if history.is_empty() {
        return NEUTRAL_AFFINITY;
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for event in history.iter().filter(|e| e.signal.is_positive()) {
        let weight = f64::from(event.signal.score()) * time_decay(event.timestamp, now);
        weighted_sum += similarity(&event.features, candidate, None) * weight;
        total_weight += weight;
    }

    if total_weight <= 0.0 || !total_weight.is_finite() {
        return NEUTRAL_AFFINITY;
    }

    (weighted_sum / total_weight).clamp(0.0, 1.0)
}

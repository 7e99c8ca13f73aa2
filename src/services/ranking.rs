use chrono::{DateTime, Utc};

use crate::{
    models::{Candidate, FeedbackEvent, ScoredCandidate, WeightedProfile},
    services::{preference, similarity},
};

/// Share of the blended score given to fit with the reference/context target
pub const SIMILARITY_SHARE: f64 = 0.7;
/// Share of the blended score given to the listener's own history
pub const AFFINITY_SHARE: f64 = 0.3;

pub fn blend(similarity: f64, personal_affinity: f64) -> f64 {
    SIMILARITY_SHARE * similarity + AFFINITY_SHARE * personal_affinity
}

/// Scores every candidate against the target and the listener's history.
///
/// Output is sorted by blended score, highest first. The sort is stable, so
/// equal scores keep their input order.
pub fn rank(
    candidates: Vec<Candidate>,
    target: &WeightedProfile,
    history: &[FeedbackEvent],
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let similarity = similarity::profile_similarity(target, &candidate.features);
            let personal_affinity = preference::score(&candidate.features, history, now);
            let confidence = similarity::confidence(&target.features, &candidate.features);

            ScoredCandidate {
                blended_score: blend(similarity, personal_affinity),
                similarity,
                personal_affinity,
                confidence,
                candidate,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.blended_score.total_cmp(&a.blended_score));

    if let Some(top) = scored.first() {
        tracing::debug!(
            ranked = scored.len(),
            top_track = %top.candidate.track_id,
            top_score = top.blended_score,
            "Ranked candidates"
        );
    }

    scored
}

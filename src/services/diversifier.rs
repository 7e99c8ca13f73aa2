use std::collections::HashSet;

use crate::{models::ScoredCandidate, services::similarity::similarity};

/// Above this unweighted similarity a candidate counts as a near-duplicate
pub const MAX_PAIRWISE_SIMILARITY: f64 = 0.85;

/// Picks up to `limit` candidates from a ranked list, preferring variety.
///
/// The first pass walks the ranking and skips a candidate when its artist is
/// already in the list while fewer than `limit / 2` distinct artists are, or
/// when it sounds too close to something already picked. If that leaves open
/// slots, a second pass fills them in ranking order, skipping only tracks
/// already selected. The result always holds `min(limit, distinct tracks)`
/// entries.
pub fn diversify(ranked: &[ScoredCandidate], limit: usize) -> Vec<ScoredCandidate> {
    let mut selected: Vec<ScoredCandidate> = Vec::with_capacity(limit.min(ranked.len()));
    let mut artists: HashSet<&str> = HashSet::new();
    let artist_quota = limit as f64 / 2.0;

    for scored in ranked {
        if selected.len() >= limit {
            break;
        }

        let artist = scored.candidate.artist.as_str();
        if artists.contains(artist) && (artists.len() as f64) < artist_quota {
            continue;
        }

        let too_close = selected.iter().any(|chosen| {
            similarity(&chosen.candidate.features, &scored.candidate.features, None)
                > MAX_PAIRWISE_SIMILARITY
        });
        if too_close {
            continue;
        }

        artists.insert(artist);
        selected.push(scored.clone());
    }

    let first_pass = selected.len();

    if selected.len() < limit {
        for scored in ranked {
            if selected.len() >= limit {
                break;
            }
            let duplicate = selected
                .iter()
                .any(|chosen| chosen.candidate.track_id == scored.candidate.track_id);
            if !duplicate {
                selected.push(scored.clone());
            }
        }
    }

    tracing::debug!(
        pool = ranked.len(),
        limit,
        diverse = first_pass,
        backfilled = selected.len() - first_pass,
        "Diversified recommendations"
    );

    selected
}

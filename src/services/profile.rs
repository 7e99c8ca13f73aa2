use crate::{
    error::{AppError, AppResult},
    models::{AudioFeatureVector, ReferenceProfile},
};

pub const MAX_REFERENCE_TRACKS: usize = 5;

const DEFAULT_MODE: i32 = 1;
const DEFAULT_KEY: i32 = 0;
const DEFAULT_TIME_SIGNATURE: i32 = 4;

/// Builds the centroid profile of the reference tracks.
///
/// Continuous fields take the arithmetic mean. Mode, key and time signature
/// take the most frequent in-domain value, ties going to the value seen first.
pub fn build(vectors: &[AudioFeatureVector]) -> AppResult<ReferenceProfile> {
    if vectors.is_empty() {
        return Err(AppError::InsufficientInput(
            "At least one reference track is required".to_string(),
        ));
    }

    let n = vectors.len() as f64;
    let mean = |field: fn(&AudioFeatureVector) -> f64| -> f64 {
        vectors.iter().map(field).sum::<f64>() / n
    };

    let features = AudioFeatureVector {
        valence: mean(|v| v.valence),
        energy: mean(|v| v.energy),
        danceability: mean(|v| v.danceability),
        acousticness: mean(|v| v.acousticness),
        instrumentalness: mean(|v| v.instrumentalness),
        liveness: mean(|v| v.liveness),
        speechiness: mean(|v| v.speechiness),
        tempo: mean(|v| v.tempo),
        loudness: mean(|v| v.loudness),
        mode: statistical_mode(
            vectors
                .iter()
                .map(|v| v.mode)
                .filter(|m| AudioFeatureVector::is_valid_mode(*m)),
        )
        .unwrap_or(DEFAULT_MODE),
        key: statistical_mode(
            vectors
                .iter()
                .map(|v| v.key)
                .filter(|k| AudioFeatureVector::is_valid_key(*k)),
        )
        .unwrap_or(DEFAULT_KEY),
        time_signature: statistical_mode(
            vectors
                .iter()
                .map(|v| v.time_signature)
                .filter(|t| AudioFeatureVector::is_valid_time_signature(*t)),
        )
        .unwrap_or(DEFAULT_TIME_SIGNATURE),
    };

    tracing::debug!(
        track_count = vectors.len(),
        valence = features.valence,
        energy = features.energy,
        tempo = features.tempo,
        "Built reference profile"
    );

    Ok(ReferenceProfile {
        features,
        track_count: vectors.len(),
    })
}

/// Most frequent value; ties resolve to the earliest first occurrence
fn statistical_mode(values: impl Iterator<Item = i32>) -> Option<i32> {
    let mut counts: Vec<(i32, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    // max_by_key keeps the last maximum, so scan manually to keep the first
    let mut best: Option<(i32, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

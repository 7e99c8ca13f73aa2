use serde::{Deserialize, Serialize};

/// The 12-dimensional audio descriptor of one track, as reported by the catalog.
///
/// Values are stored exactly as received. Bounded fields are clamped and
/// unbounded ones (tempo, loudness, key) normalized only at comparison time,
/// see [`crate::services::normalizer`]. Missing fields default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFeatureVector {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    /// Beats per minute
    pub tempo: f64,
    /// Decibels, typically in [-60, 0]
    pub loudness: f64,
    /// 1 = major, 0 = minor
    pub mode: i32,
    /// Pitch class, 0 (C) through 11 (B)
    pub key: i32,
    #[serde(alias = "timeSignature")]
    pub time_signature: i32,
}

impl AudioFeatureVector {
    pub fn is_valid_mode(mode: i32) -> bool {
        mode == 0 || mode == 1
    }

    pub fn is_valid_key(key: i32) -> bool {
        (0..=11).contains(&key)
    }

    pub fn is_valid_time_signature(time_signature: i32) -> bool {
        (3..=7).contains(&time_signature)
    }
}

/// Audio features keyed by the track they belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatures {
    pub track_id: String,
    pub features: AudioFeatureVector,
}

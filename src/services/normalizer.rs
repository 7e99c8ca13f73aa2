use crate::models::AudioFeatureVector;

/// Tempo that maps to 1.0
const TEMPO_SCALE: f64 = 200.0;
/// Quietest loudness considered, in dB
const LOUDNESS_FLOOR_DB: f64 = -60.0;
const MAX_KEY: f64 = 11.0;
/// Ceiling for the open-ended scaled fields, so squared norms stay finite
const MAX_SCALED: f64 = 10.0;

/// Audio features mapped into a unit-interval space for distance math
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFeatures {
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

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn unit(value: f64) -> f64 {
    finite_or_zero(value).clamp(0.0, 1.0)
}

/// Maps a raw descriptor bundle into normalized space.
///
/// Bounded fields are clamped to [0, 1]; tempo divides by 200, loudness maps
/// through `(db + 60) / 60` and key divides by 11; both are capped at 10.
/// Non-finite inputs count as 0.
pub fn normalize(features: &AudioFeatureVector) -> NormalizedFeatures {
    NormalizedFeatures {
        valence: unit(features.valence),
        energy: unit(features.energy),
        danceability: unit(features.danceability),
        acousticness: unit(features.acousticness),
        instrumentalness: unit(features.instrumentalness),
        liveness: unit(features.liveness),
        speechiness: unit(features.speechiness),
        tempo: (finite_or_zero(features.tempo) / TEMPO_SCALE).clamp(0.0, MAX_SCALED),
        loudness: ((finite_or_zero(features.loudness) - LOUDNESS_FLOOR_DB) / -LOUDNESS_FLOOR_DB)
            .clamp(0.0, MAX_SCALED),
        mode: f64::from(features.mode).clamp(0.0, 1.0),
        key: (f64::from(features.key) / MAX_KEY).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_fields_pass_through() {
        let features = AudioFeatureVector {
            valence: 0.8,
            energy: 0.7,
            danceability: 0.6,
            acousticness: 0.2,
            instrumentalness: 0.1,
            liveness: 0.3,
            speechiness: 0.05,
            ..Default::default()
        };

        let normalized = normalize(&features);
        assert_eq!(normalized.valence, 0.8);
        assert_eq!(normalized.energy, 0.7);
        assert_eq!(normalized.danceability, 0.6);
        assert_eq!(normalized.acousticness, 0.2);
        assert_eq!(normalized.speechiness, 0.05);
    }

    #[test]
    fn test_unbounded_fields_are_scaled() {
        let features = AudioFeatureVector {
            tempo: 128.0,
            loudness: -6.0,
            key: 11,
            mode: 1,
            ..Default::default()
        };

        let normalized = normalize(&features);
        assert!((normalized.tempo - 0.64).abs() < 1e-12);
        assert!((normalized.loudness - 0.9).abs() < 1e-12);
        assert_eq!(normalized.key, 1.0);
        assert_eq!(normalized.mode, 1.0);
    }

    #[test]
    fn test_out_of_domain_values_are_clamped() {
        let features = AudioFeatureVector {
            valence: 1.4,
            energy: -0.3,
            loudness: -80.0,
            tempo: -10.0,
            key: -1,
            ..Default::default()
        };

        let normalized = normalize(&features);
        assert_eq!(normalized.valence, 1.0);
        assert_eq!(normalized.energy, 0.0);
        assert_eq!(normalized.loudness, 0.0);
        assert_eq!(normalized.tempo, 0.0);
        assert_eq!(normalized.key, 0.0);
    }

    #[test]
    fn test_non_finite_values_become_zero() {
        let features = AudioFeatureVector {
            valence: f64::NAN,
            tempo: f64::INFINITY,
            ..Default::default()
        };

        let normalized = normalize(&features);
        assert_eq!(normalized.valence, 0.0);
        assert_eq!(normalized.tempo, 0.0);
    }

    #[test]
    fn test_huge_finite_values_are_capped() {
        let features = AudioFeatureVector {
            tempo: 1e160,
            loudness: 1e200,
            ..Default::default()
        };

        let normalized = normalize(&features);
        assert_eq!(normalized.tempo, MAX_SCALED);
        assert_eq!(normalized.loudness, MAX_SCALED);
    }
}

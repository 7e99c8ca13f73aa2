use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NEUTRAL_WEIGHT: f64 = 0.5;
pub const NEUTRAL_TEMPO_MODIFIER: f64 = 1.0;
pub const MIN_TEMPO_MODIFIER: f64 = 0.5;
pub const MAX_TEMPO_MODIFIER: f64 = 2.0;

/// Situational weights produced by the context interpreter for one request.
///
/// Every field is clamped on construction and on deserialization; malformed or
/// missing fields fall back to neutral (0.5, tempo modifier 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawContextWeights")]
pub struct ContextWeights {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub tempo_modifier: f64,
}

impl Default for ContextWeights {
    fn default() -> Self {
        Self::neutral()
    }
}

impl ContextWeights {
    pub fn new(
        valence: f64,
        energy: f64,
        danceability: f64,
        acousticness: f64,
        tempo_modifier: f64,
    ) -> Self {
        Self {
            valence: clamp_weight(valence),
            energy: clamp_weight(energy),
            danceability: clamp_weight(danceability),
            acousticness: clamp_weight(acousticness),
            tempo_modifier: clamp_tempo_modifier(tempo_modifier),
        }
    }

    /// Weights that leave a reference profile untouched
    pub fn neutral() -> Self {
        Self {
            valence: NEUTRAL_WEIGHT,
            energy: NEUTRAL_WEIGHT,
            danceability: NEUTRAL_WEIGHT,
            acousticness: NEUTRAL_WEIGHT,
            tempo_modifier: NEUTRAL_TEMPO_MODIFIER,
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

pub(crate) fn clamp_weight(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        NEUTRAL_WEIGHT
    }
}

pub(crate) fn clamp_tempo_modifier(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_TEMPO_MODIFIER, MAX_TEMPO_MODIFIER)
    } else {
        NEUTRAL_TEMPO_MODIFIER
    }
}

/// Wire shape accepted from the interpreter and from cache.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawContextWeights {
    valence: Option<Value>,
    energy: Option<Value>,
    danceability: Option<Value>,
    acousticness: Option<Value>,
    #[serde(alias = "tempoModifier")]
    tempo_modifier: Option<Value>,
}

/// Reads a number out of a loosely typed JSON value, accepting numeric strings
fn lenient_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

impl From<RawContextWeights> for ContextWeights {
    fn from(raw: RawContextWeights) -> Self {
        let weight = |v: &Option<Value>| {
            lenient_number(v.as_ref())
                .map(clamp_weight)
                .unwrap_or(NEUTRAL_WEIGHT)
        };

        Self {
            valence: weight(&raw.valence),
            energy: weight(&raw.energy),
            danceability: weight(&raw.danceability),
            acousticness: weight(&raw.acousticness),
            tempo_modifier: lenient_number(raw.tempo_modifier.as_ref())
                .map(clamp_tempo_modifier)
                .unwrap_or(NEUTRAL_TEMPO_MODIFIER),
        }
    }
}

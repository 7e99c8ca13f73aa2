use crate::models::{context::clamp_weight, ContextWeights, FeedbackEvent};

pub const DEFAULT_LEARNING_RATE: f64 = 0.3;

/// Moves freshly interpreted weights towards those that worked before.
///
/// Valence, energy and danceability are linearly interpolated,
/// `base + (past - base) * rate`. Acousticness and the tempo modifier are
/// passed through from `base` untouched. Without a past match `base` is
/// returned as is.
pub fn adjust(
    base: ContextWeights,
    past_similar_context: Option<&ContextWeights>,
    learning_rate: f64,
) -> ContextWeights {
    let Some(past) = past_similar_context else {
        return base;
    };

    let rate = if learning_rate.is_finite() {
        learning_rate.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let lerp = |from: f64, to: f64| clamp_weight(from + (to - from) * rate);

    ContextWeights {
        valence: lerp(base.valence, past.valence),
        energy: lerp(base.energy, past.energy),
        danceability: lerp(base.danceability, past.danceability),
        acousticness: base.acousticness,
        tempo_modifier: base.tempo_modifier,
    }
}

/// Key under which similar listening situations are matched.
///
/// Lower-cased with whitespace runs collapsed, so "Late  Night Coding" and
/// "late night coding" share learned weights.
pub fn context_key(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether an event shows the listener engaged with what was recommended.
///
/// Upvotes always count; a skip counts once it was listened to for at least
/// `min_listen_seconds`. Downvotes never count.
pub fn is_engaged(event: &FeedbackEvent, min_listen_seconds: f64) -> bool {
    match event.signal.score() {
        s if s > 0 => true,
        0 => event.listen_seconds >= min_listen_seconds,
        _ => false,
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AudioFeatureVector;

/// A listener's reaction to a recommended track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackSignal {
    Downvote,
    Skip,
    Upvote,
}

impl FeedbackSignal {
    /// Signed score: -1 downvote, 0 skip, 1 upvote
    pub fn score(self) -> i16 {
        match self {
            FeedbackSignal::Downvote => -1,
            FeedbackSignal::Skip => 0,
            FeedbackSignal::Upvote => 1,
        }
    }

    pub fn from_score(score: i16) -> Option<Self> {
        match score {
            -1 => Some(FeedbackSignal::Downvote),
            0 => Some(FeedbackSignal::Skip),
            1 => Some(FeedbackSignal::Upvote),
            _ => None,
        }
    }

    pub fn is_positive(self) -> bool {
        self.score() > 0
    }
}

/// One entry of a listener's append-only feedback history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub track_id: String,
    /// Features of the track at the time feedback was given
    pub features: AudioFeatureVector,
    pub signal: FeedbackSignal,
    pub listen_seconds: f64,
    pub timestamp: DateTime<Utc>,
}

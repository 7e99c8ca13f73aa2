//! Recommendation core plus the pipelines that feed it.
//!
//! The scoring modules are pure functions over typed data; `recommendations`
//! and `feedback` do the I/O around them.

pub mod context_weights;
pub mod diversifier;
pub mod feedback;
pub mod feedback_learner;
pub mod normalizer;
pub mod preference;
pub mod profile;
pub mod providers;
pub mod ranking;
pub mod recommendations;
pub mod similarity;

pub use recommendations::{generate_recommendations, PipelineSettings, RecommendationOutcome};

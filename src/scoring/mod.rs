//! Deterministic activity scoring from daily weather and terrain
//!
//! Everything in this module is pure computation: classification and scoring
//! perform no I/O and hold no state, so the same inputs always produce the
//! same scores, labels, and reasoning strings.

pub mod conditions;
pub mod engine;
pub mod geography;

pub use conditions::{ConditionCategory, FOG_CODE, categorize, description};
pub use engine::{
    Activity, ActivityRecommendation, ActivityScores, RecommendationLevel, recommendations, score,
};
pub use geography::{
    COASTAL_MAX_ELEVATION_M, GeographyClass, MOUNTAINOUS_MIN_ELEVATION_M, classify,
};

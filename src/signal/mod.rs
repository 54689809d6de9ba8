//! Signal scoring
//!
//! Turns one cross-section of market conditions into a confidence score
//! and an advisory recommendation.

mod scorer;
mod types;

pub use scorer::{ConfidenceScorer, ScorerConfig, EXTREME_SCORE, MAX_SCORE, MODERATE_SCORE};
pub use types::{
    ConfidenceScore, Direction, Factor, FactorScore, Gate, Recommendation, ScoreInputs, Strength,
};

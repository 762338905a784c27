//! Scoring engine.
//!
//! - [`ScoreEngine`]: round state and scoring rules
//! - [`fill_standings`]: ranking with shared ranks for ties
//! - [`RoundResults`]: the record handed back after each round

mod config;
mod engine;
mod results;
mod standings;

pub use config::{ScoringConfig, ScoringConfigBuilder};
pub use engine::{QuestionType, ScoreEngine, SpeedResult};
pub use results::{
    RoundResults, TeamResult, answer_code, format_long_points, format_points, sanitize_name,
};
pub use standings::fill_standings;

//! Scoring configuration.

use serde::{Deserialize, Serialize};

use crate::core::ScoreError;
use crate::core::constants::DEFAULT_QUIZ_OUT_COUNT;

/// Rules for one quiz session.
///
/// Speed tables are indexed by `placing - 1`. Missing entries score zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Fraction earned for a correct speed answer, by placing.
    pub speed_correct: Vec<f64>,

    /// Fraction earned for an incorrect speed answer, by placing.
    pub speed_incorrect: Vec<f64>,

    /// Correct speed answers needed to quiz out.
    pub quiz_out_count: u32,

    /// Points awarded for quizzing out.
    pub quiz_out_bonus_points: u32,

    /// Point values the operator can pick for multiple-choice questions.
    pub multiple_choice_points: Vec<u32>,

    /// Point values the operator can pick for speed questions.
    pub speed_points: Vec<u32>,

    /// Question number the session starts at.
    pub starting_question_number: u32,

    /// Question number from which the announcement is shown.
    pub announce_at: u32,

    /// Announcement text.
    pub announcement: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            speed_correct: Vec::new(),
            speed_incorrect: Vec::new(),
            quiz_out_count: DEFAULT_QUIZ_OUT_COUNT,
            quiz_out_bonus_points: 0,
            multiple_choice_points: Vec::new(),
            speed_points: Vec::new(),
            starting_question_number: 0,
            announce_at: 0,
            announcement: String::new(),
        }
    }
}

impl ScoringConfig {
    /// Create a builder with default values.
    pub fn builder() -> ScoringConfigBuilder {
        ScoringConfigBuilder::new()
    }

    /// Correct-answer fraction for a 1-based placing.
    pub fn speed_correct_at(&self, placing: u32) -> f64 {
        lookup(&self.speed_correct, placing)
    }

    /// Incorrect-answer fraction for a 1-based placing.
    pub fn speed_incorrect_at(&self, placing: u32) -> f64 {
        lookup(&self.speed_incorrect, placing)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.quiz_out_count == 0 {
            return Err(ScoreError::InvalidConfig(
                "quiz_out_count must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = self
            .speed_correct
            .iter()
            .chain(&self.speed_incorrect)
            .find(|v| !v.is_finite())
        {
            return Err(ScoreError::InvalidConfig(format!(
                "speed table entry {bad} is not finite"
            )));
        }

        if self.speed_correct.is_empty() {
            tracing::warn!("speed_correct table is empty, correct speed answers score zero");
        }
        if self.speed_incorrect.iter().any(|v| *v > 0.0) {
            tracing::warn!(
                table = ?self.speed_incorrect,
                "speed_incorrect table rewards incorrect answers"
            );
        }

        Ok(())
    }
}

fn lookup(table: &[f64], placing: u32) -> f64 {
    placing
        .checked_sub(1)
        .and_then(|i| table.get(i as usize))
        .copied()
        .unwrap_or(0.0)
}

/// Builder for [`ScoringConfig`].
#[derive(Debug, Default)]
pub struct ScoringConfigBuilder {
    config: ScoringConfig,
}

impl ScoringConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the correct-answer speed table.
    pub fn speed_correct(mut self, table: impl Into<Vec<f64>>) -> Self {
        self.config.speed_correct = table.into();
        self
    }

    /// Set the incorrect-answer speed table.
    pub fn speed_incorrect(mut self, table: impl Into<Vec<f64>>) -> Self {
        self.config.speed_incorrect = table.into();
        self
    }

    /// Set the quiz-out threshold.
    pub fn quiz_out_count(mut self, count: u32) -> Self {
        self.config.quiz_out_count = count;
        self
    }

    /// Set the quiz-out bonus.
    pub fn quiz_out_bonus_points(mut self, points: u32) -> Self {
        self.config.quiz_out_bonus_points = points;
        self
    }

    /// Set the multiple-choice point presets.
    pub fn multiple_choice_points(mut self, presets: impl Into<Vec<u32>>) -> Self {
        self.config.multiple_choice_points = presets.into();
        self
    }

    /// Set the speed point presets.
    pub fn speed_points(mut self, presets: impl Into<Vec<u32>>) -> Self {
        self.config.speed_points = presets.into();
        self
    }

    /// Set the starting question number.
    pub fn starting_question_number(mut self, number: u32) -> Self {
        self.config.starting_question_number = number;
        self
    }

    /// Show `text` from question `at` onwards.
    pub fn announcement(mut self, at: u32, text: impl Into<String>) -> Self {
        self.config.announce_at = at;
        self.config.announcement = text.into();
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<ScoringConfig, ScoreError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! Round scoring state machine.

use serde::{Deserialize, Serialize};

use crate::core::{BoxAddress, RegistryError, ScoreError};
use crate::protocol::Button;
use crate::registry::{AddressRegistry, Team};

use super::config::ScoringConfig;
use super::results::{RoundResults, TeamResult};
use super::standings::fill_standings;

/// Kind of question being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestionType {
    /// No question selected.
    #[default]
    None,
    /// Every team answers A, B or C.
    MultipleChoice,
    /// First to buzz answers aloud.
    Speed,
}

impl QuestionType {
    /// Short code used in records: `None`, `MC` or `SP`.
    pub fn code(self) -> &'static str {
        match self {
            QuestionType::None => "None",
            QuestionType::MultipleChoice => "MC",
            QuestionType::Speed => "SP",
        }
    }
}

/// Operator judgement of a spoken speed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedResult {
    /// Not judged.
    #[default]
    None,
    /// Judged correct.
    Correct,
    /// Judged incorrect.
    Incorrect,
}

/// Turns button events and operator judgements into per-team scores.
///
/// The engine holds only round state. Teams and boxes live in the
/// [`AddressRegistry`] passed to each call.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    config: ScoringConfig,
    question_number: u32,
    question_type: QuestionType,
    answer: Button,
    points: u32,
    /// Highest placing allowed to answer next in a speed round.
    working_place: u32,
}

impl ScoreEngine {
    /// Create an engine at the configured starting question.
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            question_number: config.starting_question_number,
            config,
            question_type: QuestionType::None,
            answer: Button::None,
            points: 0,
            working_place: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    // =========================================================================
    // Round settings
    // =========================================================================

    /// Current question number.
    pub fn question_number(&self) -> u32 {
        self.question_number
    }

    /// Jump to a question number.
    pub fn set_question_number(&mut self, number: u32) {
        self.question_number = number;
        tracing::info!(question = number, "question number set");
    }

    /// Step the question number forward without touching round state.
    pub fn advance_question_number(&mut self) {
        self.question_number = self.question_number.saturating_add(1);
    }

    /// Step the question number back without touching round state.
    pub fn backup_question_number(&mut self) {
        self.question_number = self.question_number.saturating_sub(1);
    }

    /// Start the next question: clear round results, advance the number,
    /// and reset type, answer and points.
    pub fn next_question_number(&mut self, registry: &mut AddressRegistry) {
        self.reset_results(registry);
        self.set_question_number(self.question_number.saturating_add(1));
        self.question_type = QuestionType::None;
        self.answer = Button::None;
        self.points = 0;
    }

    /// Current question type.
    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    /// Set the question type without changing points.
    pub fn set_question_type(&mut self, question_type: QuestionType) {
        self.question_type = question_type;
        tracing::debug!(question_type = question_type.code(), "question type set");
    }

    /// Set the type and take points from whichever value matches it.
    pub fn set_question_type_with_points(
        &mut self,
        question_type: QuestionType,
        mc_points: u32,
        speed_points: u32,
    ) {
        self.set_question_type(question_type);
        match question_type {
            QuestionType::MultipleChoice => self.set_points(mc_points),
            QuestionType::Speed => self.set_points(speed_points),
            QuestionType::None => {}
        }
    }

    /// Set the type and take points from the configured preset list.
    pub fn select_question_type(
        &mut self,
        question_type: QuestionType,
        preset: usize,
    ) -> Result<(), ScoreError> {
        let presets = match question_type {
            QuestionType::MultipleChoice => &self.config.multiple_choice_points,
            QuestionType::Speed => &self.config.speed_points,
            QuestionType::None => {
                self.set_question_type(question_type);
                return Ok(());
            }
        };
        let points = *presets.get(preset).ok_or(ScoreError::UnknownPreset(preset))?;
        self.set_question_type(question_type);
        self.set_points(points);
        Ok(())
    }

    /// Correct answer for multiple choice.
    pub fn answer(&self) -> Button {
        self.answer
    }

    /// Set the correct answer.
    pub fn set_answer(&mut self, answer: Button) {
        self.answer = answer;
        tracing::debug!(answer = answer.label(), "answer set");
    }

    /// Point value of the question.
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Set the point value.
    pub fn set_points(&mut self, points: u32) {
        self.points = points;
        tracing::debug!(points, "points set");
    }

    /// Placing threshold for the next speed answer.
    pub fn working_place(&self) -> u32 {
        self.working_place
    }

    /// Announcement text, once the configured question is reached.
    pub fn announcement(&self) -> &str {
        if self.question_number >= self.config.announce_at {
            &self.config.announcement
        } else {
            ""
        }
    }

    // =========================================================================
    // Round lifecycle
    // =========================================================================

    /// Zero placings and clear every team's inputs and points.
    pub fn reset_results(&mut self, registry: &mut AddressRegistry) {
        registry.reset_placing();
        self.working_place = 1;
        self.clear_current_results(registry);
    }

    /// Clear every box's inputs and every team's fractions.
    pub fn clear_current_results(&self, registry: &mut AddressRegistry) {
        registry.clear_states();
        self.clear_all_points(registry);
    }

    /// Zero every team's fractions, keeping inputs.
    pub fn clear_all_points(&self, registry: &mut AddressRegistry) {
        for team in registry.teams_mut() {
            team.clear_current_points();
        }
    }

    /// Zero every team's total and speed count, and clear the round.
    pub fn clear_totals(&self, registry: &mut AddressRegistry) {
        for team in registry.teams_mut() {
            team.clear_totals();
        }
        self.clear_current_results(registry);
    }

    /// True if any team has a button selected.
    pub fn has_answers(&self, registry: &AddressRegistry) -> bool {
        registry.teams().iter().any(|t| {
            registry
                .box_state(t.address())
                .is_some_and(|b| b.button().is_pressed())
        })
    }

    /// Score one team for the current round.
    ///
    /// Multiple choice earns a full fraction for the correct, non-empty
    /// answer. In a speed round the judgement moves the working place, looks
    /// up the fraction by placing, and awards the quiz-out bonus on the
    /// answer that reaches the threshold. A correct first place wipes every
    /// other team's fractions.
    pub fn update_current_points(
        &mut self,
        registry: &mut AddressRegistry,
        address: &BoxAddress,
        result: SpeedResult,
    ) -> Result<(), ScoreError> {
        let correct_count = registry.require_team(address)?.correct_speed_count();

        let (normal, bonus) = match self.question_type {
            QuestionType::MultipleChoice => {
                let given = current_answer(registry, address);
                let normal = if given == self.answer && given.is_pressed() {
                    1.0
                } else {
                    0.0
                };
                (normal, 0.0)
            }
            QuestionType::Speed => {
                match result {
                    SpeedResult::Correct => self.working_place = registry.update_place(address),
                    SpeedResult::Incorrect => {
                        self.working_place = registry.update_place(address) + 1
                    }
                    SpeedResult::None => {}
                }
                let placing = current_placing(registry, address);

                if placing == 1 && result == SpeedResult::Correct {
                    for team in registry.teams_mut() {
                        team.clear_current_points();
                    }
                }

                match result {
                    SpeedResult::Correct => {
                        let bonus = if self.quiz_out_reached(correct_count, 1) {
                            1.0
                        } else {
                            0.0
                        };
                        (self.config.speed_correct_at(placing), bonus)
                    }
                    SpeedResult::Incorrect => (self.config.speed_incorrect_at(placing), 0.0),
                    SpeedResult::None => (0.0, 0.0),
                }
            }
            QuestionType::None => (0.0, 0.0),
        };

        let team = registry
            .team_mut(address)
            .ok_or_else(|| RegistryError::UnknownAddress(address.to_string()))?;
        team.set_normal_fraction(normal);
        team.set_bonus_fraction(bonus);
        tracing::debug!(
            address = %address,
            normal,
            bonus,
            ?result,
            "current points updated"
        );
        Ok(())
    }

    /// Recompute every team's multiple-choice fraction. No-op otherwise.
    pub fn update_scores_only_if_mult_choice(&mut self, registry: &mut AddressRegistry) {
        if self.question_type != QuestionType::MultipleChoice {
            return;
        }
        let addresses: Vec<BoxAddress> =
            registry.teams().iter().map(|t| t.address().clone()).collect();
        for address in addresses {
            if let Err(err) = self.update_current_points(registry, &address, SpeedResult::None) {
                tracing::debug!(address = %address, error = %err, "multiple choice rescore skipped");
            }
        }
    }

    /// True if `count + adjust` is exactly the quiz-out threshold.
    pub fn is_quiz_out_basic(&self, team: &Team, adjust: u32) -> bool {
        self.quiz_out_reached(team.correct_speed_count(), adjust)
    }

    fn quiz_out_reached(&self, count: u32, adjust: u32) -> bool {
        count.checked_add(adjust) == Some(self.config.quiz_out_count)
    }

    /// True in a speed round when the team has a positive score and hits
    /// the threshold exactly after `adjust`.
    pub fn is_quiz_out(&self, registry: &AddressRegistry, address: &BoxAddress, adjust: u32) -> bool {
        if self.question_type != QuestionType::Speed {
            return false;
        }
        registry
            .team(address)
            .is_some_and(|t| t.current_points() > 0.0 && self.is_quiz_out_basic(t, adjust))
    }

    /// Add the round to every team's total.
    ///
    /// A positive normal fraction in a speed round also counts toward
    /// quizzing out.
    pub fn update_totals(&self, registry: &mut AddressRegistry) {
        let points = f64::from(self.points);
        let bonus = f64::from(self.config.quiz_out_bonus_points);
        for team in registry.teams_mut() {
            if self.question_type == QuestionType::Speed && team.normal_fraction() > 0.0 {
                team.increment_correct_speed_count();
            }
            team.increment_total_points(points, bonus);
        }
    }

    /// Apply the round to totals, rank the teams and return the record.
    ///
    /// Calling this twice for the same round adds the round twice.
    pub fn record_results(&self, registry: &mut AddressRegistry) -> RoundResults {
        let summary = registry.results_summary();
        tracing::info!(results = %summary, "recording results");

        self.update_totals(registry);
        fill_standings(registry.teams_mut());

        let teams = registry
            .entries_mut()
            .map(|(team, state)| {
                let normal_points = self.real_normal_points(team);
                let bonus_points = self.real_bonus_points(team);
                let sum = normal_points + bonus_points;
                TeamResult {
                    box_number: team.box_number(),
                    address: team.address().to_short_string(),
                    name: team.name().to_string(),
                    correct_speed_count: team.correct_speed_count(),
                    answer: state.map(|s| s.button()).unwrap_or_default(),
                    placing: state.map_or(0, |s| s.placing()),
                    normal_points,
                    bonus_points,
                    sum,
                    previous_total: team.total() - sum,
                    total: team.total(),
                    standing: team.standing(),
                }
            })
            .collect();

        let results = RoundResults {
            question_number: self.question_number,
            question_type: self.question_type,
            answer: self.answer,
            points: self.points,
            teams,
        };

        tracing::info!("{}", results.summary_line());
        for line in results.result_lines() {
            tracing::info!("{}", line);
        }
        results
    }

    /// Points earned from the answer this round.
    pub fn real_normal_points(&self, team: &Team) -> f64 {
        team.normal_fraction() * f64::from(self.points)
    }

    /// Bonus points earned this round.
    pub fn real_bonus_points(&self, team: &Team) -> f64 {
        team.bonus_fraction() * f64::from(self.config.quiz_out_bonus_points)
    }

    // =========================================================================
    // Speed-round queries
    // =========================================================================

    /// Speed round and the box placed first or second.
    pub fn is_basic_speed_place(&self, registry: &AddressRegistry, address: &BoxAddress) -> bool {
        let p = current_placing(registry, address);
        self.question_type == QuestionType::Speed && p != 0 && p < 3
    }

    /// Basic speed place, and not beyond the working place.
    pub fn is_valid_speed_place(&self, registry: &AddressRegistry, address: &BoxAddress) -> bool {
        self.is_basic_speed_place(registry, address)
            && self.working_place >= current_placing(registry, address)
    }

    /// First place, or a valid speed place.
    pub fn is_enabled_speed_place(&self, registry: &AddressRegistry, address: &BoxAddress) -> bool {
        current_placing(registry, address) == 1 || self.is_valid_speed_place(registry, address)
    }

    /// The box's answer equals the correct answer.
    pub fn is_correct_multiple_choice(&self, registry: &AddressRegistry, address: &BoxAddress) -> bool {
        current_answer(registry, address) == self.answer
    }

    /// The team has a positive score this round.
    pub fn is_correct_speed(&self, registry: &AddressRegistry, address: &BoxAddress) -> bool {
        registry.team(address).is_some_and(|t| t.current_points() > 0.0)
    }

    /// The team has a negative score this round.
    pub fn is_incorrect_speed(&self, registry: &AddressRegistry, address: &BoxAddress) -> bool {
        registry.team(address).is_some_and(|t| t.current_points() < 0.0)
    }
}

fn current_answer(registry: &AddressRegistry, address: &BoxAddress) -> Button {
    registry
        .box_state(address)
        .map(|b| b.button())
        .unwrap_or_default()
}

fn current_placing(registry: &AddressRegistry, address: &BoxAddress) -> u32 {
    registry.box_state(address).map_or(0, |b| b.placing())
}

//! Persistent per-team scoring state.

use crate::core::BoxAddress;

/// A team bound to one box for the whole session.
#[derive(Debug, Clone)]
pub struct Team {
    address: BoxAddress,
    box_number: u32,
    name: String,
    total: f64,
    normal_fraction: f64,
    bonus_fraction: f64,
    correct_speed_count: u32,
    standing: u32,
}

impl Team {
    /// Create a team with zero totals.
    pub fn new(address: BoxAddress, box_number: u32, name: impl Into<String>) -> Self {
        Self {
            address,
            box_number,
            name: name.into(),
            total: 0.0,
            normal_fraction: 0.0,
            bonus_fraction: 0.0,
            correct_speed_count: 0,
            standing: 0,
        }
    }

    /// Reset to the given carried-over total and speed count.
    pub fn init_values(&mut self, total: f64, correct_speed_count: u32) {
        self.total = total;
        self.correct_speed_count = correct_speed_count;
        self.normal_fraction = 0.0;
        self.bonus_fraction = 0.0;
        self.standing = 0;
    }

    /// Box address.
    pub fn address(&self) -> &BoxAddress {
        &self.address
    }

    /// Roster box number.
    pub fn box_number(&self) -> u32 {
        self.box_number
    }

    /// Team name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cumulative total.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Fraction of the question's points earned this round.
    pub fn normal_fraction(&self) -> f64 {
        self.normal_fraction
    }

    /// Fraction of the quiz-out bonus earned this round.
    pub fn bonus_fraction(&self) -> f64 {
        self.bonus_fraction
    }

    /// Sum of both fractions.
    pub fn current_points(&self) -> f64 {
        self.normal_fraction + self.bonus_fraction
    }

    /// Set the normal fraction.
    pub fn set_normal_fraction(&mut self, fraction: f64) {
        self.normal_fraction = fraction;
    }

    /// Set the bonus fraction.
    pub fn set_bonus_fraction(&mut self, fraction: f64) {
        self.bonus_fraction = fraction;
    }

    /// Correct speed answers so far this session.
    pub fn correct_speed_count(&self) -> u32 {
        self.correct_speed_count
    }

    /// Count one more correct speed answer.
    pub fn increment_correct_speed_count(&mut self) {
        self.correct_speed_count += 1;
    }

    /// Add `normal_value * normal + bonus_value * bonus` to the total.
    pub fn increment_total_points(&mut self, normal_value: f64, bonus_value: f64) {
        self.total += normal_value * self.normal_fraction + bonus_value * self.bonus_fraction;
    }

    /// Zero both fractions.
    pub fn clear_current_points(&mut self) {
        self.normal_fraction = 0.0;
        self.bonus_fraction = 0.0;
    }

    /// Zero the total and the speed count.
    pub fn clear_totals(&mut self) {
        self.total = 0.0;
        self.correct_speed_count = 0;
    }

    /// Rank among all teams, 0 until standings are filled.
    pub fn standing(&self) -> u32 {
        self.standing
    }

    /// Set the rank.
    pub fn set_standing(&mut self, standing: u32) {
        self.standing = standing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_total_points() {
        let mut team = Team::new(BoxAddress::parse("0x000001"), 1, "Owls");
        team.init_values(5.0, 2);
        team.set_normal_fraction(0.5);
        team.set_bonus_fraction(1.0);
        team.increment_total_points(20.0, 10.0);
        assert_eq!(team.total(), 25.0);
        assert_eq!(team.current_points(), 1.5);
        assert_eq!(team.correct_speed_count(), 2);

        team.clear_current_points();
        assert_eq!(team.current_points(), 0.0);
    }
}

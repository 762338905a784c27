//! Round results records.
//!
//! The engine hands a [`RoundResults`] back to the caller after each
//! recorded round. Writing it anywhere durable is the caller's business.

use serde::Serialize;

use crate::protocol::Button;

use super::engine::QuestionType;

const SEP: &str = ", ";

/// One team's row in a round record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamResult {
    /// Roster box number.
    pub box_number: u32,
    /// Six hex digits of the box address.
    pub address: String,
    /// Team name.
    pub name: String,
    /// Correct speed answers after this round.
    pub correct_speed_count: u32,
    /// Answer given.
    pub answer: Button,
    /// Placing in this round, 0 if unplaced.
    pub placing: u32,
    /// Points from the answer.
    pub normal_points: f64,
    /// Quiz-out bonus points.
    pub bonus_points: f64,
    /// Points earned this round.
    pub sum: f64,
    /// Total before this round.
    pub previous_total: f64,
    /// Total after this round.
    pub total: f64,
    /// Rank after this round.
    pub standing: u32,
}

/// Everything recorded for one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResults {
    /// Question number.
    pub question_number: u32,
    /// Question type.
    pub question_type: QuestionType,
    /// Correct answer for multiple choice.
    pub answer: Button,
    /// Point value of the question.
    pub points: u32,
    /// One row per team, in box-number order.
    pub teams: Vec<TeamResult>,
}

impl RoundResults {
    /// `SUMMARY, q, type, -, -, -, answer, -, points`.
    pub fn summary_line(&self) -> String {
        [
            "SUMMARY".to_string(),
            self.question_number.to_string(),
            self.question_type.code().to_string(),
            "-".into(),
            "-".into(),
            "-".into(),
            answer_code(self.answer).to_string(),
            "-".into(),
            self.points.to_string(),
        ]
        .join(SEP)
    }

    /// One `RESULTS, ...` line per team.
    pub fn result_lines(&self) -> Vec<String> {
        self.teams
            .iter()
            .map(|t| {
                [
                    "RESULTS".to_string(),
                    self.question_number.to_string(),
                    t.box_number.to_string(),
                    format!("0x{}", t.address),
                    sanitize_name(&t.name),
                    t.correct_speed_count.to_string(),
                    answer_code(t.answer).to_string(),
                    t.placing.to_string(),
                    format_long_points(t.normal_points),
                    format_long_points(t.bonus_points),
                    format_long_points(t.sum),
                    format_long_points(t.previous_total),
                    format_long_points(t.total),
                    t.standing.to_string(),
                ]
                .join(SEP)
            })
            .collect()
    }

    /// Standings table: a header, then `box_0xADDR, name, score` per team.
    ///
    /// The extended form appends standing and correct speed count.
    pub fn standings_table(&self, title: &str, extended: bool) -> String {
        let mut header = format!("# Box{SEP}Team{SEP}Score");
        if extended {
            header.push_str(&format!("{SEP}Place{SEP}SpCnt"));
        }
        header.push_str(&format!(
            "{SEP}{}{SEP}Question #: {SEP}{}",
            sanitize_name(title),
            self.question_number
        ));

        let mut out = header;
        out.push('\n');
        for t in &self.teams {
            out.push_str(&format!(
                "{}_0x{}{SEP}{}{SEP}{}",
                t.box_number,
                t.address,
                sanitize_name(&t.name),
                format_points(t.total)
            ));
            if extended {
                out.push_str(&format!("{SEP}{}{SEP}{}", t.standing, t.correct_speed_count));
            }
            out.push('\n');
        }
        out
    }
}

/// `A`, `B`, `C`, or `N` for no answer.
pub fn answer_code(button: Button) -> &'static str {
    match button {
        Button::None => "N",
        other => other.label(),
    }
}

/// Replace commas so names survive comma-separated records.
pub fn sanitize_name(name: &str) -> String {
    name.replace(',', "_")
}

/// One decimal place, dropping a trailing `.0`.
pub fn format_points(points: f64) -> String {
    let s = format!("{points:.1}");
    match s.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => s,
    }
}

/// Two decimal places.
pub fn format_long_points(points: f64) -> String {
    format!("{points:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoundResults {
        RoundResults {
            question_number: 4,
            question_type: QuestionType::MultipleChoice,
            answer: Button::B,
            points: 10,
            teams: vec![TeamResult {
                box_number: 1,
                address: "0A0B0C".into(),
                name: "Owls, Inc".into(),
                correct_speed_count: 2,
                answer: Button::None,
                placing: 0,
                normal_points: 0.0,
                bonus_points: 0.0,
                sum: 0.0,
                previous_total: 12.5,
                total: 12.5,
                standing: 1,
            }],
        }
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(10.0), "10");
        assert_eq!(format_points(12.5), "12.5");
        assert_eq!(format_points(-3.0), "-3");
        assert_eq!(format_long_points(7.0), "7.00");
    }

    #[test]
    fn test_summary_and_result_lines() {
        let r = sample();
        assert_eq!(r.summary_line(), "SUMMARY, 4, MC, -, -, -, B, -, 10");
        assert_eq!(
            r.result_lines(),
            vec!["RESULTS, 4, 1, 0x0A0B0C, Owls_ Inc, 2, N, 0, 0.00, 0.00, 0.00, 12.50, 12.50, 1"]
        );
    }

    #[test]
    fn test_standings_table() {
        let table = sample().standings_table("Finals", true);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(
            lines[0],
            "# Box, Team, Score, Place, SpCnt, Finals, Question #: , 4"
        );
        assert_eq!(lines[1], "1_0x0A0B0C, Owls_ Inc, 12.5, 1, 2");
    }

    #[test]
    fn test_serializes() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["question_type"], "MultipleChoice");
        assert_eq!(json["teams"][0]["total"], 12.5);
    }
}

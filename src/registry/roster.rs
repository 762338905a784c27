//! Team roster input.

use serde::{Deserialize, Serialize};

/// One roster line: which box belongs to which team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Address in `name_0xHHHHHH` form.
    pub address: String,
    /// Box number shown to the operator.
    pub box_number: u32,
    /// Team name.
    pub team_name: String,
    /// Total carried over from an earlier session.
    #[serde(default)]
    pub initial_total: f64,
    /// Correct speed answers carried over.
    #[serde(default)]
    pub initial_speed_count: u32,
}

impl RosterEntry {
    /// Entry with no carried-over score.
    pub fn new(address: impl Into<String>, box_number: u32, team_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            box_number,
            team_name: team_name.into(),
            initial_total: 0.0,
            initial_speed_count: 0,
        }
    }

    /// Parse `box:address:name`, as given on the command line.
    pub fn parse_triple(text: &str) -> Option<Self> {
        let mut parts = text.splitn(3, ':');
        let box_number = parts.next()?.trim().parse().ok()?;
        let address = parts.next()?.trim();
        let name = parts.next()?.trim();
        Some(Self::new(address, box_number, name))
    }
}

/// Source of the ordered team roster.
pub trait RosterProvider {
    /// Roster entries in display order.
    fn roster(&self) -> Vec<RosterEntry>;
}

impl RosterProvider for Vec<RosterEntry> {
    fn roster(&self) -> Vec<RosterEntry> {
        self.clone()
    }
}

impl RosterProvider for [RosterEntry] {
    fn roster(&self) -> Vec<RosterEntry> {
        self.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triple() {
        let entry = RosterEntry::parse_triple("3:red_0x0A0B0C:Red Team").unwrap();
        assert_eq!(entry.box_number, 3);
        assert_eq!(entry.address, "red_0x0A0B0C");
        assert_eq!(entry.team_name, "Red Team");
        assert!(RosterEntry::parse_triple("x:0x0A0B0C:Red").is_none());
        assert!(RosterEntry::parse_triple("3:0x0A0B0C").is_none());
    }

    #[test]
    fn test_deserialize_defaults() {
        let entry: RosterEntry = serde_json::from_str(
            r#"{"address":"0x0A0B0C","box_number":1,"team_name":"Owls"}"#,
        )
        .unwrap();
        assert_eq!(entry.initial_total, 0.0);
        assert_eq!(entry.initial_speed_count, 0);
    }
}

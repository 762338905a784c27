//! Session-scoped address registry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::{BoxAddress, RegistryError};

use super::box_state::{BoxState, ConnectionStatus};
use super::roster::RosterProvider;
use super::team::Team;

/// Maps box addresses to live box state and to their teams.
///
/// One registry lives for one quiz session. Box states are created on first
/// reference and never removed.
#[derive(Debug)]
pub struct AddressRegistry {
    boxes: HashMap<BoxAddress, BoxState>,
    /// Kept sorted by box number.
    teams: Vec<Team>,
    place_count: u32,
    results_counter: u64,
}

impl Default for AddressRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            boxes: HashMap::new(),
            teams: Vec::new(),
            place_count: 0,
            results_counter: 1,
        }
    }

    /// Return the state for `address`, creating it if needed.
    ///
    /// An existing state keeps its box number; a mismatch is only logged.
    pub fn get_or_create(&mut self, address: &BoxAddress, box_number: u32) -> &mut BoxState {
        let state = self
            .boxes
            .entry(address.clone())
            .or_insert_with(|| BoxState::new(address.clone(), box_number));
        if state.box_number() != box_number {
            tracing::warn!(
                address = %address,
                existing = state.box_number(),
                requested = box_number,
                "box already registered under another number"
            );
        }
        state
    }

    /// Create the team for `address`, or return the existing one.
    ///
    /// An existing team keeps its name; a mismatch is only logged.
    pub fn create_team(&mut self, address: &BoxAddress, box_number: u32, name: &str) -> &mut Team {
        if let Some(idx) = self.team_index(address) {
            let team = &mut self.teams[idx];
            if team.name() != name {
                tracing::warn!(
                    existing = team.name(),
                    requested = name,
                    "team already registered under another name"
                );
            }
            return team;
        }

        self.get_or_create(address, box_number);
        let idx = self
            .teams
            .partition_point(|t| t.box_number() <= box_number);
        self.teams
            .insert(idx, Team::new(address.clone(), box_number, name));
        &mut self.teams[idx]
    }

    /// Register every roster entry and apply its carried-over values.
    ///
    /// Returns the number of teams registered.
    pub fn load_roster<P: RosterProvider + ?Sized>(
        &mut self,
        provider: &P,
    ) -> Result<usize, RegistryError> {
        let entries = provider.roster();
        for entry in &entries {
            let address = BoxAddress::parse(&entry.address);
            if !address.is_valid() {
                return Err(RegistryError::InvalidAddress(entry.address.clone()));
            }
            let team = self.create_team(&address, entry.box_number, &entry.team_name);
            team.init_values(entry.initial_total, entry.initial_speed_count);
            tracing::debug!(
                box_number = entry.box_number,
                address = %address,
                team = %entry.team_name,
                "team registered"
            );
        }
        Ok(entries.len())
    }

    /// Box state, if the box is known.
    pub fn box_state(&self, address: &BoxAddress) -> Option<&BoxState> {
        self.boxes.get(address)
    }

    /// Mutable box state, if the box is known.
    pub fn box_state_mut(&mut self, address: &BoxAddress) -> Option<&mut BoxState> {
        self.boxes.get_mut(address)
    }

    /// Known box states in box-number order.
    pub fn boxes(&self) -> Vec<&BoxState> {
        let mut boxes: Vec<_> = self.boxes.values().collect();
        boxes.sort_by_key(|b| b.box_number());
        boxes
    }

    /// Number of known boxes.
    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    fn team_index(&self, address: &BoxAddress) -> Option<usize> {
        self.teams.iter().position(|t| t.address() == address)
    }

    /// Team for `address`.
    pub fn team(&self, address: &BoxAddress) -> Option<&Team> {
        self.team_index(address).map(|i| &self.teams[i])
    }

    /// Mutable team for `address`.
    pub fn team_mut(&mut self, address: &BoxAddress) -> Option<&mut Team> {
        self.team_index(address).map(|i| &mut self.teams[i])
    }

    /// Team for `address`, or an unknown-address error.
    pub fn require_team(&self, address: &BoxAddress) -> Result<&Team, RegistryError> {
        self.team(address)
            .ok_or_else(|| RegistryError::UnknownAddress(address.to_string()))
    }

    /// Teams in box-number order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Mutable teams in box-number order.
    pub fn teams_mut(&mut self) -> &mut [Team] {
        &mut self.teams
    }

    /// Teams paired with their box state, in box-number order.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&mut Team, Option<&BoxState>)> {
        let boxes = &self.boxes;
        self.teams
            .iter_mut()
            .map(move |team| {
                let state = boxes.get(team.address());
                (team, state)
            })
    }

    /// Placings handed out so far this round.
    pub fn place_count(&self) -> u32 {
        self.place_count
    }

    /// Zero every placing and the round counter.
    pub fn reset_placing(&mut self) {
        self.place_count = 0;
        for state in self.boxes.values_mut() {
            state.set_placing(0);
        }
    }

    /// Clear button and placing on every box.
    pub fn clear_states(&mut self) {
        for state in self.boxes.values_mut() {
            state.clear_states();
        }
    }

    /// Assign the next placing to `address` the first time it has a button.
    ///
    /// Returns the box's placing, or 0 if it is unknown or has no button.
    pub fn update_place(&mut self, address: &BoxAddress) -> u32 {
        let Some(state) = self.boxes.get_mut(address) else {
            return 0;
        };
        if state.placing() > 0 {
            return state.placing();
        }
        if !state.button().is_pressed() {
            return 0;
        }
        self.place_count += 1;
        state.set_placing(self.place_count);
        self.place_count
    }

    /// Refresh every box's status from its last report.
    pub fn update_connection_status(&mut self, now: Instant, timeout: Duration) {
        for state in self.boxes.values_mut() {
            state.refresh_status(now, timeout);
        }
    }

    /// Set one box's status, refined by its button.
    pub fn set_connect_status(
        &mut self,
        address: &BoxAddress,
        status: ConnectionStatus,
    ) -> ConnectionStatus {
        match self.boxes.get_mut(address) {
            Some(state) => state.set_connect_status(status),
            None => ConnectionStatus::NOT_CONNECTED,
        }
    }

    /// Current status of one box.
    pub fn connect_status(&self, address: &BoxAddress) -> ConnectionStatus {
        self.boxes
            .get(address)
            .map(BoxState::status)
            .unwrap_or_default()
    }

    /// Rounded link quality, 0 if the box is unknown.
    pub fn link_quality(&self, address: &BoxAddress) -> u32 {
        self.boxes.get(address).map_or(0, BoxState::link_quality)
    }

    /// Button label for a box, empty if unknown or none.
    pub fn button_label(&self, address: &BoxAddress) -> &'static str {
        self.boxes.get(address).map_or("", |b| b.button().label())
    }

    /// `[n]box,button,placing,lq;...` over every box. Each call bumps `n`.
    pub fn results_summary(&mut self) -> String {
        let mut out = format!("[{}]", self.results_counter);
        self.results_counter += 1;
        for state in self.boxes() {
            out.push_str(&format!(
                "{},{},{},{};",
                state.box_number(),
                state.button().label(),
                state.placing(),
                state.link_quality()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Button;
    use crate::registry::RosterEntry;

    fn addr(n: u8) -> BoxAddress {
        BoxAddress::from_binary(&[0, 0, n])
    }

    #[test]
    fn test_get_or_create_keeps_box_number() {
        let mut reg = AddressRegistry::new();
        reg.get_or_create(&addr(1), 4);
        let state = reg.get_or_create(&addr(1), 9);
        assert_eq!(state.box_number(), 4);
        assert_eq!(reg.box_count(), 1);
    }

    #[test]
    fn test_teams_sorted_by_box_number() {
        let mut reg = AddressRegistry::new();
        reg.create_team(&addr(3), 3, "C");
        reg.create_team(&addr(1), 1, "A");
        reg.create_team(&addr(2), 2, "B");
        let names: Vec<_> = reg.teams().iter().map(|t| t.name()).collect();
        assert_eq!(names, ["A", "B", "C"]);

        let again = reg.create_team(&addr(2), 2, "Other");
        assert_eq!(again.name(), "B");
        assert_eq!(reg.teams().len(), 3);
    }

    #[test]
    fn test_update_place_idempotent() {
        let mut reg = AddressRegistry::new();
        reg.get_or_create(&addr(1), 1);
        reg.get_or_create(&addr(2), 2);

        assert_eq!(reg.update_place(&addr(1)), 0);
        assert_eq!(reg.place_count(), 0);

        reg.box_state_mut(&addr(2)).unwrap().set_button(Button::A);
        reg.box_state_mut(&addr(1)).unwrap().set_button(Button::C);
        assert_eq!(reg.update_place(&addr(2)), 1);
        assert_eq!(reg.update_place(&addr(2)), 1);
        assert_eq!(reg.update_place(&addr(1)), 2);
        assert_eq!(reg.update_place(&addr(2)), 1);
        assert_eq!(reg.place_count(), 2);

        reg.reset_placing();
        assert_eq!(reg.place_count(), 0);
        assert_eq!(reg.box_state(&addr(2)).unwrap().placing(), 0);
        assert_eq!(reg.update_place(&addr(1)), 1);
    }

    #[test]
    fn test_update_place_unknown_box() {
        let mut reg = AddressRegistry::new();
        assert_eq!(reg.update_place(&addr(9)), 0);
    }

    #[test]
    fn test_load_roster() {
        let mut reg = AddressRegistry::new();
        let mut roster = vec![
            RosterEntry::new("blue_0x000002", 2, "Blue"),
            RosterEntry::new("red_0x000001", 1, "Red"),
        ];
        roster[0].initial_total = 40.0;
        roster[0].initial_speed_count = 1;

        assert_eq!(reg.load_roster(&roster), Ok(2));
        let blue = reg.team(&addr(2)).unwrap();
        assert_eq!(blue.total(), 40.0);
        assert_eq!(blue.correct_speed_count(), 1);
        assert_eq!(reg.teams()[0].name(), "Red");
        assert!(reg.box_state(&addr(1)).is_some());
    }

    #[test]
    fn test_load_roster_rejects_invalid_address() {
        let mut reg = AddressRegistry::new();
        let roster = vec![RosterEntry::new("red_", 1, "Red")];
        assert!(matches!(
            reg.load_roster(&roster),
            Err(RegistryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_connection_status_sweep() {
        let mut reg = AddressRegistry::new();
        let t0 = Instant::now();
        reg.get_or_create(&addr(1), 1).touch(t0);
        reg.get_or_create(&addr(2), 2);

        reg.update_connection_status(t0 + Duration::from_millis(100), Duration::from_secs(5));
        assert_eq!(reg.connect_status(&addr(1)), ConnectionStatus::CONNECTED);
        assert_eq!(reg.connect_status(&addr(2)), ConnectionStatus::NOT_CONNECTED);

        reg.update_connection_status(t0 + Duration::from_secs(6), Duration::from_secs(5));
        assert_eq!(reg.connect_status(&addr(1)), ConnectionStatus::NOT_CONNECTED);
    }

    #[test]
    fn test_results_summary() {
        let mut reg = AddressRegistry::new();
        reg.get_or_create(&addr(2), 2).set_button(Button::B);
        reg.get_or_create(&addr(1), 1).record_link_quality(120);
        reg.update_place(&addr(2));

        assert_eq!(reg.results_summary(), "[1]1,,0,120;2,B,1,0;");
        assert!(reg.results_summary().starts_with("[2]"));
    }
}

//! Standings with shared ranks for ties.

use crate::registry::Team;

/// Rank teams by total, highest first.
///
/// Tied teams share a rank and the following rank skips by the size of the
/// tie, so four teams on 10, 10, 10, 5 rank 1, 1, 1, 4. A team with a NaN
/// total is left unranked at 0.
pub fn fill_standings(teams: &mut [Team]) {
    for team in teams.iter_mut() {
        team.set_standing(0);
    }

    let mut next = 1;
    loop {
        let best = teams
            .iter()
            .filter(|t| t.standing() == 0 && !t.total().is_nan())
            .map(Team::total)
            .reduce(f64::max);
        let Some(best) = best else {
            break;
        };

        let rank = next;
        for team in teams
            .iter_mut()
            .filter(|t| t.standing() == 0 && t.total() == best)
        {
            team.set_standing(rank);
            next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BoxAddress;

    fn teams(totals: &[f64]) -> Vec<Team> {
        totals
            .iter()
            .enumerate()
            .map(|(i, &total)| {
                let mut team = Team::new(BoxAddress::from_binary(&[0, 0, i as u8]), i as u32, "t");
                team.init_values(total, 0);
                team
            })
            .collect()
    }

    fn ranks(teams: &[Team]) -> Vec<u32> {
        teams.iter().map(Team::standing).collect()
    }

    #[test]
    fn test_three_way_tie_skips() {
        let mut t = teams(&[10.0, 10.0, 5.0, 10.0]);
        fill_standings(&mut t);
        assert_eq!(ranks(&t), [1, 1, 4, 1]);
    }

    #[test]
    fn test_distinct_totals() {
        let mut t = teams(&[0.0, 30.0, -5.0, 20.0]);
        fill_standings(&mut t);
        assert_eq!(ranks(&t), [3, 1, 4, 2]);
    }

    #[test]
    fn test_tie_in_middle() {
        let mut t = teams(&[50.0, 20.0, 20.0, 10.0]);
        fill_standings(&mut t);
        assert_eq!(ranks(&t), [1, 2, 2, 4]);
    }

    #[test]
    fn test_nan_total_unranked() {
        let mut t = teams(&[f64::NAN, 1.0]);
        fill_standings(&mut t);
        assert_eq!(ranks(&t), [0, 1]);
    }

    #[test]
    fn test_empty() {
        fill_standings(&mut []);
    }
}

// Snake-order construction.
//
// A snake draft reverses direction every round: round 1 runs team 1..N,
// round 2 runs N..1, round 3 matches round 1, and so on. The turn engine
// never re-derives this; it consumes the flattened sequence produced here.

/// Total selections in a full draft: every team fills its entire roster.
pub fn total_picks(num_teams: usize, roster_size: usize) -> usize {
    num_teams * roster_size
}

/// Flatten `rounds` rounds of snake order over `team_ids`. Output length is
/// `team_ids.len() * rounds`; odd rounds (0-indexed) are reversed.
pub fn snake_order(team_ids: &[String], rounds: usize) -> Vec<String> {
    let mut order = Vec::with_capacity(team_ids.len() * rounds);
    for round in 0..rounds {
        if round % 2 == 0 {
            order.extend(team_ids.iter().cloned());
        } else {
            order.extend(team_ids.iter().rev().cloned());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn total_picks_is_product() {
        assert_eq!(total_picks(10, 16), 160);
        assert_eq!(total_picks(3, 1), 3);
        assert_eq!(total_picks(0, 16), 0);
        assert_eq!(total_picks(10, 0), 0);
    }

    #[test]
    fn first_round_is_forward() {
        let order = snake_order(&teams(&["a", "b", "c"]), 1);
        assert_eq!(order, teams(&["a", "b", "c"]));
    }

    #[test]
    fn second_round_reverses() {
        let order = snake_order(&teams(&["a", "b", "c"]), 2);
        assert_eq!(order, teams(&["a", "b", "c", "c", "b", "a"]));
    }

    #[test]
    fn third_round_matches_first() {
        let order = snake_order(&teams(&["a", "b", "c"]), 3);
        assert_eq!(&order[6..], &teams(&["a", "b", "c"])[..]);
    }

    #[test]
    fn length_is_teams_times_rounds() {
        let order = snake_order(&teams(&["a", "b", "c", "d"]), 5);
        assert_eq!(order.len(), 20);
        assert_eq!(order.len(), total_picks(4, 5));
    }

    #[test]
    fn turn_boundary_repeats_team() {
        // The last pick of a round and the first pick of the next round
        // belong to the same team.
        let order = snake_order(&teams(&["a", "b", "c"]), 4);
        assert_eq!(order[2], order[3]); // c picks back-to-back
        assert_eq!(order[5], order[6]); // a picks back-to-back
    }

    #[test]
    fn zero_rounds_is_empty() {
        assert!(snake_order(&teams(&["a", "b"]), 0).is_empty());
    }

    #[test]
    fn single_team_order() {
        let order = snake_order(&teams(&["solo"]), 3);
        assert_eq!(order, teams(&["solo", "solo", "solo"]));
    }
}

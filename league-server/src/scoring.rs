// Fantasy-point formulas: linear weighted sums over stat lines.

use crate::config::{GoalieWeights, ScoringConfig, SkaterWeights};

/// A skater's season stat line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkaterStats {
    pub goals: f64,
    pub assists: f64,
    pub plus_minus: f64,
    pub shots: f64,
    pub hits: f64,
    pub blocks: f64,
    pub powerplay_points: f64,
}

/// A goalie's season stat line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalieStats {
    pub wins: f64,
    pub saves: f64,
    pub goals_against: f64,
    pub shutouts: f64,
}

/// Fantasy points for a skater under the given weights.
pub fn skater_points(stats: &SkaterStats, w: &SkaterWeights) -> f64 {
    stats.goals * w.goals
        + stats.assists * w.assists
        + stats.plus_minus * w.plus_minus
        + stats.shots * w.shots
        + stats.hits * w.hits
        + stats.blocks * w.blocks
        + stats.powerplay_points * w.powerplay_points
}

/// Fantasy points for a goalie under the given weights. `goals_against`
/// normally carries a negative weight.
pub fn goalie_points(stats: &GoalieStats, w: &GoalieWeights) -> f64 {
    stats.wins * w.wins
        + stats.saves * w.saves
        + stats.goals_against * w.goals_against
        + stats.shutouts * w.shutouts
}

/// The weight for a named stat, given the player type ("skater" or
/// "goalie"). Unknown stat names and unknown player types weigh zero.
pub fn weight_for(scoring: &ScoringConfig, player_type: &str, stat_name: &str) -> f64 {
    match player_type {
        "skater" => {
            let w = &scoring.skater;
            match stat_name {
                "goals" => w.goals,
                "assists" => w.assists,
                "plus_minus" => w.plus_minus,
                "shots" => w.shots,
                "hits" => w.hits,
                "blocks" => w.blocks,
                "powerplay_points" => w.powerplay_points,
                _ => 0.0,
            }
        }
        "goalie" => {
            let w = &scoring.goalie;
            match stat_name {
                "wins" => w.wins,
                "saves" => w.saves,
                "goals_against" => w.goals_against,
                "shutouts" => w.shutouts,
                _ => 0.0,
            }
        }
        _ => 0.0,
    }
}

/// Score a player straight from stats-table rows of `(stat_name, value)`.
pub fn points_from_rows(
    rows: &[(String, f64)],
    scoring: &ScoringConfig,
    player_type: &str,
) -> f64 {
    rows.iter()
        .map(|(name, value)| value * weight_for(scoring, player_type, name))
        .sum()
}

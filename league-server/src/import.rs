// CSV player-pool import.
//
// Loads skater and goalie season lines from the configured CSV files and
// upserts them into the players/stats tables. Re-running the import is
// safe: players upsert on (name, team) and stat rows are replaced.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::config::DataPaths;
use crate::db::Database;

/// One row of skaters.csv. `positions` is slash-separated, e.g. "RW/LW".
#[derive(Debug, Deserialize)]
struct SkaterRecord {
    name: String,
    team: String,
    positions: String,
    goals: f64,
    assists: f64,
    plus_minus: f64,
    shots: f64,
    hits: f64,
    blocks: f64,
    powerplay_points: f64,
}

/// One row of goalies.csv.
#[derive(Debug, Deserialize)]
struct GoalieRecord {
    name: String,
    team: String,
    wins: f64,
    saves: f64,
    goals_against: f64,
    shutouts: f64,
}

/// Counts of imported players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportCounts {
    pub skaters: usize,
    pub goalies: usize,
}

fn split_positions(positions: &str) -> Vec<String> {
    positions
        .split('/')
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Import skaters from a CSV file. Returns the number of rows imported.
pub fn import_skaters(db: &Database, path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open skater CSV at {}", path.display()))?;

    let mut count = 0;
    for record in reader.deserialize() {
        let record: SkaterRecord = record.context("failed to parse skater CSV row")?;
        let positions = split_positions(&record.positions);
        db.import_player(
            &record.name,
            &record.team,
            &positions,
            "skater",
            &[
                ("goals", record.goals),
                ("assists", record.assists),
                ("plus_minus", record.plus_minus),
                ("shots", record.shots),
                ("hits", record.hits),
                ("blocks", record.blocks),
                ("powerplay_points", record.powerplay_points),
            ],
        )
        .with_context(|| format!("failed to import skater {}", record.name))?;
        count += 1;
    }
    Ok(count)
}

/// Import goalies from a CSV file. Returns the number of rows imported.
pub fn import_goalies(db: &Database, path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open goalie CSV at {}", path.display()))?;

    let mut count = 0;
    for record in reader.deserialize() {
        let record: GoalieRecord = record.context("failed to parse goalie CSV row")?;
        db.import_player(
            &record.name,
            &record.team,
            &["G".to_string()],
            "goalie",
            &[
                ("wins", record.wins),
                ("saves", record.saves),
                ("goals_against", record.goals_against),
                ("shutouts", record.shutouts),
            ],
        )
        .with_context(|| format!("failed to import goalie {}", record.name))?;
        count += 1;
    }
    Ok(count)
}

/// Import both configured CSV files.
pub fn load_all(db: &Database, paths: &DataPaths) -> Result<ImportCounts> {
    let skaters = import_skaters(db, Path::new(&paths.skaters))?;
    let goalies = import_goalies(db, Path::new(&paths.goalies))?;
    info!("Imported {skaters} skaters, {goalies} goalies");
    Ok(ImportCounts { skaters, goalies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn write_tmp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("puckpool_{name}_{}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    const SKATERS_CSV: &str = "\
name,team,positions,goals,assists,plus_minus,shots,hits,blocks,powerplay_points
Connor McDavid,EDM,C,64,89,28,352,62,21,71
David Pastrnak,BOS,RW/LW,47,63,20,379,51,14,36
";

    const GOALIES_CSV: &str = "\
name,team,wins,saves,goals_against,shutouts
Connor Hellebuyck,WPG,37,1656,142,5
";

    #[test]
    fn import_skaters_loads_players_and_stats() {
        let db = test_db();
        let path = write_tmp("skaters_ok.csv", SKATERS_CSV);

        let count = import_skaters(&db, &path).unwrap();
        assert_eq!(count, 2);

        let players = db.list_players(Some("skater")).unwrap();
        assert_eq!(players.len(), 2);

        let mcdavid = players.iter().find(|p| p.name == "Connor McDavid").unwrap();
        assert_eq!(mcdavid.positions, vec!["C".to_string()]);
        let stats = db.player_stats(mcdavid.id).unwrap();
        assert!(stats.contains(&("goals".to_string(), 64.0)));
        assert!(stats.contains(&("powerplay_points".to_string(), 71.0)));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn slash_separated_positions_split() {
        let db = test_db();
        let path = write_tmp("skaters_multi.csv", SKATERS_CSV);
        import_skaters(&db, &path).unwrap();

        let players = db.list_players(None).unwrap();
        let pastrnak = players.iter().find(|p| p.name == "David Pastrnak").unwrap();
        assert_eq!(
            pastrnak.positions,
            vec!["RW".to_string(), "LW".to_string()]
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn import_goalies_forces_goalie_position() {
        let db = test_db();
        let path = write_tmp("goalies_ok.csv", GOALIES_CSV);

        let count = import_goalies(&db, &path).unwrap();
        assert_eq!(count, 1);

        let goalies = db.list_players(Some("goalie")).unwrap();
        assert_eq!(goalies.len(), 1);
        assert_eq!(goalies[0].positions, vec!["G".to_string()]);

        let stats = db.player_stats(goalies[0].id).unwrap();
        assert!(stats.contains(&("goals_against".to_string(), 142.0)));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn reimport_is_idempotent() {
        let db = test_db();
        let path = write_tmp("skaters_twice.csv", SKATERS_CSV);

        import_skaters(&db, &path).unwrap();
        import_skaters(&db, &path).unwrap();

        assert_eq!(db.list_players(None).unwrap().len(), 2);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let db = test_db();
        let result = import_skaters(&db, Path::new("/nonexistent/skaters.csv"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_row_is_an_error() {
        let db = test_db();
        let path = write_tmp(
            "skaters_bad.csv",
            "name,team,positions,goals,assists,plus_minus,shots,hits,blocks,powerplay_points\n\
             Broken Row,EDM,C,not_a_number,0,0,0,0,0,0\n",
        );
        assert!(import_skaters(&db, &path).is_err());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_all_counts_both_files() {
        let db = test_db();
        let skaters = write_tmp("all_skaters.csv", SKATERS_CSV);
        let goalies = write_tmp("all_goalies.csv", GOALIES_CSV);

        let paths = DataPaths {
            skaters: skaters.to_string_lossy().into_owned(),
            goalies: goalies.to_string_lossy().into_owned(),
        };
        let counts = load_all(&db, &paths).unwrap();
        assert_eq!(counts, ImportCounts { skaters: 2, goalies: 1 });

        let _ = fs::remove_file(&skaters);
        let _ = fs::remove_file(&goalies);
    }
}

// SQLite persistence layer for leagues, teams, players, rosters, and drafts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::draft::engine::PickOutcome;
use crate::draft::pick::DraftPick;
use crate::draft::state::{Draft, DraftStatus};

/// A league row: name plus the settings snapshot taken at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    pub num_teams: usize,
    /// Position -> slot count mapping frozen when the league was created.
    pub positions: HashMap<String, usize>,
}

/// A fantasy team within a league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub league_id: String,
    pub name: String,
    pub owner: String,
}

/// A player in the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    /// NHL team abbreviation.
    pub team: String,
    /// Eligible positions (e.g. ["RW", "LW"]).
    pub positions: Vec<String>,
    /// "skater" or "goalie".
    pub player_type: String,
}

/// One roster assignment, joined with the player's name for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: i64,
    pub name: String,
    pub slot: String,
}

/// SQLite-backed persistence. All access goes through a single connection
/// behind a mutex; SQLite serializes writers anyway and this keeps the
/// guarded draft update race-free within the process.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leagues (
                id         TEXT PRIMARY KEY,
                name       TEXT NOT NULL,
                num_teams  INTEGER NOT NULL,
                positions  TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS teams (
                id         TEXT PRIMARY KEY,
                league_id  TEXT NOT NULL REFERENCES leagues(id),
                name       TEXT NOT NULL,
                owner      TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                UNIQUE(league_id, name)
            );

            CREATE TABLE IF NOT EXISTS players (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                team        TEXT NOT NULL,
                positions   TEXT NOT NULL,
                player_type TEXT NOT NULL,
                UNIQUE(name, team)
            );

            CREATE TABLE IF NOT EXISTS stats (
                player_id INTEGER NOT NULL REFERENCES players(id),
                stat_name TEXT NOT NULL,
                value     REAL NOT NULL,
                PRIMARY KEY (player_id, stat_name)
            );

            CREATE TABLE IF NOT EXISTS rosters (
                team_id   TEXT NOT NULL REFERENCES teams(id),
                player_id INTEGER NOT NULL REFERENCES players(id),
                slot      TEXT NOT NULL,
                added_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (team_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS drafts (
                id              TEXT PRIMARY KEY,
                league_id       TEXT NOT NULL REFERENCES leagues(id),
                status          TEXT NOT NULL,
                current_pick    INTEGER NOT NULL,
                current_team_id TEXT,
                draft_order     TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                completed_at    TEXT
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                draft_id    TEXT NOT NULL REFERENCES drafts(id),
                pick_number INTEGER NOT NULL,
                team_id     TEXT NOT NULL,
                player_id   INTEGER NOT NULL REFERENCES players(id),
                timestamp   TEXT NOT NULL,
                PRIMARY KEY (draft_id, pick_number),
                UNIQUE (draft_id, player_id)
            );

            CREATE INDEX IF NOT EXISTS idx_teams_league_id ON teams(league_id);
            CREATE INDEX IF NOT EXISTS idx_drafts_league_id ON drafts(league_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Leagues
    // ------------------------------------------------------------------

    pub fn create_league(&self, league: &League) -> Result<()> {
        let conn = self.conn();
        let positions_json = serde_json::to_string(&league.positions)
            .context("failed to serialize league positions")?;
        conn.execute(
            "INSERT INTO leagues (id, name, num_teams, positions) VALUES (?1, ?2, ?3, ?4)",
            params![league.id, league.name, league.num_teams, positions_json],
        )
        .context("failed to insert league")?;
        Ok(())
    }

    pub fn get_league(&self, league_id: &str) -> Result<Option<League>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, num_teams, positions FROM leagues WHERE id = ?1",
            params![league_id],
            |row| {
                let positions_json: String = row.get(3)?;
                Ok(League {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    num_teams: row.get(2)?,
                    positions: serde_json::from_str(&positions_json).unwrap_or_default(),
                })
            },
        )
        .optional()
        .context("failed to query league")
    }

    /// All leagues in creation order.
    pub fn list_leagues(&self) -> Result<Vec<League>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, num_teams, positions FROM leagues ORDER BY rowid")
            .context("failed to prepare list_leagues query")?;
        let leagues = stmt
            .query_map([], |row| {
                let positions_json: String = row.get(3)?;
                Ok(League {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    num_teams: row.get(2)?,
                    positions: serde_json::from_str(&positions_json).unwrap_or_default(),
                })
            })
            .context("failed to query leagues")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map league rows")?;
        Ok(leagues)
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    pub fn create_team(&self, team: &Team) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO teams (id, league_id, name, owner) VALUES (?1, ?2, ?3, ?4)",
            params![team.id, team.league_id, team.name, team.owner],
        )
        .context("failed to insert team")?;
        Ok(())
    }

    pub fn get_team(&self, team_id: &str) -> Result<Option<Team>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, league_id, name, owner FROM teams WHERE id = ?1",
            params![team_id],
            |row| {
                Ok(Team {
                    id: row.get(0)?,
                    league_id: row.get(1)?,
                    name: row.get(2)?,
                    owner: row.get(3)?,
                })
            },
        )
        .optional()
        .context("failed to query team")
    }

    /// Teams in join order. Join order is also the base order of round one
    /// of the draft.
    pub fn list_teams(&self, league_id: &str) -> Result<Vec<Team>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, league_id, name, owner FROM teams
                 WHERE league_id = ?1 ORDER BY rowid",
            )
            .context("failed to prepare list_teams query")?;
        let teams = stmt
            .query_map(params![league_id], |row| {
                Ok(Team {
                    id: row.get(0)?,
                    league_id: row.get(1)?,
                    name: row.get(2)?,
                    owner: row.get(3)?,
                })
            })
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team rows")?;
        Ok(teams)
    }

    pub fn count_teams(&self, league_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM teams WHERE league_id = ?1",
                params![league_id],
                |row| row.get(0),
            )
            .context("failed to count teams")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Players and stats
    // ------------------------------------------------------------------

    /// Insert a player or update their record if a `(name, team)` row
    /// already exists. Returns the player's row id in a single atomic
    /// statement.
    pub fn upsert_player(
        &self,
        name: &str,
        team: &str,
        positions: &[String],
        player_type: &str,
    ) -> Result<i64> {
        let conn = self.conn();
        let positions_json =
            serde_json::to_string(positions).context("failed to serialize positions")?;

        let id: i64 = conn
            .query_row(
                "INSERT INTO players (name, team, positions, player_type)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name, team) DO UPDATE SET
                    positions   = excluded.positions,
                    player_type = excluded.player_type
                 RETURNING id",
                params![name, team, positions_json, player_type],
                |row| row.get(0),
            )
            .context("failed to upsert player")?;
        Ok(id)
    }

    /// Insert a single stat row. Uses INSERT OR REPLACE so re-importing
    /// overwrites prior values.
    pub fn insert_stat(&self, player_id: i64, stat_name: &str, value: f64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO stats (player_id, stat_name, value)
             VALUES (?1, ?2, ?3)",
            params![player_id, stat_name, value],
        )
        .context("failed to insert stat")?;
        Ok(())
    }

    /// Upsert a player and their full stat line in one transaction.
    pub fn import_player(
        &self,
        name: &str,
        team: &str,
        positions: &[String],
        player_type: &str,
        stats: &[(&str, f64)],
    ) -> Result<i64> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;

        let positions_json =
            serde_json::to_string(positions).context("failed to serialize positions")?;
        let player_id: i64 = tx
            .query_row(
                "INSERT INTO players (name, team, positions, player_type)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name, team) DO UPDATE SET
                    positions   = excluded.positions,
                    player_type = excluded.player_type
                 RETURNING id",
                params![name, team, positions_json, player_type],
                |row| row.get(0),
            )
            .context("failed to upsert player in import")?;

        for &(stat_name, value) in stats {
            tx.execute(
                "INSERT OR REPLACE INTO stats (player_id, stat_name, value)
                 VALUES (?1, ?2, ?3)",
                params![player_id, stat_name, value],
            )
            .context("failed to insert stat in import")?;
        }

        tx.commit().context("failed to commit player import")?;
        Ok(player_id)
    }

    pub fn get_player(&self, player_id: i64) -> Result<Option<Player>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, team, positions, player_type FROM players WHERE id = ?1",
            params![player_id],
            |row| {
                let positions_json: String = row.get(3)?;
                Ok(Player {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    team: row.get(2)?,
                    positions: serde_json::from_str(&positions_json).unwrap_or_default(),
                    player_type: row.get(4)?,
                })
            },
        )
        .optional()
        .context("failed to query player")
    }

    /// All players, optionally filtered by type ("skater" or "goalie").
    pub fn list_players(&self, player_type: Option<&str>) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, team, positions, player_type FROM players
                 WHERE (?1 IS NULL OR player_type = ?1) ORDER BY name",
            )
            .context("failed to prepare list_players query")?;
        let players = stmt
            .query_map(params![player_type], |row| {
                let positions_json: String = row.get(3)?;
                Ok(Player {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    team: row.get(2)?,
                    positions: serde_json::from_str(&positions_json).unwrap_or_default(),
                    player_type: row.get(4)?,
                })
            })
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;
        Ok(players)
    }

    /// All stat rows for a player as (stat_name, value) pairs.
    pub fn player_stats(&self, player_id: i64) -> Result<Vec<(String, f64)>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT stat_name, value FROM stats WHERE player_id = ?1 ORDER BY stat_name")
            .context("failed to prepare player_stats query")?;
        let rows = stmt
            .query_map(params![player_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .context("failed to query stats")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map stat rows")?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Rosters
    // ------------------------------------------------------------------

    /// Add a player to a team's roster. Returns `false` if the player is
    /// already rostered on that team (INSERT OR IGNORE).
    pub fn add_to_roster(&self, team_id: &str, player_id: i64, slot: &str) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO rosters (team_id, player_id, slot) VALUES (?1, ?2, ?3)",
                params![team_id, player_id, slot],
            )
            .context("failed to insert roster row")?;
        Ok(changed > 0)
    }

    /// Remove a player from a team's roster. Returns `false` if the player
    /// was not on the roster.
    pub fn remove_from_roster(&self, team_id: &str, player_id: i64) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "DELETE FROM rosters WHERE team_id = ?1 AND player_id = ?2",
                params![team_id, player_id],
            )
            .context("failed to delete roster row")?;
        Ok(changed > 0)
    }

    /// A team's roster with player names, ordered by when each player was
    /// added.
    pub fn load_roster(&self, team_id: &str) -> Result<Vec<RosterEntry>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT r.player_id, p.name, r.slot
                 FROM rosters r JOIN players p ON p.id = r.player_id
                 WHERE r.team_id = ?1 ORDER BY r.rowid",
            )
            .context("failed to prepare load_roster query")?;
        let entries = stmt
            .query_map(params![team_id], |row| {
                Ok(RosterEntry {
                    player_id: row.get(0)?,
                    name: row.get(1)?,
                    slot: row.get(2)?,
                })
            })
            .context("failed to query roster")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map roster rows")?;
        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    /// Persist a new draft with its flattened order.
    pub fn create_draft(&self, draft: &Draft, order: &[String]) -> Result<()> {
        let conn = self.conn();
        let order_json =
            serde_json::to_string(order).context("failed to serialize draft order")?;
        conn.execute(
            "INSERT INTO drafts
                (id, league_id, status, current_pick, current_team_id, draft_order, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                draft.id,
                draft.league_id,
                draft.status.as_str(),
                draft.current_pick,
                draft.current_team_id,
                order_json,
                draft.completed_at,
            ],
        )
        .context("failed to insert draft")?;
        Ok(())
    }

    /// Load a draft row together with its flattened order.
    pub fn get_draft(&self, draft_id: &str) -> Result<Option<(Draft, Vec<String>)>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, league_id, status, current_pick, current_team_id, draft_order,
                        completed_at
                 FROM drafts WHERE id = ?1",
                params![draft_id],
                |row| {
                    let status_str: String = row.get(2)?;
                    let order_json: String = row.get(5)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        status_str,
                        row.get::<_, u32>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        order_json,
                        row.get::<_, Option<chrono::DateTime<chrono::Utc>>>(6)?,
                    ))
                },
            )
            .optional()
            .context("failed to query draft")?;

        let Some((id, league_id, status_str, current_pick, current_team_id, order_json, completed_at)) =
            row
        else {
            return Ok(None);
        };

        let status = DraftStatus::parse(&status_str)
            .ok_or_else(|| anyhow!("unknown draft status stored for {id}: {status_str}"))?;
        let order: Vec<String> =
            serde_json::from_str(&order_json).context("failed to deserialize draft order")?;

        Ok(Some((
            Draft {
                id,
                league_id,
                status,
                current_pick,
                current_team_id,
                completed_at,
            },
            order,
        )))
    }

    /// Transition a scheduled draft to in-progress with the first team on
    /// the clock. Guarded: returns `false` if the draft is not scheduled
    /// (already started, completed, or cancelled).
    pub fn start_draft(&self, draft_id: &str, first_team_id: &str) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE drafts
                 SET status = 'in_progress', current_pick = 1, current_team_id = ?2
                 WHERE id = ?1 AND status = 'scheduled'",
                params![draft_id, first_team_id],
            )
            .context("failed to start draft")?;
        Ok(changed > 0)
    }

    /// Cancel a draft that has not completed. Guarded: returns `false`
    /// when the draft is already completed or cancelled (terminal states
    /// never transition).
    pub fn cancel_draft(&self, draft_id: &str) -> Result<bool> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE drafts SET status = 'cancelled', current_team_id = NULL
                 WHERE id = ?1 AND status IN ('scheduled', 'in_progress')",
                params![draft_id],
            )
            .context("failed to cancel draft")?;
        Ok(changed > 0)
    }

    /// Whether a player already has a pick row in this draft.
    pub fn is_player_drafted(&self, draft_id: &str, player_id: i64) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM draft_picks WHERE draft_id = ?1 AND player_id = ?2)",
                params![draft_id, player_id],
                |row| row.get(0),
            )
            .context("failed to check draft_picks existence")?;
        Ok(exists)
    }

    /// Load picks for a draft, ordered by pick number.
    pub fn load_picks(&self, draft_id: &str) -> Result<Vec<DraftPick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT pick_number, team_id, player_id, timestamp
                 FROM draft_picks WHERE draft_id = ?1 ORDER BY pick_number",
            )
            .context("failed to prepare load_picks query")?;
        let picks = stmt
            .query_map(params![draft_id], |row| {
                Ok(DraftPick {
                    pick_number: row.get(0)?,
                    team_id: row.get(1)?,
                    player_id: row.get(2)?,
                    timestamp: row.get(3)?,
                })
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;
        Ok(picks)
    }

    /// Apply an accepted pick atomically: advance the draft row, insert
    /// the pick row, and add the player to the picking team's roster —
    /// all or nothing.
    ///
    /// The draft update is guarded by the pick number the engine validated
    /// against (`WHERE current_pick = :expected AND status = 'in_progress'`).
    /// If another request advanced the draft first, zero rows change and
    /// this returns `Ok(false)` without writing anything; the caller
    /// reports the conflict and the client re-reads the draft.
    pub fn apply_pick(&self, outcome: &PickOutcome, slot: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin pick transaction")?;

        let next = &outcome.next;
        let changed = tx
            .execute(
                "UPDATE drafts
                 SET status = ?2, current_pick = ?3, current_team_id = ?4, completed_at = ?5
                 WHERE id = ?1 AND status = 'in_progress' AND current_pick = ?6",
                params![
                    next.id,
                    next.status.as_str(),
                    next.current_pick,
                    next.current_team_id,
                    next.completed_at,
                    outcome.pick.pick_number,
                ],
            )
            .context("failed to advance draft row")?;

        if changed == 0 {
            // Lost the race: the draft row no longer matches the state the
            // engine validated. Dropping the transaction rolls back.
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO draft_picks (draft_id, pick_number, team_id, player_id, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                next.id,
                outcome.pick.pick_number,
                outcome.pick.team_id,
                outcome.pick.player_id,
                outcome.pick.timestamp,
            ],
        )
        .context("failed to insert pick row")?;

        tx.execute(
            "INSERT INTO rosters (team_id, player_id, slot) VALUES (?1, ?2, ?3)",
            params![outcome.pick.team_id, outcome.pick.player_id, slot],
        )
        .context("failed to insert roster row for pick")?;

        tx.commit().context("failed to commit pick")?;
        Ok(true)
    }
}

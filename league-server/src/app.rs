// Request dispatch: the in-process API layer over config + database +
// draft engine.
//
// Each WebSocket text frame parses to one ApiRequest, runs against the
// database, and produces one ApiResponse. The pick flow is the only
// multi-write path: the engine decides, then Database::apply_pick persists
// the decision atomically.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::Config;
use crate::db::{Database, League, Player, Team};
use crate::draft::engine::{self, team_for_pick};
use crate::draft::order::snake_order;
use crate::draft::pick::PickError;
use crate::draft::roster::{Position, Roster, RosteredPlayer};
use crate::draft::state::{generate_id, Draft, DraftStatus};
use crate::protocol::{pick_error_code, ApiRequest, ApiResponse, DraftView};
use crate::scoring;

/// The complete application state shared by all client connections.
pub struct App {
    pub config: Config,
    pub db: Database,
}

impl App {
    pub fn new(config: Config, db: Database) -> Self {
        App { config, db }
    }

    /// Handle one raw text frame: parse, dispatch, serialize.
    pub fn handle_text(&self, text: &str) -> String {
        let response = match serde_json::from_str::<ApiRequest>(text) {
            Ok(request) => self.handle_request(request),
            Err(e) => ApiResponse::error("invalid_request", format!("unparseable request: {e}")),
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            warn!("Failed to serialize response: {e}");
            r#"{"type":"error","code":"internal","message":"response serialization failed"}"#
                .to_string()
        })
    }

    /// Dispatch a parsed request to its handler.
    pub fn handle_request(&self, request: ApiRequest) -> ApiResponse {
        match request {
            ApiRequest::CreateLeague { name } => self.create_league(name),
            ApiRequest::GetLeague { league_id } => self.get_league(&league_id),
            ApiRequest::ListLeagues => self.list_leagues(),
            ApiRequest::JoinLeague {
                league_id,
                team_name,
                owner,
            } => self.join_league(&league_id, &team_name, &owner),
            ApiRequest::ListTeams { league_id } => self.list_teams(&league_id),
            ApiRequest::ListPlayers { player_type } => self.list_players(player_type.as_deref()),
            ApiRequest::PlayerPoints { player_id } => self.player_points(player_id),
            ApiRequest::AddToRoster { team_id, player_id } => {
                self.add_to_roster(&team_id, player_id)
            }
            ApiRequest::DropFromRoster { team_id, player_id } => {
                self.drop_from_roster(&team_id, player_id)
            }
            ApiRequest::GetRoster { team_id } => self.get_roster(&team_id),
            ApiRequest::CreateDraft { league_id } => self.create_draft(&league_id),
            ApiRequest::StartDraft { draft_id } => self.start_draft(&draft_id),
            ApiRequest::CancelDraft { draft_id } => self.cancel_draft(&draft_id),
            ApiRequest::GetDraft { draft_id } => self.get_draft(&draft_id),
            ApiRequest::MakePick {
                draft_id,
                team_id,
                player_id,
            } => self.make_pick(&draft_id, &team_id, player_id),
            ApiRequest::ListPicks { draft_id } => self.list_picks(&draft_id),
        }
    }

    // ------------------------------------------------------------------
    // Leagues and teams
    // ------------------------------------------------------------------

    fn create_league(&self, name: String) -> ApiResponse {
        let league = League {
            id: generate_id("league"),
            name,
            num_teams: self.config.league.num_teams,
            positions: self.config.league.positions.clone(),
        };
        match self.db.create_league(&league) {
            Ok(()) => {
                info!("Created league {} ({})", league.name, league.id);
                ApiResponse::League { league }
            }
            Err(e) => internal("failed to create league", e),
        }
    }

    fn get_league(&self, league_id: &str) -> ApiResponse {
        match self.db.get_league(league_id) {
            Ok(Some(league)) => ApiResponse::League { league },
            Ok(None) => not_found("league", league_id),
            Err(e) => internal("failed to load league", e),
        }
    }

    fn list_leagues(&self) -> ApiResponse {
        match self.db.list_leagues() {
            Ok(leagues) => ApiResponse::Leagues { leagues },
            Err(e) => internal("failed to list leagues", e),
        }
    }

    fn join_league(&self, league_id: &str, team_name: &str, owner: &str) -> ApiResponse {
        let league = match self.db.get_league(league_id) {
            Ok(Some(l)) => l,
            Ok(None) => return not_found("league", league_id),
            Err(e) => return internal("failed to load league", e),
        };

        let existing = match self.db.list_teams(league_id) {
            Ok(teams) => teams,
            Err(e) => return internal("failed to list teams", e),
        };
        if existing.len() >= league.num_teams {
            return ApiResponse::error(
                "league_full",
                format!("league already has {} teams", league.num_teams),
            );
        }
        if existing.iter().any(|t| t.name == team_name) {
            return ApiResponse::error(
                "name_taken",
                format!("team name '{team_name}' already in use in this league"),
            );
        }

        let team = Team {
            id: generate_id("team"),
            league_id: league_id.to_string(),
            name: team_name.to_string(),
            owner: owner.to_string(),
        };
        match self.db.create_team(&team) {
            Ok(()) => {
                info!("Team {} joined league {}", team.name, league_id);
                ApiResponse::Team { team }
            }
            Err(e) => internal("failed to create team", e),
        }
    }

    fn list_teams(&self, league_id: &str) -> ApiResponse {
        match self.db.get_league(league_id) {
            Ok(Some(_)) => {}
            Ok(None) => return not_found("league", league_id),
            Err(e) => return internal("failed to load league", e),
        }
        match self.db.list_teams(league_id) {
            Ok(teams) => ApiResponse::Teams { teams },
            Err(e) => internal("failed to list teams", e),
        }
    }

    // ------------------------------------------------------------------
    // Players and scoring
    // ------------------------------------------------------------------

    fn list_players(&self, player_type: Option<&str>) -> ApiResponse {
        match self.db.list_players(player_type) {
            Ok(players) => ApiResponse::Players { players },
            Err(e) => internal("failed to list players", e),
        }
    }

    fn player_points(&self, player_id: i64) -> ApiResponse {
        let player = match self.db.get_player(player_id) {
            Ok(Some(p)) => p,
            Ok(None) => return not_found("player", &player_id.to_string()),
            Err(e) => return internal("failed to load player", e),
        };
        let rows = match self.db.player_stats(player_id) {
            Ok(rows) => rows,
            Err(e) => return internal("failed to load stats", e),
        };
        let points =
            scoring::points_from_rows(&rows, &self.config.league.scoring, &player.player_type);
        ApiResponse::Points { player_id, points }
    }

    // ------------------------------------------------------------------
    // Rosters
    // ------------------------------------------------------------------

    fn add_to_roster(&self, team_id: &str, player_id: i64) -> ApiResponse {
        let team = match self.db.get_team(team_id) {
            Ok(Some(t)) => t,
            Ok(None) => return not_found("team", team_id),
            Err(e) => return internal("failed to load team", e),
        };
        let player = match self.db.get_player(player_id) {
            Ok(Some(p)) => p,
            Ok(None) => return not_found("player", &player_id.to_string()),
            Err(e) => return internal("failed to load player", e),
        };
        let league = match self.db.get_league(&team.league_id) {
            Ok(Some(l)) => l,
            Ok(None) => return not_found("league", &team.league_id),
            Err(e) => return internal("failed to load league", e),
        };

        let slot = match self.roster_slot_for(&league.positions, team_id, &player) {
            Ok(Some(slot)) => slot,
            Ok(None) => {
                return ApiResponse::error(
                    "roster_full",
                    format!("no open slot on team {team_id} for {}", player.name),
                )
            }
            Err(e) => return internal("failed to compute roster slot", e),
        };

        match self.db.add_to_roster(team_id, player_id, slot.display_str()) {
            Ok(true) => self.get_roster(team_id),
            Ok(false) => ApiResponse::error(
                "already_rostered",
                format!("player {player_id} is already on team {team_id}"),
            ),
            Err(e) => internal("failed to add roster row", e),
        }
    }

    fn drop_from_roster(&self, team_id: &str, player_id: i64) -> ApiResponse {
        match self.db.remove_from_roster(team_id, player_id) {
            Ok(true) => ApiResponse::Dropped {
                team_id: team_id.to_string(),
                player_id,
            },
            Ok(false) => ApiResponse::error(
                "not_found",
                format!("player {player_id} is not on team {team_id}"),
            ),
            Err(e) => internal("failed to remove roster row", e),
        }
    }

    fn get_roster(&self, team_id: &str) -> ApiResponse {
        match self.db.get_team(team_id) {
            Ok(Some(_)) => {}
            Ok(None) => return not_found("team", team_id),
            Err(e) => return internal("failed to load team", e),
        }
        match self.db.load_roster(team_id) {
            Ok(entries) => ApiResponse::Roster {
                team_id: team_id.to_string(),
                entries,
            },
            Err(e) => internal("failed to load roster", e),
        }
    }

    /// Choose the roster slot for a player joining a team: rebuild the
    /// team's roster from stored assignments, then place by eligibility.
    fn roster_slot_for(
        &self,
        league_positions: &HashMap<String, usize>,
        team_id: &str,
        player: &Player,
    ) -> anyhow::Result<Option<Position>> {
        let mut roster = Roster::new(league_positions);
        for entry in self.db.load_roster(team_id)? {
            if let Some(pos) = Position::from_str_pos(&entry.slot) {
                roster.occupy(
                    pos,
                    RosteredPlayer {
                        player_id: entry.player_id,
                        name: entry.name,
                    },
                );
            }
        }
        let eligible: Vec<Position> = player
            .positions
            .iter()
            .filter_map(|p| Position::from_str_pos(p))
            .collect();
        Ok(roster.place(
            RosteredPlayer {
                player_id: player.id,
                name: player.name.clone(),
            },
            &eligible,
        ))
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    fn create_draft(&self, league_id: &str) -> ApiResponse {
        let league = match self.db.get_league(league_id) {
            Ok(Some(l)) => l,
            Ok(None) => return not_found("league", league_id),
            Err(e) => return internal("failed to load league", e),
        };
        let teams = match self.db.list_teams(league_id) {
            Ok(teams) => teams,
            Err(e) => return internal("failed to list teams", e),
        };
        if teams.len() < league.num_teams {
            return ApiResponse::error(
                "league_not_full",
                format!(
                    "league has {}/{} teams; drafts are created once every seat is filled",
                    teams.len(),
                    league.num_teams
                ),
            );
        }

        let rounds: usize = league.positions.values().sum();
        let team_ids: Vec<String> = teams.into_iter().map(|t| t.id).collect();
        let order = snake_order(&team_ids, rounds);

        let draft = Draft::scheduled(generate_id("draft"), league_id.to_string());
        match self.db.create_draft(&draft, &order) {
            Ok(()) => {
                info!(
                    "Created draft {} for league {league_id} ({} picks)",
                    draft.id,
                    order.len()
                );
                ApiResponse::Draft {
                    draft: DraftView::from_draft(&draft, order.len()),
                }
            }
            Err(e) => internal("failed to create draft", e),
        }
    }

    fn start_draft(&self, draft_id: &str) -> ApiResponse {
        let (draft, order) = match self.db.get_draft(draft_id) {
            Ok(Some(x)) => x,
            Ok(None) => return not_found("draft", draft_id),
            Err(e) => return internal("failed to load draft", e),
        };
        if draft.status != DraftStatus::Scheduled {
            return ApiResponse::error(
                "invalid_status",
                format!("draft is {}, only scheduled drafts start", draft.status.as_str()),
            );
        }
        let Some(first_team) = team_for_pick(&order, 1) else {
            return ApiResponse::error("invalid_status", "draft order is empty");
        };

        match self.db.start_draft(draft_id, first_team) {
            Ok(true) => {
                info!("Draft {draft_id} started; {first_team} is on the clock");
                let started = Draft {
                    status: DraftStatus::InProgress,
                    current_pick: 1,
                    current_team_id: Some(first_team.to_string()),
                    ..draft
                };
                ApiResponse::Draft {
                    draft: DraftView::from_draft(&started, order.len()),
                }
            }
            Ok(false) => ApiResponse::error("conflict", "draft was started concurrently"),
            Err(e) => internal("failed to start draft", e),
        }
    }

    fn cancel_draft(&self, draft_id: &str) -> ApiResponse {
        let (draft, order) = match self.db.get_draft(draft_id) {
            Ok(Some(x)) => x,
            Ok(None) => return not_found("draft", draft_id),
            Err(e) => return internal("failed to load draft", e),
        };
        match self.db.cancel_draft(draft_id) {
            Ok(true) => {
                info!("Draft {draft_id} cancelled");
                let cancelled = Draft {
                    status: DraftStatus::Cancelled,
                    current_team_id: None,
                    ..draft
                };
                ApiResponse::Draft {
                    draft: DraftView::from_draft(&cancelled, order.len()),
                }
            }
            Ok(false) => ApiResponse::error(
                "invalid_status",
                format!("draft is {}, a terminal state", draft.status.as_str()),
            ),
            Err(e) => internal("failed to cancel draft", e),
        }
    }

    fn get_draft(&self, draft_id: &str) -> ApiResponse {
        match self.db.get_draft(draft_id) {
            Ok(Some((draft, order))) => ApiResponse::Draft {
                draft: DraftView::from_draft(&draft, order.len()),
            },
            Ok(None) => not_found("draft", draft_id),
            Err(e) => internal("failed to load draft", e),
        }
    }

    /// The composite pick operation: engine decision first, then the
    /// guarded three-write transaction. A rejected pick writes nothing.
    fn make_pick(&self, draft_id: &str, team_id: &str, player_id: i64) -> ApiResponse {
        let (draft, order) = match self.db.get_draft(draft_id) {
            Ok(Some(x)) => x,
            Ok(None) => return not_found("draft", draft_id),
            Err(e) => return internal("failed to load draft", e),
        };
        let player = match self.db.get_player(player_id) {
            Ok(Some(p)) => p,
            Ok(None) => return not_found("player", &player_id.to_string()),
            Err(e) => return internal("failed to load player", e),
        };
        let already_picked = match self.db.is_player_drafted(draft_id, player_id) {
            Ok(b) => b,
            Err(e) => return internal("failed to check picked players", e),
        };

        let outcome =
            match engine::validate_and_advance(&draft, &order, team_id, player_id, |_| {
                already_picked
            }) {
                Ok(outcome) => outcome,
                Err(err @ PickError::TurnMismatch { .. }) => {
                    // Unlike the other rejections this one means the stored
                    // draft row contradicts its own order.
                    warn!("Draft {draft_id} state mismatch: {err}");
                    return ApiResponse::error(pick_error_code(&err), err.to_string());
                }
                Err(err) => {
                    info!("Rejected pick on draft {draft_id}: {err}");
                    return ApiResponse::error(pick_error_code(&err), err.to_string());
                }
            };

        let league = match self.db.get_league(&draft.league_id) {
            Ok(Some(l)) => l,
            Ok(None) => return not_found("league", &draft.league_id),
            Err(e) => return internal("failed to load league", e),
        };
        let slot = match self.roster_slot_for(&league.positions, team_id, &player) {
            Ok(Some(slot)) => slot,
            Ok(None) => {
                return ApiResponse::error(
                    "roster_full",
                    format!("no open slot on team {team_id} for {}", player.name),
                )
            }
            Err(e) => return internal("failed to compute roster slot", e),
        };

        match self.db.apply_pick(&outcome, slot.display_str()) {
            Ok(true) => {
                info!(
                    "Pick #{} in draft {draft_id}: {} -> {} ({})",
                    outcome.pick.pick_number,
                    player.name,
                    team_id,
                    slot.display_str()
                );
                ApiResponse::PickAccepted {
                    pick: outcome.pick.clone(),
                    draft: DraftView::from_draft(&outcome.next, order.len()),
                }
            }
            Ok(false) => {
                warn!("Draft {draft_id} advanced concurrently; pick by {team_id} rejected");
                ApiResponse::error("conflict", "draft advanced concurrently; refetch and retry")
            }
            Err(e) => internal("failed to persist pick", e),
        }
    }

    fn list_picks(&self, draft_id: &str) -> ApiResponse {
        match self.db.get_draft(draft_id) {
            Ok(Some(_)) => {}
            Ok(None) => return not_found("draft", draft_id),
            Err(e) => return internal("failed to load draft", e),
        }
        match self.db.load_picks(draft_id) {
            Ok(picks) => ApiResponse::Picks { picks },
            Err(e) => internal("failed to load picks", e),
        }
    }
}

fn not_found(kind: &str, id: &str) -> ApiResponse {
    ApiResponse::error("not_found", format!("no such {kind}: {id}"))
}

fn internal(context: &str, err: anyhow::Error) -> ApiResponse {
    warn!("{context}: {err:#}");
    ApiResponse::error("internal", context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataPaths, GoalieWeights, LeagueConfig, ScoringConfig, SkaterWeights};

    /// Build a test-ready Config with inline league settings (no files):
    /// two-team league with a one-center, one-goalie roster, so a full
    /// draft is four picks.
    fn inline_config() -> Config {
        let mut positions = HashMap::new();
        positions.insert("C".to_string(), 1);
        positions.insert("G".to_string(), 1);

        Config {
            league: LeagueConfig {
                name: "Test League".into(),
                num_teams: 2,
                positions,
                scoring: ScoringConfig {
                    skater: SkaterWeights {
                        goals: 3.0,
                        assists: 2.0,
                        plus_minus: 0.5,
                        shots: 0.4,
                        hits: 0.3,
                        blocks: 0.4,
                        powerplay_points: 0.5,
                    },
                    goalie: GoalieWeights {
                        wins: 4.0,
                        saves: 0.2,
                        goals_against: -1.0,
                        shutouts: 3.0,
                    },
                },
            },
            ws_port: 0,
            db_path: ":memory:".into(),
            data_paths: DataPaths {
                skaters: "unused".into(),
                goalies: "unused".into(),
            },
        }
    }

    fn test_app() -> App {
        App::new(
            inline_config(),
            Database::open(":memory:").expect("in-memory database should open"),
        )
    }

    /// Helper: create a league through the API and return its id.
    fn make_league(app: &App) -> String {
        match app.handle_request(ApiRequest::CreateLeague {
            name: "Stanley Cup Chasers".into(),
        }) {
            ApiResponse::League { league } => league.id,
            other => panic!("expected League response, got {other:?}"),
        }
    }

    /// Helper: join a team and return its id.
    fn join(app: &App, league_id: &str, name: &str) -> String {
        match app.handle_request(ApiRequest::JoinLeague {
            league_id: league_id.to_string(),
            team_name: name.to_string(),
            owner: format!("{name} owner"),
        }) {
            ApiResponse::Team { team } => team.id,
            other => panic!("expected Team response, got {other:?}"),
        }
    }

    /// Helper: seed two skaters and two goalies, returning their ids.
    fn seed_players(app: &App) -> Vec<i64> {
        let mut ids = Vec::new();
        for (name, pos, ptype) in [
            ("Skater One", "C", "skater"),
            ("Skater Two", "C", "skater"),
            ("Goalie One", "G", "goalie"),
            ("Goalie Two", "G", "goalie"),
        ] {
            ids.push(
                app.db
                    .upsert_player(name, "EDM", &[pos.to_string()], ptype)
                    .unwrap(),
            );
        }
        ids
    }

    /// Helper: league with both teams joined and a scheduled draft.
    fn league_with_draft(app: &App) -> (String, String, String, String) {
        let league_id = make_league(app);
        let team_a = join(app, &league_id, "Icemen");
        let team_b = join(app, &league_id, "Blades");
        let draft_id = match app.handle_request(ApiRequest::CreateDraft {
            league_id: league_id.clone(),
        }) {
            ApiResponse::Draft { draft } => draft.id,
            other => panic!("expected Draft response, got {other:?}"),
        };
        (league_id, team_a, team_b, draft_id)
    }

    fn expect_error(resp: ApiResponse, code: &str) {
        match resp {
            ApiResponse::Error { code: c, .. } => assert_eq!(c, code),
            other => panic!("expected error '{code}', got {other:?}"),
        }
    }

    // -- leagues and teams --

    #[test]
    fn create_league_uses_config_settings() {
        let app = test_app();
        match app.handle_request(ApiRequest::CreateLeague { name: "L".into() }) {
            ApiResponse::League { league } => {
                assert_eq!(league.num_teams, 2);
                assert_eq!(league.positions.get("C"), Some(&1));
            }
            other => panic!("expected League, got {other:?}"),
        }
    }

    #[test]
    fn join_rejected_when_league_full() {
        let app = test_app();
        let league_id = make_league(&app);
        join(&app, &league_id, "Icemen");
        join(&app, &league_id, "Blades");
        let resp = app.handle_request(ApiRequest::JoinLeague {
            league_id,
            team_name: "Third Wheel".into(),
            owner: "nobody".into(),
        });
        expect_error(resp, "league_full");
    }

    #[test]
    fn join_rejected_on_duplicate_name() {
        let app = test_app();
        let league_id = make_league(&app);
        join(&app, &league_id, "Icemen");
        let resp = app.handle_request(ApiRequest::JoinLeague {
            league_id,
            team_name: "Icemen".into(),
            owner: "imposter".into(),
        });
        expect_error(resp, "name_taken");
    }

    #[test]
    fn unknown_league_is_not_found() {
        let app = test_app();
        expect_error(
            app.handle_request(ApiRequest::GetLeague {
                league_id: "league_missing".into(),
            }),
            "not_found",
        );
        expect_error(
            app.handle_request(ApiRequest::ListTeams {
                league_id: "league_missing".into(),
            }),
            "not_found",
        );
    }

    // -- scoring --

    #[test]
    fn player_points_uses_configured_weights() {
        let app = test_app();
        let pid = app
            .db
            .import_player(
                "Sniper",
                "EDM",
                &["C".to_string()],
                "skater",
                &[("goals", 10.0), ("assists", 5.0)],
            )
            .unwrap();
        match app.handle_request(ApiRequest::PlayerPoints { player_id: pid }) {
            ApiResponse::Points { points, .. } => {
                assert!((points - 40.0).abs() < 1e-9); // 10*3 + 5*2
            }
            other => panic!("expected Points, got {other:?}"),
        }
    }

    // -- rosters --

    #[test]
    fn roster_add_places_and_rejects_duplicates() {
        let app = test_app();
        let league_id = make_league(&app);
        let team = join(&app, &league_id, "Icemen");
        let players = seed_players(&app);

        match app.handle_request(ApiRequest::AddToRoster {
            team_id: team.clone(),
            player_id: players[0],
        }) {
            ApiResponse::Roster { entries, .. } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].slot, "C");
            }
            other => panic!("expected Roster, got {other:?}"),
        }

        expect_error(
            app.handle_request(ApiRequest::AddToRoster {
                team_id: team.clone(),
                player_id: players[0],
            }),
            "already_rostered",
        );
    }

    #[test]
    fn roster_overflow_is_rejected() {
        let app = test_app();
        let league_id = make_league(&app);
        let team = join(&app, &league_id, "Icemen");
        let players = seed_players(&app);

        // Roster is 1 C + 1 G; a second goalie has nowhere to go (goalies
        // never take UTIL and this league has no bench).
        app.handle_request(ApiRequest::AddToRoster {
            team_id: team.clone(),
            player_id: players[2],
        });
        expect_error(
            app.handle_request(ApiRequest::AddToRoster {
                team_id: team.clone(),
                player_id: players[3],
            }),
            "roster_full",
        );
    }

    #[test]
    fn drop_from_roster_round_trip() {
        let app = test_app();
        let league_id = make_league(&app);
        let team = join(&app, &league_id, "Icemen");
        let players = seed_players(&app);

        app.handle_request(ApiRequest::AddToRoster {
            team_id: team.clone(),
            player_id: players[0],
        });
        match app.handle_request(ApiRequest::DropFromRoster {
            team_id: team.clone(),
            player_id: players[0],
        }) {
            ApiResponse::Dropped { player_id, .. } => assert_eq!(player_id, players[0]),
            other => panic!("expected Dropped, got {other:?}"),
        }
        expect_error(
            app.handle_request(ApiRequest::DropFromRoster {
                team_id: team,
                player_id: players[0],
            }),
            "not_found",
        );
    }

    // -- drafts --

    #[test]
    fn create_draft_requires_full_league() {
        let app = test_app();
        let league_id = make_league(&app);
        join(&app, &league_id, "Icemen");
        expect_error(
            app.handle_request(ApiRequest::CreateDraft {
                league_id: league_id.clone(),
            }),
            "league_not_full",
        );
    }

    #[test]
    fn created_draft_is_scheduled_with_snake_length() {
        let app = test_app();
        let (_, _, _, draft_id) = league_with_draft(&app);
        match app.handle_request(ApiRequest::GetDraft { draft_id }) {
            ApiResponse::Draft { draft } => {
                assert_eq!(draft.status, DraftStatus::Scheduled);
                // 2 teams x 2 roster slots
                assert_eq!(draft.total_picks, 4);
                assert_eq!(draft.current_pick, 0);
                assert!(draft.current_team_id.is_none());
            }
            other => panic!("expected Draft, got {other:?}"),
        }
    }

    #[test]
    fn start_draft_puts_first_joiner_on_clock() {
        let app = test_app();
        let (_, team_a, _, draft_id) = league_with_draft(&app);
        match app.handle_request(ApiRequest::StartDraft { draft_id }) {
            ApiResponse::Draft { draft } => {
                assert_eq!(draft.status, DraftStatus::InProgress);
                assert_eq!(draft.current_pick, 1);
                assert_eq!(draft.current_team_id.as_deref(), Some(team_a.as_str()));
            }
            other => panic!("expected Draft, got {other:?}"),
        }
    }

    #[test]
    fn start_draft_twice_is_invalid() {
        let app = test_app();
        let (_, _, _, draft_id) = league_with_draft(&app);
        app.handle_request(ApiRequest::StartDraft {
            draft_id: draft_id.clone(),
        });
        expect_error(
            app.handle_request(ApiRequest::StartDraft { draft_id }),
            "invalid_status",
        );
    }

    #[test]
    fn cancel_draft_is_terminal() {
        let app = test_app();
        let (_, _, _, draft_id) = league_with_draft(&app);
        match app.handle_request(ApiRequest::CancelDraft {
            draft_id: draft_id.clone(),
        }) {
            ApiResponse::Draft { draft } => assert_eq!(draft.status, DraftStatus::Cancelled),
            other => panic!("expected Draft, got {other:?}"),
        }
        expect_error(
            app.handle_request(ApiRequest::CancelDraft { draft_id }),
            "invalid_status",
        );
    }

    #[test]
    fn pick_before_start_is_not_in_progress() {
        let app = test_app();
        let (_, team_a, _, draft_id) = league_with_draft(&app);
        let players = seed_players(&app);
        expect_error(
            app.handle_request(ApiRequest::MakePick {
                draft_id,
                team_id: team_a,
                player_id: players[0],
            }),
            "not_in_progress",
        );
    }

    #[test]
    fn full_snake_draft_through_completion() {
        let app = test_app();
        let (_, team_a, team_b, draft_id) = league_with_draft(&app);
        let players = seed_players(&app);
        app.handle_request(ApiRequest::StartDraft {
            draft_id: draft_id.clone(),
        });

        // Snake order over 2 rounds: a, b, b, a.
        let script = [
            (&team_a, players[0]),
            (&team_b, players[1]),
            (&team_b, players[2]),
            (&team_a, players[3]),
        ];
        for (i, (team, player)) in script.iter().enumerate() {
            match app.handle_request(ApiRequest::MakePick {
                draft_id: draft_id.clone(),
                team_id: (*team).clone(),
                player_id: *player,
            }) {
                ApiResponse::PickAccepted { pick, draft } => {
                    assert_eq!(pick.pick_number as usize, i + 1);
                    assert_eq!(draft.current_pick as usize, i + 2);
                }
                other => panic!("pick {} failed: {other:?}", i + 1),
            }
        }

        match app.handle_request(ApiRequest::GetDraft {
            draft_id: draft_id.clone(),
        }) {
            ApiResponse::Draft { draft } => {
                assert_eq!(draft.status, DraftStatus::Completed);
                assert!(draft.current_team_id.is_none());
                assert!(draft.completed_at.is_some());
            }
            other => panic!("expected Draft, got {other:?}"),
        }

        // Both rosters filled by the draft.
        match app.handle_request(ApiRequest::GetRoster { team_id: team_a }) {
            ApiResponse::Roster { entries, .. } => assert_eq!(entries.len(), 2),
            other => panic!("expected Roster, got {other:?}"),
        }

        match app.handle_request(ApiRequest::ListPicks { draft_id }) {
            ApiResponse::Picks { picks } => {
                assert_eq!(picks.len(), 4);
                let numbers: Vec<u32> = picks.iter().map(|p| p.pick_number).collect();
                assert_eq!(numbers, vec![1, 2, 3, 4]);
            }
            other => panic!("expected Picks, got {other:?}"),
        }
    }

    #[test]
    fn out_of_turn_and_duplicate_picks_rejected() {
        let app = test_app();
        let (_, team_a, team_b, draft_id) = league_with_draft(&app);
        let players = seed_players(&app);
        app.handle_request(ApiRequest::StartDraft {
            draft_id: draft_id.clone(),
        });

        // team_b jumps the queue.
        expect_error(
            app.handle_request(ApiRequest::MakePick {
                draft_id: draft_id.clone(),
                team_id: team_b.clone(),
                player_id: players[0],
            }),
            "not_your_turn",
        );

        app.handle_request(ApiRequest::MakePick {
            draft_id: draft_id.clone(),
            team_id: team_a,
            player_id: players[0],
        });

        // team_b tries the player team_a just took.
        expect_error(
            app.handle_request(ApiRequest::MakePick {
                draft_id,
                team_id: team_b,
                player_id: players[0],
            }),
            "player_already_drafted",
        );
    }

    #[test]
    fn rejected_pick_changes_nothing() {
        let app = test_app();
        let (_, _, team_b, draft_id) = league_with_draft(&app);
        let players = seed_players(&app);
        app.handle_request(ApiRequest::StartDraft {
            draft_id: draft_id.clone(),
        });

        for _ in 0..2 {
            expect_error(
                app.handle_request(ApiRequest::MakePick {
                    draft_id: draft_id.clone(),
                    team_id: team_b.clone(),
                    player_id: players[0],
                }),
                "not_your_turn",
            );
        }
        match app.handle_request(ApiRequest::GetDraft { draft_id }) {
            ApiResponse::Draft { draft } => assert_eq!(draft.current_pick, 1),
            other => panic!("expected Draft, got {other:?}"),
        }
    }

    #[test]
    fn pick_with_unknown_player_is_not_found() {
        let app = test_app();
        let (_, team_a, _, draft_id) = league_with_draft(&app);
        app.handle_request(ApiRequest::StartDraft {
            draft_id: draft_id.clone(),
        });
        expect_error(
            app.handle_request(ApiRequest::MakePick {
                draft_id,
                team_id: team_a,
                player_id: 9999,
            }),
            "not_found",
        );
    }

    // -- raw frame handling --

    #[test]
    fn handle_text_round_trips_json() {
        let app = test_app();
        let response = app.handle_text(r#"{"type":"list_leagues"}"#);
        let parsed: ApiResponse = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed, ApiResponse::Leagues { leagues: vec![] });
    }

    #[test]
    fn handle_text_rejects_garbage() {
        let app = test_app();
        let response = app.handle_text("not json at all");
        let parsed: ApiResponse = serde_json::from_str(&response).unwrap();
        match parsed {
            ApiResponse::Error { code, .. } => assert_eq!(code, "invalid_request"),
            other => panic!("expected error, got {other:?}"),
        }
    }
}

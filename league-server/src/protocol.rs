// JSON wire protocol between API clients and the server.
//
// One request per WebSocket text frame, one JSON response per request.
// Both enums are internally tagged on "type" so payloads read naturally:
// {"type":"make_pick","draft_id":"...","team_id":"...","player_id":42}

use serde::{Deserialize, Serialize};

use crate::db::{League, Player, RosterEntry, Team};
use crate::draft::pick::{DraftPick, PickError};
use crate::draft::state::{Draft, DraftStatus};

/// Every operation a client can request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiRequest {
    CreateLeague {
        name: String,
    },
    GetLeague {
        league_id: String,
    },
    ListLeagues,
    /// Create a team in a league. Rejected once the league is full.
    JoinLeague {
        league_id: String,
        team_name: String,
        owner: String,
    },
    ListTeams {
        league_id: String,
    },
    ListPlayers {
        #[serde(default)]
        player_type: Option<String>,
    },
    PlayerPoints {
        player_id: i64,
    },
    AddToRoster {
        team_id: String,
        player_id: i64,
    },
    DropFromRoster {
        team_id: String,
        player_id: i64,
    },
    GetRoster {
        team_id: String,
    },
    /// Compute and freeze the snake order for a league's draft.
    CreateDraft {
        league_id: String,
    },
    StartDraft {
        draft_id: String,
    },
    /// Administrative cancellation; terminal from any non-completed state.
    CancelDraft {
        draft_id: String,
    },
    GetDraft {
        draft_id: String,
    },
    MakePick {
        draft_id: String,
        team_id: String,
        player_id: i64,
    },
    ListPicks {
        draft_id: String,
    },
}

/// Draft state as exposed to clients: the mutable row plus the fixed
/// length of its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftView {
    pub id: String,
    pub league_id: String,
    pub status: DraftStatus,
    pub current_pick: u32,
    pub current_team_id: Option<String>,
    pub total_picks: usize,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl DraftView {
    pub fn from_draft(draft: &Draft, total_picks: usize) -> Self {
        DraftView {
            id: draft.id.clone(),
            league_id: draft.league_id.clone(),
            status: draft.status,
            current_pick: draft.current_pick,
            current_team_id: draft.current_team_id.clone(),
            total_picks,
            completed_at: draft.completed_at,
        }
    }
}

/// Every response the server can return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiResponse {
    League {
        league: League,
    },
    Leagues {
        leagues: Vec<League>,
    },
    Team {
        team: Team,
    },
    Teams {
        teams: Vec<Team>,
    },
    Players {
        players: Vec<Player>,
    },
    Points {
        player_id: i64,
        points: f64,
    },
    Roster {
        team_id: String,
        entries: Vec<RosterEntry>,
    },
    Dropped {
        team_id: String,
        player_id: i64,
    },
    Draft {
        draft: DraftView,
    },
    PickAccepted {
        pick: DraftPick,
        draft: DraftView,
    },
    Picks {
        picks: Vec<DraftPick>,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ApiResponse {
    /// Build an error response with a stable machine-readable code.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ApiResponse::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// The stable wire code for each pick rejection. An HTTP gateway fronting
/// this server would map not_your_turn to 403, the rest of the pick codes
/// to 400 family statuses.
pub fn pick_error_code(err: &PickError) -> &'static str {
    match err {
        PickError::NotInProgress => "not_in_progress",
        PickError::NoCurrentTeam => "no_current_team",
        PickError::NotYourTurn { .. } => "not_your_turn",
        PickError::TurnMismatch { .. } => "turn_mismatch",
        PickError::PlayerAlreadyDrafted { .. } => "player_already_drafted",
    }
}

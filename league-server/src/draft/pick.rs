// Pick records and the pick rejection taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single accepted draft selection. Immutable once recorded: the set of
/// picks for a draft has pairwise-distinct pick numbers and player ids
/// (enforced by the draft_picks schema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    /// Sequential pick number (1-indexed).
    pub pick_number: u32,
    /// ID of the team that made the selection.
    pub team_id: String,
    /// Database ID of the drafted player.
    pub player_id: i64,
    /// When the pick was accepted.
    pub timestamp: DateTime<Utc>,
}

/// Why a pick request was rejected. All variants are expected, recoverable
/// conditions returned to the caller as values; none aborts the server.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PickError {
    /// The draft is scheduled, completed, or cancelled.
    #[error("draft is not in progress")]
    NotInProgress,

    /// The draft row has no team on the clock.
    #[error("draft has no team on the clock")]
    NoCurrentTeam,

    /// A team tried to pick out of turn.
    #[error("team {requesting} is not on the clock (current team: {current})")]
    NotYourTurn { requesting: String, current: String },

    /// The stored current team disagrees with what the draft order predicts
    /// for the current pick. Signals corrupted or stale draft state, not a
    /// user error, and is logged separately from the other rejections.
    #[error("draft order expects {expected:?} at pick {pick} but draft state says {stored}")]
    TurnMismatch {
        pick: u32,
        expected: Option<String>,
        stored: String,
    },

    /// The requested player already has a pick in this draft.
    #[error("player {player_id} has already been drafted")]
    PlayerAlreadyDrafted { player_id: i64 },
}

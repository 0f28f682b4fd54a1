// Draft turn engine: whose turn is it, is this pick legal, what comes next.
//
// Every function here is pure computation over a draft row and its
// flattened order. Persisting the outcome (pick row, updated draft row,
// roster row) is the caller's job and must happen in one transaction; see
// Database::apply_pick.

use chrono::Utc;

use super::pick::{DraftPick, PickError};
use super::state::{Draft, DraftStatus};

/// The team on the clock for a given 1-based pick number.
///
/// Out-of-range pick numbers (0, or past the end of the order) yield
/// `None`: the draft has not started or has exhausted its order. That is a
/// defined result, not an error.
pub fn team_for_pick(order: &[String], pick_number: u32) -> Option<&str> {
    if pick_number == 0 {
        return None;
    }
    order.get(pick_number as usize - 1).map(String::as_str)
}

/// The result of an accepted pick: the record to insert and the draft row
/// to store in its place.
#[derive(Debug, Clone, PartialEq)]
pub struct PickOutcome {
    pub pick: DraftPick,
    pub next: Draft,
}

/// Validate a pick request against the draft state and, if legal, compute
/// the accepted pick and the advanced draft state.
///
/// Preconditions are checked in order, short-circuiting on the first
/// failure; each maps to one [`PickError`] variant. On success the next
/// state advances `current_pick` by exactly one, puts the next team in the
/// order on the clock, and completes the draft when the order is exhausted.
///
/// No side effects: nothing is persisted here, and a rejected request
/// leaves every input untouched, so resubmitting the same request yields
/// the same rejection.
pub fn validate_and_advance(
    draft: &Draft,
    order: &[String],
    requesting_team_id: &str,
    player_id: i64,
    already_picked: impl Fn(i64) -> bool,
) -> Result<PickOutcome, PickError> {
    if draft.status != DraftStatus::InProgress {
        return Err(PickError::NotInProgress);
    }

    let current_team = match draft.current_team_id.as_deref() {
        Some(t) => t,
        None => return Err(PickError::NoCurrentTeam),
    };

    if requesting_team_id != current_team {
        return Err(PickError::NotYourTurn {
            requesting: requesting_team_id.to_string(),
            current: current_team.to_string(),
        });
    }

    // Consistency check: the stored team on the clock must match what the
    // order predicts for the stored pick number. A mismatch means the draft
    // row is corrupted or stale.
    let expected = team_for_pick(order, draft.current_pick);
    if expected != Some(current_team) {
        return Err(PickError::TurnMismatch {
            pick: draft.current_pick,
            expected: expected.map(str::to_string),
            stored: current_team.to_string(),
        });
    }

    if already_picked(player_id) {
        return Err(PickError::PlayerAlreadyDrafted { player_id });
    }

    let now = Utc::now();
    let pick = DraftPick {
        pick_number: draft.current_pick,
        team_id: current_team.to_string(),
        player_id,
        timestamp: now,
    };

    let next_pick = draft.current_pick + 1;
    let is_complete = next_pick as usize > order.len();
    let next = Draft {
        id: draft.id.clone(),
        league_id: draft.league_id.clone(),
        status: if is_complete {
            DraftStatus::Completed
        } else {
            DraftStatus::InProgress
        },
        current_pick: next_pick,
        current_team_id: team_for_pick(order, next_pick).map(str::to_string),
        completed_at: if is_complete { Some(now) } else { None },
    };

    Ok(PickOutcome { pick, next })
}

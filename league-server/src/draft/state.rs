// Draft row state and its status machine.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a draft.
///
/// `Scheduled -> InProgress -> Completed`, with `Cancelled` as a terminal
/// side-exit from any non-completed state. Cancellation is an external
/// administrative action; the engine only ever moves a draft forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl DraftStatus {
    /// Status code stored in the drafts table.
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Scheduled => "scheduled",
            DraftStatus::InProgress => "in_progress",
            DraftStatus::Completed => "completed",
            DraftStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored status code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(DraftStatus::Scheduled),
            "in_progress" => Some(DraftStatus::InProgress),
            "completed" => Some(DraftStatus::Completed),
            "cancelled" => Some(DraftStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftStatus::Completed | DraftStatus::Cancelled)
    }
}

/// The mutable state of one draft. `current_pick` advances by exactly one
/// per accepted pick; `current_team_id` is `None` before the draft starts
/// and after the order is exhausted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub league_id: String,
    pub status: DraftStatus,
    pub current_pick: u32,
    pub current_team_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Draft {
    /// A freshly created draft, waiting to be started.
    pub fn scheduled(id: String, league_id: String) -> Self {
        Draft {
            id,
            league_id,
            status: DraftStatus::Scheduled,
            current_pick: 0,
            current_team_id: None,
            completed_at: None,
        }
    }
}

static ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a unique identifier with the given prefix, e.g.
/// `draft_20260806143022123_0004`. The timestamp makes ids sortable by
/// creation time; the process-level sequence keeps ids minted in the same
/// millisecond distinct.
pub fn generate_id(prefix: &str) -> String {
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{prefix}_{}_{seq:04}",
        Utc::now().format("%Y%m%d%H%M%S%3f")
    )
}

// Roster slots and player placement.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hockey roster positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Center,
    LeftWing,
    RightWing,
    Defense,
    Utility,
    Goalie,
    Bench,
}

impl Position {
    /// Parse a position string ("C", "LW", "RW", "D", "UTIL", "G", "BN").
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" => Some(Position::Center),
            "LW" => Some(Position::LeftWing),
            "RW" => Some(Position::RightWing),
            "D" => Some(Position::Defense),
            "UTIL" => Some(Position::Utility),
            "G" => Some(Position::Goalie),
            "BN" | "BE" => Some(Position::Bench),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Center => "C",
            Position::LeftWing => "LW",
            Position::RightWing => "RW",
            Position::Defense => "D",
            Position::Utility => "UTIL",
            Position::Goalie => "G",
            Position::Bench => "BN",
        }
    }

    /// Whether this is a skater position. Goalies never occupy the UTIL
    /// slot; bench takes anyone.
    pub fn is_skater(&self) -> bool {
        matches!(
            self,
            Position::Center
                | Position::LeftWing
                | Position::RightWing
                | Position::Defense
                | Position::Utility
        )
    }

    /// Deterministic ordering index for roster display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Center => 0,
            Position::LeftWing => 1,
            Position::RightWing => 2,
            Position::Defense => 3,
            Position::Utility => 4,
            Position::Goalie => 5,
            Position::Bench => 6,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player occupying a roster slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosteredPlayer {
    pub player_id: i64,
    pub name: String,
}

/// A single slot on a team's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterSlot {
    pub position: Position,
    pub player: Option<RosteredPlayer>,
}

/// A team's complete roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub slots: Vec<RosterSlot>,
}

impl Roster {
    /// Build an empty roster from a position -> slot count config, e.g.
    /// `{"C": 2, "LW": 2, "RW": 2, "D": 4, "UTIL": 1, "G": 2, "BN": 3}`.
    /// Unknown position strings are skipped. Slots are ordered by
    /// `Position::sort_order` so the layout is deterministic.
    pub fn new(positions: &HashMap<String, usize>) -> Self {
        let mut slots: Vec<RosterSlot> = Vec::new();
        for (pos_str, &count) in positions {
            if let Some(pos) = Position::from_str_pos(pos_str) {
                for _ in 0..count {
                    slots.push(RosterSlot {
                        position: pos,
                        player: None,
                    });
                }
            }
        }
        slots.sort_by_key(|s| s.position.sort_order());
        Roster { slots }
    }

    /// Put a player into the first empty slot of exactly `position`.
    /// Used when rebuilding a roster from stored (player, slot) rows.
    pub fn occupy(&mut self, position: Position, player: RosteredPlayer) -> bool {
        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.position == position && s.player.is_none())
        {
            slot.player = Some(player);
            return true;
        }
        false
    }

    /// Place a player eligible at the given positions.
    ///
    /// Priority: first empty dedicated slot among the eligible positions,
    /// then UTIL (skaters only), then bench. Returns the slot used, or
    /// `None` when the roster has no room.
    pub fn place(
        &mut self,
        player: RosteredPlayer,
        eligible: &[Position],
    ) -> Option<Position> {
        for &pos in eligible {
            if let Some(slot) = self
                .slots
                .iter_mut()
                .find(|s| s.position == pos && s.player.is_none())
            {
                slot.player = Some(player);
                return Some(pos);
            }
        }

        let is_skater = eligible.iter().any(|p| p.is_skater());
        if is_skater {
            if let Some(slot) = self
                .slots
                .iter_mut()
                .find(|s| s.position == Position::Utility && s.player.is_none())
            {
                slot.player = Some(player);
                return Some(Position::Utility);
            }
        }

        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.position == Position::Bench && s.player.is_none())
        {
            slot.player = Some(player);
            return Some(Position::Bench);
        }

        None
    }

    /// Whether a player is already on this roster.
    pub fn has_player(&self, player_id: i64) -> bool {
        self.slots
            .iter()
            .any(|s| s.player.as_ref().is_some_and(|p| p.player_id == player_id))
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.player.is_some()).count()
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.player.is_none()).count()
    }

    pub fn total_count(&self) -> usize {
        self.slots.len()
    }
}

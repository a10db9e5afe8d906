// Individual pick representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single committed draft transaction.
///
/// Picks form an append-only log ordered by `pick_number`; undoing a pick
/// deletes its entry but never renumbers the rest, so numbers are unique for
/// the life of a draft even across undo and re-pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    /// Sequential pick number (1-indexed, gaps after undo).
    pub pick_number: u32,
    /// ID of the team that won the player.
    pub team_id: String,
    /// ID of the drafted player.
    pub player_id: i64,
    /// Name of the drafted player, denormalized for the log.
    pub player_name: String,
    /// Auction price paid.
    pub price: u32,
    /// When the pick was committed.
    pub timestamp: DateTime<Utc>,
}

// Draft state: team budgets and the pick/undo transaction log.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::pick::DraftPick;
use crate::config::LeagueConfig;
use crate::player::{Player, PlayerType};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A draft transaction rejected before commit. Validation happens up front;
/// a returned error means no state was changed.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("player {0} not found in the pool")]
    PlayerNotFound(i64),

    #[error("{0} has already been drafted")]
    AlreadyDrafted(String),

    #[error("{0} is not drafted")]
    NotDrafted(String),

    #[error("team `{0}` not found")]
    TeamNotFound(String),

    #[error("price ${price} is below the minimum bid of ${min_bid}")]
    BelowMinimumBid { price: u32, min_bid: u32 },

    #[error("{team} has only ${remaining} remaining (tried to spend ${price})")]
    InsufficientBudget {
        team: String,
        remaining: u32,
        price: u32,
    },

    #[error("no pick with number {0}")]
    NoSuchPick(u32),

    #[error("no picks to undo")]
    NothingToUndo,
}

// ---------------------------------------------------------------------------
// Team state
// ---------------------------------------------------------------------------

/// The state of a single team during the draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamState {
    pub team_id: String,
    pub team_name: String,
    /// Total salary spent so far.
    pub budget_spent: u32,
    /// Remaining salary cap.
    pub budget_remaining: u32,
}

// ---------------------------------------------------------------------------
// Draft state
// ---------------------------------------------------------------------------

/// The complete state of an auction draft.
///
/// Holds the teams and the ordered pick log, and flags derived player values
/// as stale after every committed transaction. It never recomputes values
/// itself; the valuation engine reads the committed state and the stale flag
/// tells callers a recalculation must run before values are trusted again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftState {
    /// All teams, sorted by team_id.
    pub teams: Vec<TeamState>,
    /// All recorded picks in pick order.
    pub picks: Vec<DraftPick>,
    /// True when a transaction has committed since the last applied epoch.
    pub values_stale: bool,
    /// Next pick number to assign; never reused, even after undo.
    next_pick: u32,
    salary_cap: u32,
    min_bid: u32,
}

impl DraftState {
    /// Create a fresh draft: one team per league seat with a full budget.
    pub fn new(league: &LeagueConfig) -> Self {
        let mut teams: Vec<TeamState> = (1..=league.num_teams)
            .map(|i| TeamState {
                team_id: format!("team_{i}"),
                team_name: format!("Team {i}"),
                budget_spent: 0,
                budget_remaining: league.budget_per_team,
            })
            .collect();
        teams.sort_by(|a, b| a.team_id.cmp(&b.team_id));

        DraftState {
            teams,
            picks: Vec::new(),
            values_stale: false,
            next_pick: 1,
            salary_cap: league.budget_per_team,
            min_bid: league.min_bid,
        }
    }

    /// Commit a pick: validate, flag the player drafted, charge the team,
    /// and append to the log.
    pub fn pick(
        &mut self,
        players: &mut [Player],
        player_id: i64,
        team_id: &str,
        price: u32,
    ) -> Result<&DraftPick, DraftError> {
        let player_idx = players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(DraftError::PlayerNotFound(player_id))?;
        if players[player_idx].is_drafted {
            return Err(DraftError::AlreadyDrafted(players[player_idx].name.clone()));
        }

        let team_idx = self
            .teams
            .iter()
            .position(|t| t.team_id == team_id)
            .ok_or_else(|| DraftError::TeamNotFound(team_id.to_string()))?;

        if price < self.min_bid {
            return Err(DraftError::BelowMinimumBid {
                price,
                min_bid: self.min_bid,
            });
        }
        if price > self.teams[team_idx].budget_remaining {
            return Err(DraftError::InsufficientBudget {
                team: self.teams[team_idx].team_name.clone(),
                remaining: self.teams[team_idx].budget_remaining,
                price,
            });
        }

        let player = &mut players[player_idx];
        player.is_drafted = true;

        let team = &mut self.teams[team_idx];
        team.budget_spent += price;
        team.budget_remaining -= price;

        let pick = DraftPick {
            pick_number: self.next_pick,
            team_id: team.team_id.clone(),
            player_id,
            player_name: player.name.clone(),
            price,
            timestamp: Utc::now(),
        };
        self.next_pick += 1;
        self.values_stale = true;

        info!(
            pick = pick.pick_number,
            player = %pick.player_name,
            team = %pick.team_id,
            price,
            "pick committed"
        );

        self.picks.push(pick);
        Ok(self.picks.last().expect("pick was just pushed"))
    }

    /// Undo the most recent pick.
    pub fn undo_last(&mut self, players: &mut [Player]) -> Result<DraftPick, DraftError> {
        let last = self
            .picks
            .last()
            .map(|p| p.pick_number)
            .ok_or(DraftError::NothingToUndo)?;
        self.undo(players, last)
    }

    /// Undo an arbitrary pick by number: the player returns to the pool and
    /// the team's budget is refunded. Later picks are unaffected.
    pub fn undo(&mut self, players: &mut [Player], pick_number: u32) -> Result<DraftPick, DraftError> {
        let idx = self
            .picks
            .iter()
            .position(|p| p.pick_number == pick_number)
            .ok_or(DraftError::NoSuchPick(pick_number))?;
        let pick = self.picks.remove(idx);

        if let Some(player) = players.iter_mut().find(|p| p.id == pick.player_id) {
            player.is_drafted = false;
        }
        if let Some(team) = self.teams.iter_mut().find(|t| t.team_id == pick.team_id) {
            team.budget_spent = team.budget_spent.saturating_sub(pick.price);
            team.budget_remaining = (team.budget_remaining + pick.price).min(self.salary_cap);
        }
        self.values_stale = true;

        info!(
            pick = pick.pick_number,
            player = %pick.player_name,
            "pick undone"
        );

        Ok(pick)
    }

    /// Total salary spent across all teams.
    pub fn total_spent(&self) -> u32 {
        self.teams.iter().map(|t| t.budget_spent).sum()
    }

    /// Total salary remaining across all teams.
    pub fn total_remaining(&self) -> u32 {
        self.teams.iter().map(|t| t.budget_remaining).sum()
    }

    /// Salary spent on one player type, resolved through the pool.
    pub fn spent_on_type(&self, players: &[Player], player_type: PlayerType) -> u32 {
        self.picks
            .iter()
            .filter(|pick| {
                players
                    .iter()
                    .find(|p| p.id == pick.player_id)
                    .is_some_and(|p| p.player_type == player_type)
            })
            .map(|pick| pick.price)
            .sum()
    }

    /// Look up a team by ID.
    pub fn team(&self, team_id: &str) -> Option<&TeamState> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    /// Mark derived values fresh after an epoch has been applied.
    pub fn mark_values_fresh(&mut self) {
        self.values_stale = false;
    }

    /// Rebuild the state by replaying a persisted pick log, for restoring a
    /// session after restart. Budgets and drafted flags are reset first, so
    /// the result is identical to having made the picks live.
    pub fn restore_from_picks(&mut self, players: &mut [Player], picks: Vec<DraftPick>) {
        for team in &mut self.teams {
            team.budget_spent = 0;
            team.budget_remaining = self.salary_cap;
        }
        for player in players.iter_mut() {
            player.is_drafted = false;
        }
        self.picks.clear();

        for pick in picks {
            if let Some(player) = players.iter_mut().find(|p| p.id == pick.player_id) {
                player.is_drafted = true;
            }
            if let Some(team) = self.teams.iter_mut().find(|t| t.team_id == pick.team_id) {
                team.budget_spent += pick.price;
                team.budget_remaining = team.budget_remaining.saturating_sub(pick.price);
            }
            self.next_pick = self.next_pick.max(pick.pick_number + 1);
            self.picks.push(pick);
        }
        self.values_stale = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

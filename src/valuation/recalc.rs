// Recalculation coordinator: full-pass revaluation of the undrafted pool.
//
// Every committed transaction (pick or undo) invalidates all derived values:
// replacement baselines and category dispersion are statistics over the whole
// remaining pool, so there is no correct per-player incremental update. Each
// run is a pure function from (pool, pick log, settings) to a ValuationEpoch,
// which is then applied to the pool and storage as a single batch.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::{CategorySpec, LeagueConfig, ReplacementMode, StrategyConfig};
use crate::draft::pick::DraftPick;
use crate::player::{Player, PlayerType};
use crate::positions::Position;
use crate::valuation::dollars::to_dollars;
use crate::valuation::replacement::{type_baselines, TypeBaselines};
use crate::valuation::sgp::{best_score, SgpScore};
use crate::valuation::stats::{category_dispersion, rank_by_preliminary, DispersionTable};

// ---------------------------------------------------------------------------
// Epoch output
// ---------------------------------------------------------------------------

/// Derived values for a single player within one epoch.
#[derive(Debug, Clone)]
pub struct PlayerValue {
    pub player_id: i64,
    pub sgp: f64,
    pub sgp_breakdown: BTreeMap<String, f64>,
    pub dollar_value: f64,
}

/// The complete, internally consistent output of one recalculation pass.
///
/// `pick_seq` records how many picks the epoch was computed against; applying
/// an epoch against a pool whose pick log has since moved is a transaction
/// conflict and must be refused by the committer.
#[derive(Debug, Clone)]
pub struct ValuationEpoch {
    pub pick_seq: usize,
    pub values: Vec<PlayerValue>,
}

impl ValuationEpoch {
    pub fn value_for(&self, player_id: i64) -> Option<&PlayerValue> {
        self.values.iter().find(|v| v.player_id == player_id)
    }
}

/// Overwrite the derived fields of every player covered by the epoch.
/// Drafted players are not in the epoch and keep their last computed values.
pub fn apply_epoch(players: &mut [Player], epoch: &ValuationEpoch) {
    for value in &epoch.values {
        if let Some(player) = players.iter_mut().find(|p| p.id == value.player_id) {
            player.sgp = value.sgp;
            player.sgp_breakdown = value.sgp_breakdown.clone();
            player.dollar_value = value.dollar_value;
        }
    }
}

// ---------------------------------------------------------------------------
// Remaining demand and budget
// ---------------------------------------------------------------------------

/// Remaining league-wide demand per base position: total demand minus picks
/// attributed to the drafted player's primary (first-listed) position.
fn remaining_positional_demand(
    league: &LeagueConfig,
    players: &[Player],
) -> BTreeMap<Position, usize> {
    let mut demand = league.positional_demand();
    for player in players.iter().filter(|p| p.is_drafted) {
        if let Some(primary) = player.positions.first() {
            if let Some(count) = demand.get_mut(primary) {
                *count = count.saturating_sub(1);
            }
        }
    }
    demand
}

/// Inputs for valuing one player type's sub-pool.
struct SubPool<'a> {
    undrafted: Vec<&'a Player>,
    specs: Vec<CategorySpec>,
    remaining_slots: usize,
    remaining_budget: f64,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Recompute SGP and dollar values for every undrafted player.
///
/// Pure with respect to its inputs; call `apply_epoch` (and the storage
/// layer's batch commit) to make the result visible. Calling twice against
/// the same committed state yields identical output.
pub fn recalculate(
    players: &[Player],
    picks: &[DraftPick],
    league: &LeagueConfig,
    strategy: &StrategyConfig,
) -> ValuationEpoch {
    let drafted_hitters = players
        .iter()
        .filter(|p| p.is_drafted && p.player_type == PlayerType::Hitter)
        .count();
    let drafted_pitchers = players
        .iter()
        .filter(|p| p.is_drafted && p.player_type == PlayerType::Pitcher)
        .count();

    // Remaining sub-budgets: the configured split of the total, minus what
    // has already been spent in that sub-pool.
    let spent_on = |player_type: PlayerType| -> f64 {
        picks
            .iter()
            .filter(|pick| {
                players
                    .iter()
                    .find(|p| p.id == pick.player_id)
                    .is_some_and(|p| p.player_type == player_type)
            })
            .map(|pick| pick.price as f64)
            .sum()
    };

    let total_budget = league.total_budget();
    let hitter_budget =
        (total_budget * strategy.hitter_budget_fraction - spent_on(PlayerType::Hitter)).max(0.0);
    let pitcher_budget = (total_budget * (1.0 - strategy.hitter_budget_fraction)
        - spent_on(PlayerType::Pitcher))
    .max(0.0);

    let positional_demand = remaining_positional_demand(league, players);

    let hitters = SubPool {
        undrafted: players
            .iter()
            .filter(|p| !p.is_drafted && p.player_type == PlayerType::Hitter)
            .collect(),
        specs: league.batting_categories.specs(),
        remaining_slots: league
            .total_hitters_drafted()
            .saturating_sub(drafted_hitters),
        remaining_budget: hitter_budget,
    };
    let pitchers = SubPool {
        undrafted: players
            .iter()
            .filter(|p| !p.is_drafted && p.player_type == PlayerType::Pitcher)
            .collect(),
        specs: league.pitching_categories.specs(),
        remaining_slots: league
            .total_pitchers_drafted()
            .saturating_sub(drafted_pitchers),
        remaining_budget: pitcher_budget,
    };

    let mut values = Vec::with_capacity(hitters.undrafted.len() + pitchers.undrafted.len());
    values.extend(value_sub_pool(&hitters, &positional_demand, league, strategy));
    values.extend(value_sub_pool(&pitchers, &positional_demand, league, strategy));

    info!(
        players = values.len(),
        picks = picks.len(),
        hitter_budget,
        pitcher_budget,
        "valuation epoch computed"
    );

    ValuationEpoch {
        pick_seq: picks.len(),
        values,
    }
}

/// Run the valuation pipeline over one player type's undrafted sub-pool.
fn value_sub_pool(
    sub: &SubPool<'_>,
    positional_demand: &BTreeMap<Position, usize>,
    league: &LeagueConfig,
    strategy: &StrategyConfig,
) -> Vec<PlayerValue> {
    if sub.undrafted.is_empty() {
        return Vec::new();
    }

    // Pass 1: coarse ordering over the whole sub-pool.
    let ordering_table = category_dispersion(&sub.undrafted, &sub.specs);
    let ranked = rank_by_preliminary(&sub.undrafted, &sub.specs, &ordering_table);

    // The valuation pool is the draftable prefix: the players who would fill
    // the remaining slots. Dispersion and the overall baseline come from it.
    let draftable = &ranked[..sub.remaining_slots.min(ranked.len())];
    let dispersion = category_dispersion(draftable, &sub.specs);

    let baselines = type_baselines(
        &ranked,
        sub.remaining_slots,
        positional_demand,
        strategy.replacement_mode,
    );

    // Pass 2: true SGP against replacement baselines.
    let scores = score_sub_pool(
        &ranked,
        draftable.len(),
        &baselines,
        &dispersion,
        &sub.specs,
        strategy.replacement_mode,
    );

    let scored: Vec<(i64, f64)> = scores.iter().map(|(p, s)| (p.id, s.total)).collect();
    let dollars = to_dollars(&scored, sub.remaining_budget, league.min_bid as f64);

    scores
        .into_iter()
        .map(|(player, score)| PlayerValue {
            player_id: player.id,
            sgp: score.total,
            sgp_breakdown: score.breakdown,
            dollar_value: dollars
                .get(&player.id)
                .copied()
                .unwrap_or(league.min_bid as f64),
        })
        .collect()
}

/// Score every player in rank order against their best available baseline.
///
/// In global mode, players ranked below the draftable pool are not part of
/// the valuation universe: they carry zero SGP and land on the minimum bid.
/// Positional mode scores everyone, because a player outside the overall top
/// N can still clear the bar at a scarce position.
fn score_sub_pool<'a>(
    ranked: &[&'a Player],
    draftable_len: usize,
    baselines: &TypeBaselines,
    dispersion: &DispersionTable,
    specs: &[CategorySpec],
    mode: ReplacementMode,
) -> Vec<(&'a Player, SgpScore)> {
    ranked
        .iter()
        .enumerate()
        .map(|(rank, player)| {
            if mode == ReplacementMode::Global && rank >= draftable_len {
                return (*player, SgpScore::zero(specs));
            }
            let score = best_score(
                player,
                baselines.candidates_for(player),
                dispersion,
                specs,
            )
            .unwrap_or_else(|| SgpScore::zero(specs));
            (*player, score)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

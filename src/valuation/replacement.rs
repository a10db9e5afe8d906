// Replacement-level baselines, global and per-position.
//
// The baseline is the stat line of the last player expected to be drafted
// for a pool: rank everyone by the coarse preliminary value, then take the
// line at rank N, where N is the number of roster slots the pool must fill.
// SGP is value above this line.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ReplacementMode;
use crate::player::{Player, StatLine};
use crate::positions::Position;

/// Replacement baselines for one player type (hitters or pitchers).
#[derive(Debug, Clone, Default)]
pub struct TypeBaselines {
    /// Type-wide baseline: the rank-N player over the whole type pool. This
    /// is the baseline behind the universal slot (UTIL / P), so it is a
    /// candidate for every player of the type.
    pub overall: Option<StatLine>,
    /// Per-position baselines. Empty in global mode.
    pub positional: BTreeMap<Position, StatLine>,
}

impl TypeBaselines {
    /// All baselines a given player may be valued against: one per eligible
    /// position that has a baseline, plus the overall (universal-slot)
    /// baseline. The engine scores against each and keeps the best; a player
    /// whose tags are all unrecognized still gets the overall baseline.
    pub fn candidates_for(&self, player: &Player) -> Vec<&StatLine> {
        let mut candidates: Vec<&StatLine> = player
            .positions
            .iter()
            .filter_map(|pos| self.positional.get(pos))
            .collect();
        if let Some(overall) = &self.overall {
            candidates.push(overall);
        }
        candidates
    }
}

/// The rank-N line of an already ranked (descending) pool.
///
/// With fewer than N players there is nothing to extrapolate from; the worst
/// available line is the baseline. An empty pool or zero demand yields none.
fn rank_n_line(ranked: &[&Player], n: usize) -> Option<StatLine> {
    if n == 0 || ranked.is_empty() {
        return None;
    }
    let idx = n.saturating_sub(1).min(ranked.len() - 1);
    Some(ranked[idx].line.clone())
}

/// Derive baselines for one player type.
///
/// `ranked` must already be sorted descending by preliminary value (pass 1
/// of the two-pass scheme). `type_slots` is the remaining league-wide demand
/// for this player type; `positional_demand` the remaining demand per base
/// position. Positional baselines are only derived in positional mode.
pub fn type_baselines(
    ranked: &[&Player],
    type_slots: usize,
    positional_demand: &BTreeMap<Position, usize>,
    mode: ReplacementMode,
) -> TypeBaselines {
    let overall = rank_n_line(ranked, type_slots);

    let mut positional = BTreeMap::new();
    if mode == ReplacementMode::Positional {
        for (&pos, &demand) in positional_demand {
            if demand == 0 {
                continue;
            }
            let eligible: Vec<&Player> = ranked
                .iter()
                .copied()
                .filter(|p| p.positions.contains(&pos))
                .collect();
            match rank_n_line(&eligible, demand) {
                Some(line) => {
                    debug!(
                        position = pos.code(),
                        demand,
                        eligible = eligible.len(),
                        "replacement baseline set"
                    );
                    positional.insert(pos, line);
                }
                None => {
                    debug!(position = pos.code(), "no eligible players for position");
                }
            }
        }
    }

    TypeBaselines {
        overall,
        positional,
    }
}

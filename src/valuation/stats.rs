// Pool statistics: per-category dispersion and the coarse ordering value.

use std::collections::BTreeMap;

use crate::config::{CategoryKind, CategorySpec};
use crate::player::Player;

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation for a single statistical category across a
/// player pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
pub const STDEV_EPSILON: f64 = 1e-9;

/// Compute mean and standard deviation for a slice of values.
///
/// Returns `PoolStats { mean: 0.0, stdev: 0.0 }` for an empty slice.
/// Uses the population standard deviation (N denominator), since the pool
/// represents the full relevant player universe rather than a sample.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

// ---------------------------------------------------------------------------
// Volume-weighted category values
// ---------------------------------------------------------------------------

/// The value a player contributes to a category's pool statistic.
///
/// Counting categories contribute the raw stat. Rate and ratio categories
/// contribute the stat scaled by the playing-time denominator (hits for AVG,
/// earned-run volume for ERA), so that a strong rate on thin playing time
/// weighs less than the same rate over a full season. Players with a zero
/// denominator contribute nothing to rate/ratio statistics and return `None`.
pub fn weighted_value(player: &Player, spec: &CategorySpec) -> Option<f64> {
    let stat = player.line.get(&spec.name);
    match spec.kind {
        CategoryKind::Counting => Some(stat),
        CategoryKind::Rate | CategoryKind::Ratio => {
            let den = player.line.denominator();
            if den <= 0.0 {
                None
            } else {
                Some(stat * den)
            }
        }
    }
}

/// Per-category pool statistics over volume-weighted values, keyed by
/// category name. Computed once per valuation epoch for each player type.
#[derive(Debug, Clone, Default)]
pub struct DispersionTable {
    stats: BTreeMap<String, PoolStats>,
}

impl DispersionTable {
    pub fn get(&self, category: &str) -> Option<&PoolStats> {
        self.stats.get(category)
    }

    /// Standard deviation for a category; 0.0 if the category is unknown.
    pub fn stdev(&self, category: &str) -> f64 {
        self.stats.get(category).map(|s| s.stdev).unwrap_or(0.0)
    }
}

/// Compute the dispersion table for a pool of same-type players.
///
/// Zero-denominator players are excluded from rate/ratio statistics so that
/// a bench of zero-AB call-ups cannot distort the spread.
pub fn category_dispersion(pool: &[&Player], specs: &[CategorySpec]) -> DispersionTable {
    let mut stats = BTreeMap::new();
    for spec in specs {
        let values: Vec<f64> = pool
            .iter()
            .filter_map(|p| weighted_value(p, spec))
            .collect();
        stats.insert(spec.name.clone(), compute_pool_stats(&values));
    }
    DispersionTable { stats }
}

// ---------------------------------------------------------------------------
// Preliminary ordering value (pass 1)
// ---------------------------------------------------------------------------

/// Coarse value used only to order players for replacement-level bucketing.
///
/// This is a plain z-score sum against the pool mean: for each category the
/// player's volume-weighted value is centered on the pool mean and divided by
/// the pool spread, with the sign inverted for lower-is-better ratio
/// categories. It exists to break the circularity between ranking and
/// baseline selection; the real SGP is recomputed afterwards against the
/// replacement baselines this ordering produces. The ordering is never
/// refined against that second pass.
pub fn preliminary_value(player: &Player, specs: &[CategorySpec], table: &DispersionTable) -> f64 {
    let mut total = 0.0;
    for spec in specs {
        let Some(weighted) = weighted_value(player, spec) else {
            continue;
        };
        let Some(stats) = table.get(&spec.name) else {
            continue;
        };
        if stats.stdev < STDEV_EPSILON {
            continue;
        }
        let z = (weighted - stats.mean) / stats.stdev;
        total += match spec.kind {
            CategoryKind::Ratio => -z,
            _ => z,
        };
    }
    total
}

/// Sort player references descending by preliminary value.
pub fn rank_by_preliminary<'a>(
    pool: &[&'a Player],
    specs: &[CategorySpec],
    table: &DispersionTable,
) -> Vec<&'a Player> {
    let mut ranked: Vec<(&Player, f64)> = pool
        .iter()
        .map(|p| (*p, preliminary_value(p, specs, table)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(p, _)| p).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

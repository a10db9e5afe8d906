// Standings-gain-points scoring against a replacement baseline.

use std::collections::BTreeMap;

use crate::config::{CategoryKind, CategorySpec};
use crate::player::{Player, StatLine};
use crate::valuation::stats::{DispersionTable, STDEV_EPSILON};

/// A scored player: total SGP plus the per-category breakdown retained for
/// downstream surplus analysis.
#[derive(Debug, Clone)]
pub struct SgpScore {
    pub total: f64,
    pub breakdown: BTreeMap<String, f64>,
}

impl SgpScore {
    /// A zeroed score with one entry per configured category. Used for
    /// players parked outside the draftable pool.
    pub fn zero(specs: &[CategorySpec]) -> Self {
        SgpScore {
            total: 0.0,
            breakdown: specs.iter().map(|s| (s.name.clone(), 0.0)).collect(),
        }
    }
}

/// Score a player's stat line against a replacement baseline.
///
/// Per category:
/// - counting: `(stat - baseline_stat) / stdev`
/// - rate (higher is better): the player's projected numerator is compared
///   to what a replacement-level rate would produce over the *player's own*
///   playing time, `(stat - baseline_rate) * denominator / stdev`, so a high
///   rate on low volume contributes less than the same rate on high volume
/// - ratio (lower is better): same weighting with the sign inverted,
///   `(baseline_rate - stat) * denominator / stdev`
///
/// Degenerate inputs are absorbed rather than surfaced: a category with
/// near-zero pool dispersion contributes 0 for every player, and a player
/// with a zero playing-time denominator scores 0 in rate/ratio categories.
pub fn score(line: &StatLine, baseline: &StatLine, table: &DispersionTable, specs: &[CategorySpec]) -> SgpScore {
    let mut total = 0.0;
    let mut breakdown = BTreeMap::new();

    for spec in specs {
        let stdev = table.stdev(&spec.name);
        let sgp = if stdev < STDEV_EPSILON {
            0.0
        } else {
            let stat = line.get(&spec.name);
            let base = baseline.get(&spec.name);
            match spec.kind {
                CategoryKind::Counting => (stat - base) / stdev,
                CategoryKind::Rate => {
                    let den = line.denominator();
                    if den <= 0.0 {
                        0.0
                    } else {
                        (stat - base) * den / stdev
                    }
                }
                CategoryKind::Ratio => {
                    let den = line.denominator();
                    if den <= 0.0 {
                        0.0
                    } else {
                        (base - stat) * den / stdev
                    }
                }
            }
        };
        breakdown.insert(spec.name.clone(), sgp);
        total += sgp;
    }

    SgpScore { total, breakdown }
}

/// Score a player against the most favorable of several candidate baselines.
///
/// A multi-eligible player is valued at whichever eligible position gives
/// the highest total, i.e. against the least demanding baseline. This is a
/// per-player reduction over baselines, not a roster assignment.
pub fn best_score<'a, I>(player: &Player, baselines: I, table: &DispersionTable, specs: &[CategorySpec]) -> Option<SgpScore>
where
    I: IntoIterator<Item = &'a StatLine>,
{
    baselines
        .into_iter()
        .map(|b| score(&player.line, b, table, specs))
        .max_by(|a, b| a.total.partial_cmp(&b.total).unwrap_or(std::cmp::Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryKind;
    use crate::valuation::stats::category_dispersion;
    use crate::player::PlayerType;
    use crate::positions::Position;
    use std::collections::BTreeMap as Map;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn spec(name: &str, kind: CategoryKind) -> CategorySpec {
        CategorySpec {
            name: name.into(),
            kind,
        }
    }

    fn line(pairs: &[(&str, f64)], den: f64) -> StatLine {
        StatLine::new(
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect::<Map<_, _>>(),
            den,
        )
    }

    /// Dispersion table with exact stdevs, built through the real pool path:
    /// a two-player pool at +sd and -sd has mean 0 and stdev sd per category.
    fn fixed_table(entries: &[(&str, f64)]) -> DispersionTable {
        let specs: Vec<CategorySpec> = entries
            .iter()
            .map(|(name, _)| spec(name, CategoryKind::Counting))
            .collect();
        let a = Player::new(
            1,
            "A",
            "TST",
            vec![],
            PlayerType::Hitter,
            line(
                &entries.iter().map(|(n, sd)| (*n, *sd)).collect::<Vec<_>>(),
                1.0,
            ),
        );
        let b = Player::new(
            2,
            "B",
            "TST",
            vec![],
            PlayerType::Hitter,
            line(
                &entries.iter().map(|(n, sd)| (*n, -*sd)).collect::<Vec<_>>(),
                1.0,
            ),
        );
        let pool = [&a, &b];
        category_dispersion(&pool, &specs)
    }

    #[test]
    fn counting_category_above_baseline_is_positive() {
        let specs = [spec("HR", CategoryKind::Counting)];
        let table = fixed_table(&[("HR", 8.0)]);
        let player = line(&[("HR", 36.0)], 550.0);
        let baseline = line(&[("HR", 20.0)], 500.0);

        let s = score(&player, &baseline, &table, &specs);
        // (36 - 20) / 8 = 2.0
        assert!(approx_eq(s.total, 2.0, 1e-10));
        assert!(approx_eq(s.breakdown["HR"], 2.0, 1e-10));
    }

    #[test]
    fn counting_category_below_baseline_is_negative() {
        let specs = [spec("HR", CategoryKind::Counting)];
        let table = fixed_table(&[("HR", 8.0)]);
        let player = line(&[("HR", 12.0)], 550.0);
        let baseline = line(&[("HR", 20.0)], 500.0);

        let s = score(&player, &baseline, &table, &specs);
        assert!(approx_eq(s.total, -1.0, 1e-10));
    }

    #[test]
    fn rate_category_rewards_volume() {
        // Two players with identical .300 AVG against a .260 baseline, but
        // 600 vs 60 at-bats; the full-timer must score strictly higher.
        let specs = [spec("AVG", CategoryKind::Rate)];
        let table = fixed_table(&[("AVG", 10.0)]);
        let baseline = line(&[("AVG", 0.260)], 500.0);

        let full = score(&line(&[("AVG", 0.300)], 600.0), &baseline, &table, &specs);
        let part = score(&line(&[("AVG", 0.300)], 60.0), &baseline, &table, &specs);

        // (0.300 - 0.260) * 600 / 10 = 2.4 vs (0.300 - 0.260) * 60 / 10 = 0.24
        assert!(approx_eq(full.total, 2.4, 1e-10));
        assert!(approx_eq(part.total, 0.24, 1e-10));
        assert!(full.total > part.total);
    }

    #[test]
    fn ratio_category_symmetric_around_baseline() {
        // Baseline ERA 4.00: a 2.00 ERA over 180 IP scores positive, a 6.00
        // ERA over the same innings scores negative of equal magnitude.
        let specs = [spec("ERA", CategoryKind::Ratio)];
        let table = fixed_table(&[("ERA", 50.0)]);
        let baseline = line(&[("ERA", 4.00)], 170.0);

        let ace = score(&line(&[("ERA", 2.00)], 180.0), &baseline, &table, &specs);
        let scrub = score(&line(&[("ERA", 6.00)], 180.0), &baseline, &table, &specs);

        assert!(ace.total > 0.0);
        assert!(scrub.total < 0.0);
        assert!(approx_eq(ace.total, -scrub.total, 1e-10));
        // (4.00 - 2.00) * 180 / 50 = 7.2
        assert!(approx_eq(ace.total, 7.2, 1e-10));
    }

    #[test]
    fn zero_dispersion_category_contributes_zero() {
        let specs = [
            spec("HR", CategoryKind::Counting),
            spec("SB", CategoryKind::Counting),
        ];
        // SB has zero spread in this pool.
        let table = fixed_table(&[("HR", 8.0), ("SB", 0.0)]);
        let player = line(&[("HR", 28.0), ("SB", 40.0)], 550.0);
        let baseline = line(&[("HR", 20.0), ("SB", 5.0)], 500.0);

        let s = score(&player, &baseline, &table, &specs);
        assert!(approx_eq(s.breakdown["SB"], 0.0, 1e-10));
        assert!(approx_eq(s.total, 1.0, 1e-10));
    }

    #[test]
    fn zero_denominator_scores_zero_in_rate_categories() {
        let specs = [
            spec("HR", CategoryKind::Counting),
            spec("AVG", CategoryKind::Rate),
        ];
        let table = fixed_table(&[("HR", 8.0), ("AVG", 10.0)]);
        let player = line(&[("HR", 28.0), ("AVG", 0.400)], 0.0);
        let baseline = line(&[("HR", 20.0), ("AVG", 0.260)], 500.0);

        let s = score(&player, &baseline, &table, &specs);
        assert!(approx_eq(s.breakdown["AVG"], 0.0, 1e-10));
        // The counting category still scores.
        assert!(approx_eq(s.breakdown["HR"], 1.0, 1e-10));
    }

    #[test]
    fn breakdown_has_entry_per_category() {
        let specs = [
            spec("R", CategoryKind::Counting),
            spec("HR", CategoryKind::Counting),
            spec("AVG", CategoryKind::Rate),
        ];
        let table = fixed_table(&[("R", 15.0), ("HR", 8.0), ("AVG", 10.0)]);
        let player = line(&[("R", 90.0), ("HR", 25.0), ("AVG", 0.280)], 550.0);
        let baseline = line(&[("R", 70.0), ("HR", 18.0), ("AVG", 0.260)], 500.0);

        let s = score(&player, &baseline, &table, &specs);
        assert_eq!(s.breakdown.len(), 3);
        let sum: f64 = s.breakdown.values().sum();
        assert!(approx_eq(s.total, sum, 1e-10));
    }

    #[test]
    fn zero_score_has_zeroed_breakdown() {
        let specs = [
            spec("R", CategoryKind::Counting),
            spec("AVG", CategoryKind::Rate),
        ];
        let z = SgpScore::zero(&specs);
        assert_eq!(z.total, 0.0);
        assert_eq!(z.breakdown.len(), 2);
        assert!(z.breakdown.values().all(|&v| v == 0.0));
    }

    #[test]
    fn best_score_picks_most_favorable_baseline() {
        let specs = [spec("HR", CategoryKind::Counting)];
        let table = fixed_table(&[("HR", 8.0)]);
        let player = Player::new(
            1,
            "Multi",
            "TST",
            vec![Position::FirstBase, Position::ThirdBase],
            PlayerType::Hitter,
            line(&[("HR", 28.0)], 550.0),
        );

        let deep = line(&[("HR", 24.0)], 500.0); // strong position, low margin
        let scarce = line(&[("HR", 12.0)], 450.0); // weak position, high margin

        let best = best_score(&player, [&deep, &scarce], &table, &specs).unwrap();
        // (28 - 12) / 8 = 2.0 from the scarce position's baseline.
        assert!(approx_eq(best.total, 2.0, 1e-10));
    }

    #[test]
    fn best_score_empty_baselines_is_none() {
        let specs = [spec("HR", CategoryKind::Counting)];
        let table = fixed_table(&[("HR", 8.0)]);
        let player = Player::new(
            1,
            "Nobody",
            "TST",
            vec![],
            PlayerType::Hitter,
            line(&[("HR", 28.0)], 550.0),
        );
        assert!(best_score(&player, [], &table, &specs).is_none());
    }
}

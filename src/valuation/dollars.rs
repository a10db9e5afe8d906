// Dollar value conversion: SGP to auction dollars within a sub-budget.
//
// Computed independently for the hitter and pitcher sub-pools against their
// respective sub-budgets. Dollars are distributed proportionally to positive
// SGP; everyone else gets the minimum bid and stays draftable.

use std::collections::BTreeMap;

/// Convert scored players to dollar values.
///
/// One minimum bid is reserved for each non-positive player before the
/// conversion rate is derived, so the sub-pool's values sum back to the
/// sub-budget:
///
/// `rate = (sub_budget - non_positive_count * min_bid) / total_positive_sgp`
/// `value = max(min_bid, sgp * rate)`
///
/// Degenerate pools are absorbed, not errors: if no player has positive SGP,
/// or the reserve consumes the whole budget, every player is worth the
/// minimum bid. SGP inputs are never modified.
pub fn to_dollars(scored: &[(i64, f64)], sub_budget: f64, min_bid: f64) -> BTreeMap<i64, f64> {
    let total_positive_sgp: f64 = scored.iter().map(|(_, sgp)| sgp.max(0.0)).sum();

    if total_positive_sgp <= 0.0 {
        return scored.iter().map(|(id, _)| (*id, min_bid)).collect();
    }

    let non_positive = scored.iter().filter(|(_, sgp)| *sgp <= 0.0).count();
    let distributable = (sub_budget - non_positive as f64 * min_bid).max(0.0);
    let rate = distributable / total_positive_sgp;

    scored
        .iter()
        .map(|(id, sgp)| (*id, (sgp * rate).max(min_bid)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn known_small_pool_values() {
        // Budget 200, min bid 1, no negative players.
        // Total positive SGP = 10 + 5 + 5 = 20, rate = 200 / 20 = 10.
        let scored = vec![(1, 10.0), (2, 5.0), (3, 5.0)];
        let values = to_dollars(&scored, 200.0, 1.0);
        assert!(approx_eq(values[&1], 100.0, 1e-10));
        assert!(approx_eq(values[&2], 50.0, 1e-10));
        assert!(approx_eq(values[&3], 50.0, 1e-10));
    }

    #[test]
    fn negative_sgp_players_floor_at_min_bid() {
        let scored = vec![(1, 12.0), (2, 4.0), (3, -3.0), (4, 0.0)];
        let values = to_dollars(&scored, 100.0, 1.0);
        assert!(approx_eq(values[&3], 1.0, 1e-10));
        assert!(approx_eq(values[&4], 1.0, 1e-10));
        // Rate derived from budget minus two reserved min bids: 98 / 16.
        assert!(approx_eq(values[&1], 12.0 * 98.0 / 16.0, 1e-10));
    }

    #[test]
    fn sub_pool_values_conserve_the_budget() {
        let scored = vec![(1, 9.0), (2, 6.0), (3, 3.0), (4, -1.0), (5, -4.0)];
        let budget = 250.0;
        let values = to_dollars(&scored, budget, 1.0);
        let total: f64 = values.values().sum();
        assert!(
            approx_eq(total, budget, 1e-9),
            "values should sum to the sub-budget, got {total}"
        );
    }

    #[test]
    fn every_value_at_least_min_bid() {
        let scored = vec![(1, 8.0), (2, 0.5), (3, -7.0), (4, 0.0)];
        let values = to_dollars(&scored, 60.0, 1.0);
        for (id, value) in &values {
            assert!(*value >= 1.0, "player {id} valued below min bid: {value}");
        }
    }

    #[test]
    fn tiny_positive_sgp_still_floors_at_min_bid() {
        // A positive-SGP player whose proportional share is below the floor.
        let scored = vec![(1, 100.0), (2, 0.001)];
        let values = to_dollars(&scored, 50.0, 1.0);
        assert!(approx_eq(values[&2], 1.0, 1e-10));
    }

    #[test]
    fn zero_total_positive_sgp_everyone_gets_min_bid() {
        let scored = vec![(1, -2.0), (2, -0.5), (3, 0.0)];
        let values = to_dollars(&scored, 500.0, 1.0);
        for value in values.values() {
            assert!(approx_eq(*value, 1.0, 1e-10));
        }
    }

    #[test]
    fn reserve_exceeding_budget_degrades_to_min_bids() {
        // 5 non-positive players reserve more than the $3 budget; the rate
        // collapses to zero and everyone lands on the floor.
        let mut scored = vec![(0, 2.0)];
        scored.extend((1..=5).map(|id| (id, -1.0)));
        let values = to_dollars(&scored, 3.0, 1.0);
        for value in values.values() {
            assert!(approx_eq(*value, 1.0, 1e-10));
        }
    }

    #[test]
    fn empty_pool_yields_empty_map() {
        let values = to_dollars(&[], 260.0, 1.0);
        assert!(values.is_empty());
    }

    #[test]
    fn does_not_mutate_input_sgp() {
        let scored = vec![(1, 5.0), (2, -1.0)];
        let before = scored.clone();
        let _ = to_dollars(&scored, 100.0, 1.0);
        assert_eq!(scored, before);
    }
}

// Player records and projected stat lines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::positions::Position;

/// Whether a player is valued against the hitter or pitcher pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerType {
    Hitter,
    Pitcher,
}

impl PlayerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerType::Hitter => "hitter",
            PlayerType::Pitcher => "pitcher",
        }
    }

    pub fn from_str_type(s: &str) -> Option<Self> {
        match s {
            "hitter" => Some(PlayerType::Hitter),
            "pitcher" => Some(PlayerType::Pitcher),
            _ => None,
        }
    }
}

/// A projected season stat line: category name -> value, plus the playing-time
/// denominator used to weight rate and ratio categories (at-bats for hitters,
/// innings pitched for pitchers).
///
/// Stat lines are created once at import and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    values: BTreeMap<String, f64>,
    denominator: f64,
}

impl StatLine {
    pub fn new(values: BTreeMap<String, f64>, denominator: f64) -> Self {
        StatLine {
            values,
            denominator,
        }
    }

    /// Projected value for a category. Missing categories read as 0.0, so a
    /// player imported without a stat simply contributes nothing there.
    pub fn get(&self, category: &str) -> f64 {
        self.values.get(category).copied().unwrap_or(0.0)
    }

    /// Playing-time denominator (AB or IP).
    pub fn denominator(&self) -> f64 {
        self.denominator
    }
}

/// A player in the draft pool.
///
/// Identity, eligibility, and the stat line are fixed at import. The derived
/// fields (`sgp`, `sgp_breakdown`, `dollar_value`) are overwritten wholesale
/// each time a valuation epoch is applied; they are meaningless before the
/// first full recalculation. `is_drafted` flips as the draft progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub team: String,
    pub positions: Vec<Position>,
    pub player_type: PlayerType,
    pub line: StatLine,
    pub is_drafted: bool,
    pub sgp: f64,
    pub sgp_breakdown: BTreeMap<String, f64>,
    pub dollar_value: f64,
}

impl Player {
    /// Build an undrafted player with zeroed derived fields.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        team: impl Into<String>,
        positions: Vec<Position>,
        player_type: PlayerType,
        line: StatLine,
    ) -> Self {
        Player {
            id,
            name: name.into(),
            team: team.into(),
            positions,
            player_type,
            line,
            is_drafted: false,
            sgp: 0.0,
            sgp_breakdown: BTreeMap::new(),
            dollar_value: 0.0,
        }
    }

    /// The player's dollar value as of the latest committed epoch.
    pub fn value(&self) -> f64 {
        self.dollar_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(pairs: &[(&str, f64)], den: f64) -> StatLine {
        StatLine::new(
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            den,
        )
    }

    #[test]
    fn stat_line_lookup_and_default() {
        let l = line(&[("HR", 30.0), ("AVG", 0.285)], 550.0);
        assert_eq!(l.get("HR"), 30.0);
        assert_eq!(l.get("AVG"), 0.285);
        assert_eq!(l.get("SB"), 0.0);
        assert_eq!(l.denominator(), 550.0);
    }

    #[test]
    fn player_type_string_roundtrip() {
        for pt in [PlayerType::Hitter, PlayerType::Pitcher] {
            assert_eq!(PlayerType::from_str_type(pt.as_str()), Some(pt));
        }
        assert_eq!(PlayerType::from_str_type("catcher"), None);
    }

    #[test]
    fn new_player_starts_undrafted_with_zero_value() {
        let p = Player::new(
            1,
            "Test Player",
            "TST",
            vec![Position::ShortStop],
            PlayerType::Hitter,
            line(&[("HR", 20.0)], 500.0),
        );
        assert!(!p.is_drafted);
        assert_eq!(p.sgp, 0.0);
        assert_eq!(p.value(), 0.0);
        assert!(p.sgp_breakdown.is_empty());
    }
}

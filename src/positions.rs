// Position eligibility: base positions, roster slots, composite expansion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::PlayerType;

/// A base playing position a player can carry as an eligibility tag.
///
/// Outfield is modeled as a single position: projections list "OF" rather
/// than individual outfield spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Catcher,
    FirstBase,
    SecondBase,
    ThirdBase,
    ShortStop,
    Outfield,
    StartingPitcher,
    ReliefPitcher,
}

impl Position {
    /// Parse a position code (e.g. "1B", "SS", "SP"). Case-insensitive.
    /// Unrecognized codes return `None`; callers treat them as tags that
    /// confer no position-restricted eligibility.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" => Some(Position::Catcher),
            "1B" => Some(Position::FirstBase),
            "2B" => Some(Position::SecondBase),
            "3B" => Some(Position::ThirdBase),
            "SS" => Some(Position::ShortStop),
            "OF" | "LF" | "CF" | "RF" => Some(Position::Outfield),
            "SP" => Some(Position::StartingPitcher),
            "RP" => Some(Position::ReliefPitcher),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Position::Catcher => "C",
            Position::FirstBase => "1B",
            Position::SecondBase => "2B",
            Position::ThirdBase => "3B",
            Position::ShortStop => "SS",
            Position::Outfield => "OF",
            Position::StartingPitcher => "SP",
            Position::ReliefPitcher => "RP",
        }
    }

    pub fn is_hitter(&self) -> bool {
        !matches!(self, Position::StartingPitcher | Position::ReliefPitcher)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A roster slot as configured in league settings. Base positions plus the
/// composite slots: corner infield (1B/3B), middle infield (2B/SS), the
/// universal hitter slot, the universal pitcher slot, and bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Catcher,
    FirstBase,
    SecondBase,
    ThirdBase,
    ShortStop,
    Outfield,
    CornerInfield,
    MiddleInfield,
    Utility,
    StartingPitcher,
    ReliefPitcher,
    Pitcher,
    Bench,
}

impl Slot {
    /// Parse a roster slot label from league configuration.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" => Some(Slot::Catcher),
            "1B" => Some(Slot::FirstBase),
            "2B" => Some(Slot::SecondBase),
            "3B" => Some(Slot::ThirdBase),
            "SS" => Some(Slot::ShortStop),
            "OF" => Some(Slot::Outfield),
            "CI" => Some(Slot::CornerInfield),
            "MI" => Some(Slot::MiddleInfield),
            "UTIL" | "UT" => Some(Slot::Utility),
            "SP" => Some(Slot::StartingPitcher),
            "RP" => Some(Slot::ReliefPitcher),
            "P" => Some(Slot::Pitcher),
            "BN" | "BE" => Some(Slot::Bench),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Slot::Catcher => "C",
            Slot::FirstBase => "1B",
            Slot::SecondBase => "2B",
            Slot::ThirdBase => "3B",
            Slot::ShortStop => "SS",
            Slot::Outfield => "OF",
            Slot::CornerInfield => "CI",
            Slot::MiddleInfield => "MI",
            Slot::Utility => "UTIL",
            Slot::StartingPitcher => "SP",
            Slot::ReliefPitcher => "RP",
            Slot::Pitcher => "P",
            Slot::Bench => "BN",
        }
    }

    /// The base positions a position-restricted slot accepts. Universal slots
    /// (UTIL, P) and bench accept by player type instead and expand to
    /// nothing here.
    pub fn expand(&self) -> &'static [Position] {
        match self {
            Slot::Catcher => &[Position::Catcher],
            Slot::FirstBase => &[Position::FirstBase],
            Slot::SecondBase => &[Position::SecondBase],
            Slot::ThirdBase => &[Position::ThirdBase],
            Slot::ShortStop => &[Position::ShortStop],
            Slot::Outfield => &[Position::Outfield],
            Slot::CornerInfield => &[Position::FirstBase, Position::ThirdBase],
            Slot::MiddleInfield => &[Position::SecondBase, Position::ShortStop],
            Slot::StartingPitcher => &[Position::StartingPitcher],
            Slot::ReliefPitcher => &[Position::ReliefPitcher],
            Slot::Utility | Slot::Pitcher | Slot::Bench => &[],
        }
    }

    /// Whether this slot counts toward hitter roster demand.
    pub fn is_hitter_slot(&self) -> bool {
        match self {
            Slot::Utility => true,
            Slot::Pitcher | Slot::Bench => false,
            Slot::StartingPitcher | Slot::ReliefPitcher => false,
            _ => true,
        }
    }

    /// Whether this slot counts toward pitcher roster demand.
    pub fn is_pitcher_slot(&self) -> bool {
        matches!(self, Slot::StartingPitcher | Slot::ReliefPitcher | Slot::Pitcher)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Can a player with the given eligibility tags and type fill this slot?
///
/// This reports capability only. Committing a specific player to a specific
/// slot is roster bookkeeping that lives with the consumer, which should
/// assign the most constrained slots first so flexible players are not
/// burned on slots a less flexible player could have filled.
pub fn fills(positions: &[Position], player_type: PlayerType, slot: Slot) -> bool {
    match slot {
        Slot::Utility => player_type == PlayerType::Hitter,
        Slot::Pitcher => player_type == PlayerType::Pitcher,
        Slot::Bench => true,
        _ => slot.expand().iter().any(|p| positions.contains(p)),
    }
}

/// All roster slots the player is capable of filling, in the order given.
pub fn eligible_slots(
    positions: &[Position],
    player_type: PlayerType,
    slots: &[Slot],
) -> Vec<Slot> {
    slots
        .iter()
        .copied()
        .filter(|&s| fills(positions, player_type, s))
        .collect()
}

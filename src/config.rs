// Configuration loading and parsing (league.toml, strategy.toml).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::positions::{Position, Slot};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Category classification
// ---------------------------------------------------------------------------

/// How a scoring category is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    /// Accumulates over the season; higher is better (HR, SB, W, K).
    Counting,
    /// Ratio where higher is better, weighted by playing time (AVG).
    Rate,
    /// Ratio where lower is better, weighted by playing time (ERA, WHIP).
    Ratio,
}

/// A single active scoring category with its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpec {
    pub name: String,
    pub kind: CategoryKind,
}

/// Category lists for one side of the scoring sheet, grouped by kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoriesSection {
    #[serde(default)]
    pub counting: Vec<String>,
    #[serde(default)]
    pub rate: Vec<String>,
    #[serde(default)]
    pub ratio: Vec<String>,
}

impl CategoriesSection {
    /// Flatten into ordered category specs: counting, then rate, then ratio.
    pub fn specs(&self) -> Vec<CategorySpec> {
        let mut specs =
            Vec::with_capacity(self.counting.len() + self.rate.len() + self.ratio.len());
        for name in &self.counting {
            specs.push(CategorySpec {
                name: name.clone(),
                kind: CategoryKind::Counting,
            });
        }
        for name in &self.rate {
            specs.push(CategorySpec {
                name: name.clone(),
                kind: CategoryKind::Rate,
            });
        }
        for name in &self.ratio {
            specs.push(CategorySpec {
                name: name.clone(),
                kind: CategoryKind::Ratio,
            });
        }
        specs
    }

    fn is_empty(&self) -> bool {
        self.counting.is_empty() && self.rate.is_empty() && self.ratio.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    pub budget_per_team: u32,
    pub min_bid: u32,
    /// Roster slot label -> per-team slot count. Labels are base positions
    /// plus the composite slots (CI, MI, UTIL, P) and bench (BN).
    pub roster: BTreeMap<String, usize>,
    pub batting_categories: CategoriesSection,
    pub pitching_categories: CategoriesSection,
}

impl LeagueConfig {
    /// Total auction dollars available across the league.
    pub fn total_budget(&self) -> f64 {
        self.num_teams as f64 * self.budget_per_team as f64
    }

    /// Hitter roster slots per team (dedicated positions, composites, UTIL).
    pub fn hitter_slots_per_team(&self) -> usize {
        self.roster
            .iter()
            .filter_map(|(label, &count)| Slot::from_code(label).map(|s| (s, count)))
            .filter(|(slot, _)| slot.is_hitter_slot())
            .map(|(_, count)| count)
            .sum()
    }

    /// Pitcher roster slots per team (SP, RP, generic P).
    pub fn pitcher_slots_per_team(&self) -> usize {
        self.roster
            .iter()
            .filter_map(|(label, &count)| Slot::from_code(label).map(|s| (s, count)))
            .filter(|(slot, _)| slot.is_pitcher_slot())
            .map(|(_, count)| count)
            .sum()
    }

    /// Hitters drafted league-wide when every team fills its hitter slots.
    pub fn total_hitters_drafted(&self) -> usize {
        self.hitter_slots_per_team() * self.num_teams
    }

    /// Pitchers drafted league-wide when every team fills its pitcher slots.
    pub fn total_pitchers_drafted(&self) -> usize {
        self.pitcher_slots_per_team() * self.num_teams
    }

    /// League-wide demand per base position.
    ///
    /// Composite slots distribute their demand to constituents half and half
    /// (odd slot to the second constituent). UTIL demand is deliberately not
    /// attributed to any position; it widens the overall hitter pool, which
    /// `total_hitters_drafted` already accounts for.
    pub fn positional_demand(&self) -> BTreeMap<Position, usize> {
        let mut demand: BTreeMap<Position, usize> = BTreeMap::new();

        let mut add = |pos: Position, n: usize| {
            *demand.entry(pos).or_insert(0) += n;
        };

        for (label, &count) in &self.roster {
            let league_wide = count * self.num_teams;
            if league_wide == 0 {
                continue;
            }
            match Slot::from_code(label) {
                Some(Slot::Catcher) => add(Position::Catcher, league_wide),
                Some(Slot::FirstBase) => add(Position::FirstBase, league_wide),
                Some(Slot::SecondBase) => add(Position::SecondBase, league_wide),
                Some(Slot::ThirdBase) => add(Position::ThirdBase, league_wide),
                Some(Slot::ShortStop) => add(Position::ShortStop, league_wide),
                Some(Slot::Outfield) => add(Position::Outfield, league_wide),
                Some(Slot::StartingPitcher) => add(Position::StartingPitcher, league_wide),
                Some(Slot::ReliefPitcher) => add(Position::ReliefPitcher, league_wide),
                Some(Slot::CornerInfield) => {
                    add(Position::FirstBase, league_wide / 2);
                    add(Position::ThirdBase, league_wide - league_wide / 2);
                }
                Some(Slot::MiddleInfield) => {
                    add(Position::SecondBase, league_wide / 2);
                    add(Position::ShortStop, league_wide - league_wide / 2);
                }
                Some(Slot::Pitcher) => {
                    add(Position::StartingPitcher, league_wide / 2);
                    add(Position::ReliefPitcher, league_wide - league_wide / 2);
                }
                Some(Slot::Utility) | Some(Slot::Bench) | None => {}
            }
        }

        demand
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    budget: BudgetSection,
    #[serde(default)]
    replacement: ReplacementSection,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct BudgetSection {
    hitter_budget_fraction: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ReplacementSection {
    mode: ReplacementMode,
}

impl Default for ReplacementSection {
    fn default() -> Self {
        ReplacementSection {
            mode: ReplacementMode::Positional,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

/// How replacement level is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementMode {
    /// One baseline per player type (hitter / pitcher).
    Global,
    /// One baseline per roster position; the default.
    Positional,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub hitter_budget_fraction: f64,
    pub replacement_mode: ReplacementMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub hitters: String,
    pub pitchers: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, both relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;
    let league = league_file.league;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let config = Config {
        league,
        strategy: StrategyConfig {
            hitter_budget_fraction: strategy_file.budget.hitter_budget_fraction,
            replacement_mode: strategy_file.replacement.mode,
        },
        db_path: strategy_file.database.path,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };

        // Skip .example template files
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // File already exists in config/, skip it
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;

    if league.num_teams == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.num_teams".into(),
            message: "must be greater than 0".into(),
        });
    }

    if league.budget_per_team == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.budget_per_team".into(),
            message: "must be greater than 0".into(),
        });
    }

    if league.min_bid == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.min_bid".into(),
            message: "must be at least 1".into(),
        });
    }

    // Every roster label must be a recognized slot.
    for label in league.roster.keys() {
        if Slot::from_code(label).is_none() {
            return Err(ConfigError::ValidationError {
                field: format!("league.roster.{label}"),
                message: "unrecognized roster slot label".into(),
            });
        }
    }

    if league.hitter_slots_per_team() == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.roster".into(),
            message: "must configure at least one hitter slot".into(),
        });
    }

    if league.pitcher_slots_per_team() == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.roster".into(),
            message: "must configure at least one pitcher slot".into(),
        });
    }

    for (field, section) in [
        ("league.batting_categories", &league.batting_categories),
        ("league.pitching_categories", &league.pitching_categories),
    ] {
        if section.is_empty() {
            return Err(ConfigError::ValidationError {
                field: field.into(),
                message: "category set must not be empty".into(),
            });
        }
        let specs = section.specs();
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.name == spec.name) {
                return Err(ConfigError::ValidationError {
                    field: field.into(),
                    message: format!("category `{}` listed more than once", spec.name),
                });
            }
        }
    }

    let frac = config.strategy.hitter_budget_fraction;
    if !(0.0..=1.0).contains(&frac) {
        return Err(ConfigError::ValidationError {
            field: "budget.hitter_budget_fraction".into(),
            message: format!("must be between 0.0 and 1.0 inclusive, got {frac}"),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

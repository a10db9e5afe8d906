// Projection import: CSV files of projected season stats, one row per player.
//
// Expects FanGraphs-style column headers. The POS column carries eligibility
// tags separated by "/" or "," (e.g. "SS/2B"); unrecognized tags are dropped,
// leaving the player valued against the universal slot for their type.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::config::Config;
use crate::player::{Player, PlayerType, StatLine};
use crate::positions::Position;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Hitter CSV row. Counting stats are f64 because projection systems publish
/// fractional values. Extra columns are silently absorbed.
#[derive(Debug, Deserialize)]
#[allow(dead_code, non_snake_case)]
struct RawHitter {
    Name: String,
    #[serde(default)]
    Team: String,
    #[serde(default)]
    POS: String,
    #[serde(default)]
    PA: f64,
    AB: f64,
    #[serde(default)]
    H: f64,
    R: f64,
    HR: f64,
    RBI: f64,
    SB: f64,
    #[serde(alias = "BA")]
    AVG: f64,
    /// Absorb any extra columns the projection source includes.
    #[serde(flatten)]
    _extra: BTreeMap<String, serde_json::Value>,
}

/// Pitcher CSV row. The POS column distinguishes SP from RP.
#[derive(Debug, Deserialize)]
#[allow(dead_code, non_snake_case)]
struct RawPitcher {
    Name: String,
    #[serde(default)]
    Team: String,
    #[serde(default)]
    POS: String,
    IP: f64,
    W: f64,
    SV: f64,
    #[serde(alias = "SO")]
    K: f64,
    ERA: f64,
    WHIP: f64,
    /// Absorb any extra columns the projection source includes.
    #[serde(flatten)]
    _extra: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns true if all given f64 values are finite (not NaN or Infinity).
fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Parse a POS column into eligibility tags, dropping anything unrecognized.
fn parse_positions(pos: &str) -> Vec<Position> {
    let mut positions = Vec::new();
    for tag in pos.split(['/', ',']) {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        match Position::from_code(tag) {
            Some(p) if !positions.contains(&p) => positions.push(p),
            Some(_) => {}
            None => warn!("ignoring unrecognized position tag '{tag}'"),
        }
    }
    positions
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_hitters_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut hitters = Vec::new();
    for result in reader.deserialize::<RawHitter>() {
        match result {
            Ok(raw) => {
                let name = raw.Name.trim().to_string();
                if name.is_empty() {
                    warn!("skipping hitter row with empty name");
                    continue;
                }
                if !all_finite(&[raw.AB, raw.AVG]) {
                    warn!("skipping hitter '{name}': non-finite AB/AVG value");
                    continue;
                }
                let values: BTreeMap<String, f64> = [
                    ("R".to_string(), raw.R),
                    ("HR".to_string(), raw.HR),
                    ("RBI".to_string(), raw.RBI),
                    ("SB".to_string(), raw.SB),
                    ("AVG".to_string(), raw.AVG),
                ]
                .into_iter()
                .collect();
                hitters.push(Player::new(
                    0,
                    name,
                    raw.Team.trim().to_string(),
                    parse_positions(&raw.POS),
                    PlayerType::Hitter,
                    StatLine::new(values, raw.AB),
                ));
            }
            Err(e) => {
                warn!("skipping malformed hitter row: {e}");
            }
        }
    }
    Ok(hitters)
}

fn load_pitchers_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut pitchers = Vec::new();
    for result in reader.deserialize::<RawPitcher>() {
        match result {
            Ok(raw) => {
                let name = raw.Name.trim().to_string();
                if name.is_empty() {
                    warn!("skipping pitcher row with empty name");
                    continue;
                }
                if !all_finite(&[raw.IP, raw.ERA, raw.WHIP]) {
                    warn!("skipping pitcher '{name}': non-finite IP/ERA/WHIP value");
                    continue;
                }
                let values: BTreeMap<String, f64> = [
                    ("W".to_string(), raw.W),
                    ("SV".to_string(), raw.SV),
                    ("K".to_string(), raw.K),
                    ("ERA".to_string(), raw.ERA),
                    ("WHIP".to_string(), raw.WHIP),
                ]
                .into_iter()
                .collect();
                pitchers.push(Player::new(
                    0,
                    name,
                    raw.Team.trim().to_string(),
                    parse_positions(&raw.POS),
                    PlayerType::Pitcher,
                    StatLine::new(values, raw.IP),
                ));
            }
            Err(e) => {
                warn!("skipping malformed pitcher row: {e}");
            }
        }
    }
    Ok(pitchers)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open_csv(path: &str) -> Result<std::fs::File, ProjectionError> {
    std::fs::File::open(Path::new(path)).map_err(|e| ProjectionError::Io {
        path: path.to_string(),
        source: e,
    })
}

/// Load hitter projections from the configured CSV path.
pub fn load_hitters(path: &str) -> Result<Vec<Player>, ProjectionError> {
    let file = open_csv(path)?;
    load_hitters_from_reader(file).map_err(|e| ProjectionError::Csv {
        path: path.to_string(),
        source: e,
    })
}

/// Load pitcher projections from the configured CSV path.
pub fn load_pitchers(path: &str) -> Result<Vec<Player>, ProjectionError> {
    let file = open_csv(path)?;
    load_pitchers_from_reader(file).map_err(|e| ProjectionError::Csv {
        path: path.to_string(),
        source: e,
    })
}

/// Load the full projection set: hitters then pitchers.
pub fn load_all(config: &Config) -> Result<Vec<Player>, ProjectionError> {
    let mut players = load_hitters(&config.data_paths.hitters)?;
    players.extend(load_pitchers(&config.data_paths.pitchers)?);
    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

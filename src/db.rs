// SQLite persistence layer for players, derived values, and the pick log.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::draft::pick::DraftPick;
use crate::player::{Player, PlayerType, StatLine};
use crate::positions::Position;
use crate::valuation::recalc::ValuationEpoch;

/// Result of attempting to commit a valuation epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochOutcome {
    /// All derived values were written in one transaction.
    Committed,
    /// The stored pick log no longer matches the state the epoch was
    /// computed against. Nothing was written; recompute against fresh state
    /// and retry.
    Conflict { expected: usize, found: usize },
}

/// SQLite-backed persistence for players, draft picks, and key-value state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT NOT NULL,
                team          TEXT NOT NULL,
                positions     TEXT NOT NULL,
                player_type   TEXT NOT NULL,
                stat_line     TEXT NOT NULL,
                sgp           REAL NOT NULL DEFAULT 0,
                sgp_breakdown TEXT NOT NULL DEFAULT '{}',
                dollar_value  REAL NOT NULL DEFAULT 0,
                is_drafted    INTEGER NOT NULL DEFAULT 0,
                UNIQUE(name, team)
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                pick_number INTEGER PRIMARY KEY,
                team_id     TEXT NOT NULL,
                player_id   INTEGER NOT NULL REFERENCES players(id),
                player_name TEXT NOT NULL,
                price       INTEGER NOT NULL,
                timestamp   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Import players in a single transaction, assigning each its row id.
    ///
    /// Re-importing upserts on `(name, team)`: identity, positions, and the
    /// stat line are replaced, while derived values and the drafted flag are
    /// left alone so a projection refresh mid-draft cannot undraft anyone.
    pub fn import_players(&self, players: &mut [Player]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin import transaction")?;

        for player in players.iter_mut() {
            let positions_json = serde_json::to_string(&player.positions)
                .context("failed to serialize positions")?;
            let line_json = serde_json::to_string(&player.line)
                .context("failed to serialize stat line")?;

            let id: i64 = tx
                .query_row(
                    "INSERT INTO players (name, team, positions, player_type, stat_line)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(name, team) DO UPDATE SET
                        positions   = excluded.positions,
                        player_type = excluded.player_type,
                        stat_line   = excluded.stat_line
                     RETURNING id",
                    params![
                        player.name,
                        player.team,
                        positions_json,
                        player.player_type.as_str(),
                        line_json,
                    ],
                    |row| row.get(0),
                )
                .with_context(|| format!("failed to upsert player {}", player.name))?;
            player.id = id;
        }

        tx.commit().context("failed to commit import")?;
        Ok(())
    }

    /// Load every player record, derived fields included.
    pub fn load_players(&self) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, team, positions, player_type, stat_line,
                        sgp, sgp_breakdown, dollar_value, is_drafted
                 FROM players ORDER BY id",
            )
            .context("failed to prepare load_players query")?;

        let players = stmt
            .query_map([], |row| {
                let positions_json: String = row.get(3)?;
                let player_type_str: String = row.get(4)?;
                let line_json: String = row.get(5)?;
                let breakdown_json: String = row.get(7)?;

                let positions: Vec<Position> = serde_json::from_str(&positions_json)
                    .map_err(|e| json_column_error(3, e))?;
                let player_type = PlayerType::from_str_type(&player_type_str)
                    .ok_or_else(|| rusqlite::Error::InvalidColumnType(
                        4,
                        "player_type".into(),
                        rusqlite::types::Type::Text,
                    ))?;
                let line: StatLine =
                    serde_json::from_str(&line_json).map_err(|e| json_column_error(5, e))?;
                let sgp_breakdown = serde_json::from_str(&breakdown_json)
                    .map_err(|e| json_column_error(7, e))?;

                Ok(Player {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    team: row.get(2)?,
                    positions,
                    player_type,
                    line,
                    sgp: row.get(6)?,
                    sgp_breakdown,
                    dollar_value: row.get(8)?,
                    is_drafted: row.get(9)?,
                })
            })
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;

        Ok(players)
    }

    /// Persist a player's drafted flag.
    pub fn set_drafted(&self, player_id: i64, drafted: bool) -> Result<()> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE players SET is_drafted = ?2 WHERE id = ?1",
                params![player_id, drafted],
            )
            .context("failed to update drafted flag")?;
        anyhow::ensure!(changed == 1, "player {player_id} not found");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pick log
    // ------------------------------------------------------------------

    /// Append a pick to the log. Uses INSERT OR IGNORE for idempotency:
    /// re-recording the same pick_number is a no-op.
    pub fn record_pick(&self, pick: &DraftPick) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO draft_picks
                (pick_number, team_id, player_id, player_name, price, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                pick.pick_number,
                pick.team_id,
                pick.player_id,
                pick.player_name,
                pick.price,
                pick.timestamp.to_rfc3339(),
            ],
        )
        .context("failed to record draft pick")?;
        Ok(())
    }

    /// Remove a pick from the log (undo).
    pub fn delete_pick(&self, pick_number: u32) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM draft_picks WHERE pick_number = ?1",
            params![pick_number],
        )
        .context("failed to delete draft pick")?;
        Ok(())
    }

    /// Load all picks ordered by pick number.
    pub fn load_picks(&self) -> Result<Vec<DraftPick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT pick_number, team_id, player_id, player_name, price, timestamp
                 FROM draft_picks ORDER BY pick_number",
            )
            .context("failed to prepare load_picks query")?;

        let picks = stmt
            .query_map([], |row| {
                let ts: String = row.get(5)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            5,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(DraftPick {
                    pick_number: row.get(0)?,
                    team_id: row.get(1)?,
                    player_id: row.get(2)?,
                    player_name: row.get(3)?,
                    price: row.get(4)?,
                    timestamp,
                })
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        Ok(picks)
    }

    /// Number of picks currently in the log.
    pub fn pick_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM draft_picks", [], |row| row.get(0))
            .context("failed to count draft picks")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Valuation epochs
    // ------------------------------------------------------------------

    /// Commit a valuation epoch: overwrite derived values for every player
    /// it covers, all in one transaction.
    ///
    /// The epoch carries the pick count it was computed against. If the
    /// stored log has moved in the meantime the write is refused and
    /// `EpochOutcome::Conflict` returned; the caller recomputes against
    /// fresh state. Readers therefore never observe a half-updated pool.
    pub fn apply_epoch(&self, epoch: &ValuationEpoch) -> Result<EpochOutcome> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin epoch transaction")?;

        let found: i64 = tx
            .query_row("SELECT COUNT(*) FROM draft_picks", [], |row| row.get(0))
            .context("failed to count draft picks")?;
        let found = found as usize;
        if found != epoch.pick_seq {
            return Ok(EpochOutcome::Conflict {
                expected: epoch.pick_seq,
                found,
            });
        }

        for value in &epoch.values {
            let breakdown_json = serde_json::to_string(&value.sgp_breakdown)
                .context("failed to serialize sgp breakdown")?;
            tx.execute(
                "UPDATE players SET sgp = ?2, sgp_breakdown = ?3, dollar_value = ?4
                 WHERE id = ?1",
                params![value.player_id, value.sgp, breakdown_json, value.dollar_value],
            )
            .context("failed to write derived values")?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES ('epoch_pick_seq', ?1)",
            params![epoch.pick_seq.to_string()],
        )
        .context("failed to record epoch sequence")?;

        tx.commit().context("failed to commit epoch")?;
        Ok(EpochOutcome::Committed)
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`. Uses INSERT OR REPLACE so
    /// repeated saves overwrite the previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM draft_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| {
                let json_str: String = row.get(0)?;
                Ok(json_str)
            })
            .context("failed to query draft state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value: serde_json::Value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Delete all picks and state and reset every player to undrafted with
    /// zeroed derived values. Player identities and stat lines are preserved.
    pub fn clear_draft(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM draft_picks", [])
            .context("failed to delete draft picks")?;
        tx.execute("DELETE FROM draft_state", [])
            .context("failed to delete draft state")?;
        tx.execute(
            "UPDATE players SET is_drafted = 0, sgp = 0, sgp_breakdown = '{}', dollar_value = 0",
            [],
        )
        .context("failed to reset players")?;
        tx.commit().context("failed to commit clear_draft")?;
        Ok(())
    }
}

/// Wrap a serde_json error as a rusqlite column conversion failure so it can
/// flow out of a `query_map` closure.
fn json_column_error(column: usize, e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::recalc::PlayerValue;
    use std::collections::BTreeMap;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_players() -> Vec<Player> {
        vec![
            Player::new(
                0,
                "Alpha Hitter",
                "AAA",
                vec![Position::ShortStop, Position::SecondBase],
                PlayerType::Hitter,
                StatLine::new(
                    [("HR".to_string(), 30.0), ("AVG".to_string(), 0.290)]
                        .into_iter()
                        .collect(),
                    560.0,
                ),
            ),
            Player::new(
                0,
                "Beta Pitcher",
                "BBB",
                vec![Position::StartingPitcher],
                PlayerType::Pitcher,
                StatLine::new(
                    [("K".to_string(), 210.0), ("ERA".to_string(), 3.10)]
                        .into_iter()
                        .collect(),
                    190.0,
                ),
            ),
        ]
    }

    fn sample_pick(pick_number: u32, player_id: i64) -> DraftPick {
        DraftPick {
            pick_number,
            team_id: "team_1".to_string(),
            player_id,
            player_name: format!("Player {player_id}"),
            price: 25,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn import_assigns_ids_and_load_roundtrips() {
        let db = test_db();
        let mut players = sample_players();
        db.import_players(&mut players).unwrap();

        assert!(players[0].id > 0);
        assert!(players[1].id > 0);
        assert_ne!(players[0].id, players[1].id);

        let loaded = db.load_players().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Alpha Hitter");
        assert_eq!(
            loaded[0].positions,
            vec![Position::ShortStop, Position::SecondBase]
        );
        assert_eq!(loaded[0].player_type, PlayerType::Hitter);
        assert_eq!(loaded[0].line.get("HR"), 30.0);
        assert_eq!(loaded[0].line.denominator(), 560.0);
        assert!(!loaded[0].is_drafted);
        assert_eq!(loaded[1].line.get("ERA"), 3.10);
    }

    #[test]
    fn reimport_updates_line_but_preserves_draft_state() {
        let db = test_db();
        let mut players = sample_players();
        db.import_players(&mut players).unwrap();
        db.set_drafted(players[0].id, true).unwrap();

        // Re-import the same players with a fresher projection.
        let mut again = sample_players();
        db.import_players(&mut again).unwrap();
        assert_eq!(again[0].id, players[0].id);

        let loaded = db.load_players().unwrap();
        assert!(loaded[0].is_drafted, "reimport must not undraft a player");
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn drafted_flag_roundtrip() {
        let db = test_db();
        let mut players = sample_players();
        db.import_players(&mut players).unwrap();

        db.set_drafted(players[0].id, true).unwrap();
        let loaded = db.load_players().unwrap();
        assert!(loaded[0].is_drafted);
        assert!(!loaded[1].is_drafted);

        db.set_drafted(players[0].id, false).unwrap();
        let loaded = db.load_players().unwrap();
        assert!(!loaded[0].is_drafted);
    }

    #[test]
    fn set_drafted_unknown_player_errors() {
        let db = test_db();
        assert!(db.set_drafted(999, true).is_err());
    }

    #[test]
    fn pick_log_roundtrip_and_delete() {
        let db = test_db();
        let mut players = sample_players();
        db.import_players(&mut players).unwrap();

        db.record_pick(&sample_pick(1, players[0].id)).unwrap();
        db.record_pick(&sample_pick(2, players[1].id)).unwrap();
        assert_eq!(db.pick_count().unwrap(), 2);

        let picks = db.load_picks().unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].pick_number, 1);
        assert_eq!(picks[1].player_id, players[1].id);

        db.delete_pick(1).unwrap();
        let picks = db.load_picks().unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].pick_number, 2);
    }

    #[test]
    fn record_pick_is_idempotent() {
        let db = test_db();
        let mut players = sample_players();
        db.import_players(&mut players).unwrap();

        let pick = sample_pick(1, players[0].id);
        db.record_pick(&pick).unwrap();
        db.record_pick(&pick).unwrap();
        assert_eq!(db.pick_count().unwrap(), 1);
    }

    #[test]
    fn apply_epoch_writes_all_derived_values() {
        let db = test_db();
        let mut players = sample_players();
        db.import_players(&mut players).unwrap();

        let breakdown: BTreeMap<String, f64> =
            [("HR".to_string(), 1.5)].into_iter().collect();
        let epoch = ValuationEpoch {
            pick_seq: 0,
            values: vec![PlayerValue {
                player_id: players[0].id,
                sgp: 4.2,
                sgp_breakdown: breakdown.clone(),
                dollar_value: 31.0,
            }],
        };

        let outcome = db.apply_epoch(&epoch).unwrap();
        assert_eq!(outcome, EpochOutcome::Committed);

        let loaded = db.load_players().unwrap();
        assert_eq!(loaded[0].sgp, 4.2);
        assert_eq!(loaded[0].dollar_value, 31.0);
        assert_eq!(loaded[0].sgp_breakdown, breakdown);
        // The second player was not in the epoch and is untouched.
        assert_eq!(loaded[1].sgp, 0.0);
    }

    #[test]
    fn apply_epoch_refuses_stale_pick_seq() {
        let db = test_db();
        let mut players = sample_players();
        db.import_players(&mut players).unwrap();

        // Epoch computed before this pick landed.
        let epoch = ValuationEpoch {
            pick_seq: 0,
            values: vec![PlayerValue {
                player_id: players[0].id,
                sgp: 4.2,
                sgp_breakdown: BTreeMap::new(),
                dollar_value: 31.0,
            }],
        };
        db.record_pick(&sample_pick(1, players[1].id)).unwrap();

        let outcome = db.apply_epoch(&epoch).unwrap();
        assert_eq!(
            outcome,
            EpochOutcome::Conflict {
                expected: 0,
                found: 1
            }
        );

        // Nothing was written.
        let loaded = db.load_players().unwrap();
        assert_eq!(loaded[0].sgp, 0.0);
        assert_eq!(loaded[0].dollar_value, 0.0);
    }

    #[test]
    fn state_kv_roundtrip() {
        let db = test_db();
        assert!(db.load_state("missing").unwrap().is_none());

        db.save_state("mode", &serde_json::json!("positional")).unwrap();
        assert_eq!(
            db.load_state("mode").unwrap(),
            Some(serde_json::json!("positional"))
        );

        db.save_state("mode", &serde_json::json!("global")).unwrap();
        assert_eq!(
            db.load_state("mode").unwrap(),
            Some(serde_json::json!("global"))
        );
    }

    #[test]
    fn clear_draft_resets_picks_and_derived_values() {
        let db = test_db();
        let mut players = sample_players();
        db.import_players(&mut players).unwrap();
        db.set_drafted(players[0].id, true).unwrap();
        db.record_pick(&sample_pick(1, players[0].id)).unwrap();

        let epoch = ValuationEpoch {
            pick_seq: 1,
            values: vec![PlayerValue {
                player_id: players[1].id,
                sgp: 2.0,
                sgp_breakdown: BTreeMap::new(),
                dollar_value: 12.0,
            }],
        };
        assert_eq!(db.apply_epoch(&epoch).unwrap(), EpochOutcome::Committed);

        db.clear_draft().unwrap();
        assert_eq!(db.pick_count().unwrap(), 0);
        let loaded = db.load_players().unwrap();
        assert_eq!(loaded.len(), 2, "players survive a draft reset");
        for player in &loaded {
            assert!(!player.is_drafted);
            assert_eq!(player.sgp, 0.0);
            assert_eq!(player.dollar_value, 0.0);
        }
    }
}

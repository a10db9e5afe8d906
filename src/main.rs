// Auction valuation CLI entry point.
//
// Commands:
//   rotovalue import                        import projection CSVs into the db
//   rotovalue values [N]                    recalculate and print the top N
//   rotovalue pick <player-id> <team> <$>   commit a pick and recalculate
//   rotovalue undo [pick-number]            undo a pick and recalculate
//   rotovalue reset                         clear the draft (players survive)

use anyhow::{bail, Context};
use tracing::info;

use rotovalue::config::{self, Config};
use rotovalue::db::{Database, EpochOutcome};
use rotovalue::draft::state::DraftState;
use rotovalue::player::Player;
use rotovalue::projections;
use rotovalue::valuation;

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, ${} per team",
        config.league.name, config.league.num_teams, config.league.budget_per_team
    );

    let db = Database::open(&config.db_path).context("failed to open database")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("import") => cmd_import(&config, &db),
        Some("values") => {
            let limit = args
                .get(1)
                .map(|s| s.parse::<usize>().context("invalid limit"))
                .transpose()?
                .unwrap_or(40);
            cmd_values(&config, &db, limit)
        }
        Some("pick") => {
            let (player_id, team_id, price) = match (args.get(1), args.get(2), args.get(3)) {
                (Some(p), Some(t), Some(d)) => (
                    p.parse::<i64>().context("invalid player id")?,
                    t.clone(),
                    d.parse::<u32>().context("invalid price")?,
                ),
                _ => bail!("usage: rotovalue pick <player-id> <team-id> <price>"),
            };
            cmd_pick(&config, &db, player_id, &team_id, price)
        }
        Some("undo") => {
            let pick_number = args
                .get(1)
                .map(|s| s.parse::<u32>().context("invalid pick number"))
                .transpose()?;
            cmd_undo(&config, &db, pick_number)
        }
        Some("reset") => {
            db.clear_draft().context("failed to reset draft")?;
            println!("Draft cleared.");
            Ok(())
        }
        _ => {
            eprintln!(
                "usage: rotovalue <import | values [n] | pick <player-id> <team-id> <price> | undo [pick-number] | reset>"
            );
            Ok(())
        }
    }
}

/// Import projection CSVs into the database.
fn cmd_import(config: &Config, db: &Database) -> anyhow::Result<()> {
    let mut players = projections::load_all(config).context("failed to load projections")?;
    db.import_players(&mut players)
        .context("failed to import players")?;
    println!("Imported {} players.", players.len());
    Ok(())
}

/// Load committed state, rebuild the draft, recalculate, and commit the epoch.
///
/// Returns the freshly valued pool. On an epoch conflict (the pick log moved
/// underneath us) the computation is retried once against fresh state.
fn revalue(config: &Config, db: &Database) -> anyhow::Result<Vec<Player>> {
    for _ in 0..2 {
        let mut players = db.load_players().context("failed to load players")?;
        let picks = db.load_picks().context("failed to load picks")?;

        let epoch = valuation::recalculate(&players, &picks, &config.league, &config.strategy);
        match db.apply_epoch(&epoch).context("failed to apply epoch")? {
            EpochOutcome::Committed => {
                valuation::apply_epoch(&mut players, &epoch);
                return Ok(players);
            }
            EpochOutcome::Conflict { expected, found } => {
                info!(expected, found, "epoch conflict, recomputing");
            }
        }
    }
    bail!("valuation epoch kept conflicting with concurrent draft transactions")
}

/// Recalculate and print a value sheet of the best available players.
fn cmd_values(config: &Config, db: &Database, limit: usize) -> anyhow::Result<()> {
    let mut players = revalue(config, db)?;
    players.retain(|p| !p.is_drafted);
    players.sort_by(|a, b| {
        b.dollar_value
            .partial_cmp(&a.dollar_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!(
        "{:>5}  {:<24} {:<4} {:<12} {:>7} {:>7}",
        "ID", "PLAYER", "TEAM", "POS", "SGP", "VALUE"
    );
    for player in players.iter().take(limit) {
        let pos: Vec<&str> = player.positions.iter().map(|p| p.code()).collect();
        println!(
            "{:>5}  {:<24} {:<4} {:<12} {:>7.2} {:>7.1}",
            player.id,
            player.name,
            player.team,
            pos.join("/"),
            player.sgp,
            player.dollar_value,
        );
    }
    Ok(())
}

/// Commit a pick, then recalculate the remaining pool.
fn cmd_pick(
    config: &Config,
    db: &Database,
    player_id: i64,
    team_id: &str,
    price: u32,
) -> anyhow::Result<()> {
    let mut players = db.load_players().context("failed to load players")?;
    let picks = db.load_picks().context("failed to load picks")?;

    let mut draft = DraftState::new(&config.league);
    draft.restore_from_picks(&mut players, picks);

    let pick = draft
        .pick(&mut players, player_id, team_id, price)
        .context("pick rejected")?
        .clone();

    db.record_pick(&pick).context("failed to record pick")?;
    db.set_drafted(player_id, true)
        .context("failed to flag player drafted")?;
    println!(
        "Pick {}: {} to {} for ${}",
        pick.pick_number, pick.player_name, pick.team_id, pick.price
    );

    revalue(config, db)?;
    println!("Values recalculated.");
    Ok(())
}

/// Undo the given pick (or the most recent), then recalculate.
fn cmd_undo(config: &Config, db: &Database, pick_number: Option<u32>) -> anyhow::Result<()> {
    let mut players = db.load_players().context("failed to load players")?;
    let picks = db.load_picks().context("failed to load picks")?;

    let mut draft = DraftState::new(&config.league);
    draft.restore_from_picks(&mut players, picks);

    let undone = match pick_number {
        Some(n) => draft.undo(&mut players, n).context("undo rejected")?,
        None => draft.undo_last(&mut players).context("undo rejected")?,
    };

    db.delete_pick(undone.pick_number)
        .context("failed to delete pick")?;
    db.set_drafted(undone.player_id, false)
        .context("failed to flag player undrafted")?;
    println!(
        "Undid pick {}: {} back to the pool",
        undone.pick_number, undone.player_name
    );

    revalue(config, db)?;
    println!("Values recalculated.");
    Ok(())
}

/// Initialize tracing to stderr, filtered by RUST_LOG (default: info for
/// this crate, warnings elsewhere).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rotovalue=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

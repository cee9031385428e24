//! corsair: headless host for the Corsair simulation core.
//!
//! Usage:
//!   corsair --resources ./data --ticks 3600
//!   corsair --resources ./data --test "Default Start"
//!   corsair --parse-save "Jane Doe.txt"

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use corsair_core::catalog::Catalog;
use corsair_core::error::Diagnostics;
use corsair_core::events::ShipEventKind;
use corsair_core::save;
use corsair_core::state::GameStateSnapshot;
use corsair_core::universe::StartConditions;
use corsair_sim::{SimConfig, SimulationEngine};

#[derive(Parser, Debug)]
#[command(name = "corsair", version)]
#[command(about = "Run the Corsair space-combat simulation without a window")]
struct Args {
    /// Content root holding the data files.
    #[arg(long, default_value = "./data")]
    resources: PathBuf,

    /// User directory for saves. Defaults to the platform config dir.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the named start headless and fail on any content issue.
    #[arg(long, value_name = "NAME")]
    test: Option<String>,

    /// Log at debug level.
    #[arg(long)]
    debug: bool,

    /// Parse a save file, print its summary and write it back out.
    #[arg(long, value_name = "FILE")]
    parse_save: Option<PathBuf>,

    /// RNG seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Print the final snapshot as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = args.config.clone().unwrap_or_else(default_config_dir);
    log::debug!("config directory {}", config.display());

    if let Some(path) = &args.parse_save {
        return parse_save(&resolve_save(&config, path));
    }

    let (catalog, issues) = Catalog::load_dir(&args.resources)
        .with_context(|| format!("loading content from {}", args.resources.display()))?;
    if args.test.is_some() && !issues.is_empty() {
        for issue in &issues {
            eprintln!("{issue}");
        }
        bail!("{} content issues", issues.len());
    }
    let catalog = Arc::new(catalog);

    let start = match &args.test {
        Some(name) => catalog
            .starts
            .iter()
            .find(|start| &start.name == name)
            .with_context(|| format!("no start named {name:?}"))?,
        None => catalog.starts.first().context("content defines no start")?,
    };
    let last = run(Arc::clone(&catalog), start, &args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&last)?);
    } else {
        print_summary(&last);
    }
    Ok(())
}

/// Simulate `args.ticks` ticks from `start`. Returns the final snapshot.
fn run(catalog: Arc<Catalog>, start: &StartConditions, args: &Args) -> Result<GameStateSnapshot> {
    let mut engine = SimulationEngine::new(
        catalog,
        SimConfig {
            seed: args.seed,
            ..Default::default()
        },
    );
    if engine.start(start).is_none() {
        bail!("start {:?} places no ships", start.name);
    }

    let mut last = GameStateSnapshot::default();
    let mut destroyed = 0usize;
    let mut jumps = 0usize;
    for _ in 0..args.ticks {
        last = engine.tick();
        for event in &last.events {
            match event.kind {
                ShipEventKind::Destroy => destroyed += 1,
                ShipEventKind::Jump { .. } => jumps += 1,
                _ => {}
            }
        }
        if !engine.ledger().is_balanced() {
            log::warn!("tick {}: damage ledger off: {:?}", last.time.tick, engine.ledger());
        }
    }
    log::info!(
        "{} ticks: {} ships destroyed, {} jumps",
        args.ticks,
        destroyed,
        jumps
    );
    Ok(last)
}

fn print_summary(snapshot: &GameStateSnapshot) {
    println!("tick {} (day {:.2})", snapshot.time.tick, snapshot.time.day);
    println!(
        "  ships: {}  projectiles: {}  flotsam: {}  weather: {}",
        snapshot.ships.len(),
        snapshot.projectiles.len(),
        snapshot.flotsam.len(),
        snapshot.weather.len()
    );
    for ship in snapshot.ships.iter().filter(|ship| ship.is_player) {
        println!(
            "  flagship {}: shields {:.0}  hull {:.0}  fuel {:.0}",
            ship.name, ship.shields, ship.hull, ship.fuel
        );
    }
}

fn parse_save(path: &Path) -> Result<()> {
    let mut diagnostics = Diagnostics::new();
    let (file, summary) =
        save::parse_save(path, &mut diagnostics).with_context(|| format!("reading {}", path.display()))?;
    println!("pilot: {}", summary.pilot.as_deref().unwrap_or("(none)"));
    if let Some(system) = &summary.system {
        println!("system: {system}");
    }
    if let Some(planet) = &summary.planet {
        println!("planet: {planet}");
    }
    for (key, count) in &summary.counts {
        println!("  {key}: {count}");
    }
    if summary.unknown > 0 {
        println!("  other: {}", summary.unknown);
    }
    for issue in diagnostics.issues() {
        eprintln!("{issue}");
    }
    print!("{}", file.to_text());
    Ok(())
}

/// Save names without a directory live under `<config>/saves`.
fn resolve_save(config: &Path, path: &Path) -> PathBuf {
    if path.exists() || path.components().count() > 1 {
        path.to_path_buf()
    } else {
        config.join("saves").join(path)
    }
}

fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(dir).join("corsair");
    }
    if let Some(dir) = std::env::var_os("APPDATA") {
        return PathBuf::from(dir).join("corsair");
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config").join("corsair"),
        None => PathBuf::from("corsair"),
    }
}

mod board;
mod clock;
mod direction;
mod error;
mod food;
mod game;
mod input;
mod manager;
mod settings;
mod snake;
mod term;
mod util;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::settings::SettingsStore;

pub type TermInt = u16;
pub type Coords = (u16, u16);

#[derive(Parser)]
#[command(name = "grid_snake")]
#[command(version, about = "Snake on a fixed-size grid, in the terminal")]
struct Cli {
    /// Board width in cells (10-30)
    #[arg(long)]
    width: Option<u32>,

    /// Board height in cells (10-30)
    #[arg(long)]
    height: Option<u32>,

    /// Moves per second (5-30)
    #[arg(long)]
    speed: Option<u32>,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,

    /// Settings file, instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let store = cli.config.clone().map(SettingsStore::new).or_else(SettingsStore::default_location);
    let stored = store.as_ref().map(SettingsStore::load_or_default).unwrap_or_default();

    let settings = stored.with_overrides(cli.width, cli.height, cli.speed);
    settings.validate()?;

    if let Some(store) = &store {
        store.save(&settings)?;
    }

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(?settings, seed = ?cli.seed, "starting");

    let mut game = game::SnakeGame::new(settings, rng)?;
    game.run()
}

/// The game owns the terminal, so logs only ever go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("could not create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

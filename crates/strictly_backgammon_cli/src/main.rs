//! Strictly Backgammon - command-line driver
//!
//! Plays robot games through the engine's message handlers and inspects
//! recorded games and position ids.

#![warn(missing_docs)]

mod cli;
mod config;
mod orchestrator;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use config::MatchConfig;
use orchestrator::{MatchResult, Orchestrator};
use std::path::{Path, PathBuf};
use strictly_backgammon::{
    AnyGame, Board, Color, Direction, GameHistory, GameStateSnapshot, RandomRoller,
    START_POSITION_ID,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_backgammon=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            seed,
            max_turns,
            history_out,
            quiet,
        } => run_play(config, seed, max_turns, history_out, quiet),
        Command::PositionId { snapshot } => run_position_id(snapshot.as_deref()),
        Command::Show { file, at } => run_show(&file, at),
        Command::Decode { id, on_roll } => run_decode(&id, &on_roll),
    }
}

/// Plays one robot game.
#[instrument]
fn run_play(
    config: Option<PathBuf>,
    seed: Option<u64>,
    max_turns: Option<u32>,
    history_out: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let config = match &config {
        Some(path) => MatchConfig::from_file(path)?,
        None => MatchConfig::default(),
    }
    .with_seed(seed)
    .with_max_turns(max_turns);

    let roller = match config.seed() {
        Some(seed) => RandomRoller::seeded(*seed),
        None => RandomRoller::from_entropy(),
    };
    let mut orchestrator = Orchestrator::new(&config, roller, quiet)?;
    let result = orchestrator.run()?;

    println!();
    println!("{}", orchestrator.game().board().ascii());
    match result {
        MatchResult::Finished(outcome) => println!("{}", outcome),
        MatchResult::Abandoned { turns } => println!("abandoned after {} turns", turns),
    }
    println!("position id {}", orchestrator.game().position_id());

    if let Some(path) = history_out {
        let json = orchestrator.history().to_json()?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write history to {}", path.display()))?;
        info!(path = %path.display(), actions = orchestrator.history().len(), "History saved");
    }
    Ok(())
}

/// Prints a position id.
#[instrument]
fn run_position_id(snapshot: Option<&Path>) -> Result<()> {
    let Some(path) = snapshot else {
        println!("{}", START_POSITION_ID);
        return Ok(());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let game = GameStateSnapshot::from_json(&json)?.reconstruct()?;
    println!("{}", game.position_id());
    Ok(())
}

/// Prints a recorded game.
#[instrument]
fn run_show(file: &Path, at: Option<u64>) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let history = GameHistory::from_json(&json)?;
    history.verify_integrity()?;
    let game = match at {
        Some(sequence) => history.reconstruct_at(sequence)?,
        None => history.reconstruct_latest()?,
    };
    print_game(&game);
    if let Some(outcome) = &history.metadata().final_outcome {
        println!("result {}", outcome);
    }
    Ok(())
}

fn print_game(game: &AnyGame) {
    let pips = game.board().pip_counts();
    println!("{}", game.board().ascii());
    println!(
        "{} after {} turns, pips black {} white {}",
        game.kind(),
        game.core().turn_number(),
        pips.get(Color::Black),
        pips.get(Color::White),
    );
    if let Some(color) = game.active_color() {
        println!("{} to act", color);
    }
    println!("position id {}", game.position_id());
}

/// Draws the board behind a position id.
#[instrument]
fn run_decode(id: &str, on_roll: &str) -> Result<()> {
    let on_roll = match on_roll.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "white" => Color::White,
        other => anyhow::bail!("unknown color {}", other),
    };
    let board = Board::from_position_id(id, on_roll, Direction::Clockwise)?;
    let pips = board.pip_counts();
    println!("{}", board.ascii());
    println!(
        "{} on roll, pips black {} white {}",
        on_roll,
        pips.get(Color::Black),
        pips.get(Color::White),
    );
    Ok(())
}

//! Command-line interface for the backgammon driver.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Backgammon - robot self-play and position tools
#[derive(Parser, Debug)]
#[command(name = "backgammon")]
#[command(about = "Backgammon state machine driver", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a robot-vs-robot game through the message handlers
    Play {
        /// Path to a match configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dice seed (overrides the config)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Turn limit (overrides the config)
        #[arg(long)]
        max_turns: Option<u32>,

        /// Write the action history as JSON to this file
        #[arg(long)]
        history_out: Option<PathBuf>,

        /// Only print the final result
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the position id of the start position or of a saved snapshot
    PositionId {
        /// Snapshot JSON to read
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Show the game recorded in a history file
    Show {
        /// History JSON written by `play --history-out`
        file: PathBuf,

        /// Sequence number to show (latest when omitted)
        #[arg(long)]
        at: Option<u64>,
    },

    /// Draw the board encoded by a GNU Backgammon position id
    Decode {
        /// 14-character position id
        id: String,

        /// Color on roll
        #[arg(long, default_value = "black")]
        on_roll: String,
    },
}

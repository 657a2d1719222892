//! CLI command definitions for the `wroom` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod report;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run multi-character dialog scenes and write their transcripts.
#[derive(Parser)]
#[command(name = "wroom", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Directory holding `writers_room.toml`.
    #[arg(long, global = true, env = "WRITERS_ROOM_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a production: every scene in order, one transcript per scene.
    Run(run::RunArgs),

    /// Count lines per character in saved transcripts.
    Report {
        /// Transcript files to read.
        #[arg(required = true)]
        transcripts: Vec<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

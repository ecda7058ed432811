//! Command line argument parsing for the index-queue CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::gateway::config::IndexingMode;

/// index-queue - deferred, coalescing search index updates
#[derive(Parser, Debug, Clone)]
#[command(name = "index-queue")]
#[command(about = "Replay content changes through a deferred, coalescing index queue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct IndexQueueArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl IndexQueueArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a JSON script of content changes and queries through a gateway
    Replay(ReplayArgs),

    /// Show what a sequence of operations on one object coalesces to
    Coalesce(CoalesceArgs),
}

/// Arguments for replaying a script
#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    /// Script file (JSON)
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Gateway configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Override the indexing mode from the configuration
    #[arg(short, long)]
    pub mode: Option<ModeArg>,
}

/// Arguments for coalescing an operation sequence
#[derive(Parser, Debug, Clone)]
pub struct CoalesceArgs {
    /// Operations in request order: index, unindex, reindex, reindex:attr1,attr2
    #[arg(value_name = "OPERATION", required = true)]
    pub operations: Vec<String>,
}

/// Indexing mode as a CLI value
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Queue and coalesce, apply on flush
    Queued,
    /// Apply every request right away
    Immediate,
}

impl From<ModeArg> for IndexingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Queued => IndexingMode::Queued,
            ModeArg::Immediate => IndexingMode::Immediate,
        }
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

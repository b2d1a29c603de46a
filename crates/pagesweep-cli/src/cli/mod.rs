//! CLI for pagesweep.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pagesweep_core::config;
use pagesweep_core::orchestrator::RunMode;
use std::path::PathBuf;

use commands::{run_hash, run_reset, run_status, run_sweep};

/// Top-level CLI for pagesweep.
#[derive(Debug, Parser)]
#[command(name = "pagesweep")]
#[command(about = "pagesweep: index, resume and download paginated file inventories", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/pagesweep/config.toml (created if missing).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Scan listings and/or download missing files for the selected collections.
    Run {
        /// Collections to process, e.g. "1,3,5" or "1-11". Prompts when omitted.
        #[arg(long, short, value_name = "LIST")]
        collections: Option<String>,
        /// What to do. Prompts when omitted.
        #[arg(long, short, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Show index counts and scan position per collection.
    Status {
        /// Collections to show (default: all configured).
        #[arg(long, short, value_name = "LIST")]
        collections: Option<String>,
    },

    /// Clear the attempt history of files that were never downloaded.
    Reset {
        /// Collections to reset (default: all configured).
        #[arg(long, short, value_name = "LIST")]
        collections: Option<String>,
    },

    /// Record SHA-256 hashes for downloaded files that have none.
    Hash {
        /// Collections to hash (default: all configured).
        #[arg(long, short, value_name = "LIST")]
        collections: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Scan listing pages and update the index; no downloads.
    Scan,
    /// Download files missing from disk; no scanning.
    Download,
    /// Scan, then download.
    Sync,
}

impl From<ModeArg> for RunMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Scan => RunMode::Scan,
            ModeArg::Download => RunMode::Download,
            ModeArg::Sync => RunMode::Sync,
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run { collections, mode } => {
                run_sweep(&cfg, collections.as_deref(), mode.map(RunMode::from)).await?
            }
            CliCommand::Status { collections } => run_status(&cfg, collections.as_deref())?,
            CliCommand::Reset { collections } => run_reset(&cfg, collections.as_deref())?,
            CliCommand::Hash { collections } => run_hash(&cfg, collections.as_deref()).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

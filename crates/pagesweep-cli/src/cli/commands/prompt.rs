//! Interactive selection when `run` is called without flags.

use anyhow::{Context, Result};
use pagesweep_core::collection::parse_selection;
use pagesweep_core::orchestrator::RunMode;
use std::io::{BufRead, Write};

use super::join_ids;

fn ask(question: &str) -> Result<String> {
    let mut out = std::io::stdout().lock();
    write!(out, "{question}")?;
    out.flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read answer from stdin")?;
    Ok(line.trim().to_string())
}

pub fn ask_collections(available: &[u32]) -> Result<Vec<u32>> {
    println!();
    println!("Available collections:");
    println!("{}", join_ids(available));
    let raw = ask("\nEnter collection numbers separated by commas (example: 1,3,5) or a range (example: 1-11): ")?;
    let ids = parse_selection(&raw, available);
    if ids.is_empty() {
        anyhow::bail!("no valid collections selected");
    }
    Ok(ids)
}

/// Blank or unrecognized answers mean sync.
pub fn mode_from_answer(raw: &str) -> RunMode {
    raw.parse().unwrap_or(RunMode::Sync)
}

pub fn ask_mode() -> Result<RunMode> {
    println!();
    println!("Mode options:");
    println!("  1 scan     = only scan and update index (no downloads)");
    println!("  2 download = only download missing files from index (no scanning)");
    println!("  3 sync     = scan + download (recommended)");
    Ok(mode_from_answer(&ask("\nChoose mode [sync]: ")?))
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "semitexa", about = "Schema-sync ORM shell over semitexa-core", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Server version, pool size, capability matrix, table/column/index
    /// counts, validation errors/warnings, and a sync-pending summary.
    Status,
    /// Prints the pending operations without touching the database.
    Diff,
    /// Reconciles the live schema to match the declared schema.
    Sync {
        /// Compute and print the plan but never execute it.
        #[arg(long)]
        dry_run: bool,
        /// Apply destructive operations (drops, narrowing alters) instead
        /// of skipping them.
        #[arg(long)]
        allow_destructive: bool,
        /// Write the applied/skipped SQL script to this file.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Upserts every registered seed source's `defaults()` rows.
    Seed,
}

//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod load;
pub mod status;
pub mod transform;
pub mod wipe;

/// IATI Graph - relational dump to property graph
#[derive(Parser)]
#[command(name = "iatigraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true, default_value = "iatigraph.db")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recompute the derived tables from the raw source tables
    Transform,

    /// Load the derived tables into Neo4j
    Load(load::LoadArgs),

    /// Delete everything in the Neo4j graph
    Wipe,

    /// Show row counts and graph totals
    Status,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Transform => transform::execute(&self.db),
            Commands::Load(args) => load::execute(&self.db, args).await,
            Commands::Wipe => wipe::execute().await,
            Commands::Status => status::execute(&self.db).await,
        }
    }
}

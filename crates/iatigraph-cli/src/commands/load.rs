//! `iatigraph load` - push the derived tables into Neo4j.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use iatigraph_db::DbPool;
use iatigraph_graph::{load, schema, wipe, GraphClient};

#[derive(Args)]
pub struct LoadArgs {
    /// Load node tables only
    #[arg(long, conflicts_with = "edges")]
    pub nodes: bool,

    /// Load edge tables only (nodes must already be present)
    #[arg(long, conflicts_with = "nodes")]
    pub edges: bool,

    /// Skip constraint and index creation
    #[arg(long)]
    pub skip_constraints: bool,

    /// Keep the existing graph instead of wiping it first
    #[arg(long)]
    pub skip_wipe: bool,
}

pub async fn execute(db_path: &Path, args: LoadArgs) -> Result<()> {
    let pool = DbPool::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    println!("{}", "Connecting to Neo4j...".bold());
    let client = GraphClient::connect_from_env()
        .await
        .context("Could not reach Neo4j")?;

    if !args.skip_constraints {
        schema::initialize_schema(&client).await?;
    }

    // Edge-only loads target an already populated graph; wiping it
    // would strip the very nodes the edges need.
    if !args.skip_wipe && !args.edges {
        println!("{}", "Wiping existing graph...".bold());
        wipe::wipe_graph(&client).await?;
    }

    let result = if args.nodes {
        load::load_all_nodes(&client, &pool).await?
    } else if args.edges {
        load::load_all_edges(&client, &pool).await?
    } else {
        load::run_full_load(&client, &pool).await?
    };

    println!("\n{}", "Load complete:".green().bold());
    println!("  Nodes written:         {}", result.nodes_written);
    println!("  Relationships written: {}", result.relationships_written);

    Ok(())
}

//! `iatigraph wipe` - clear the Neo4j graph.

use anyhow::{Context, Result};
use colored::Colorize;

use iatigraph_graph::{wipe, GraphClient};

pub async fn execute() -> Result<()> {
    println!("{}", "Connecting to Neo4j...".bold());
    let client = GraphClient::connect_from_env()
        .await
        .context("Could not reach Neo4j")?;

    wipe::wipe_graph(&client).await?;

    println!("{}", "Graph wiped.".green().bold());
    Ok(())
}

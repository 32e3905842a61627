//! `iatigraph status` - derived table counts and graph totals.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use iatigraph_db::queries::meta;
use iatigraph_db::{migrations, DbPool};
use iatigraph_graph::GraphClient;

const DERIVED_TABLES: &[&str] = &[
    "published_activities",
    "published_organisations",
    "phantom_organisations",
    "phantom_activities",
    "participation_links",
    "financial_links",
    "funds_links",
    "hierarchy_links",
    "activity_participation_summary_links",
];

pub async fn execute(db_path: &Path) -> Result<()> {
    let pool = DbPool::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    migrations::run_migrations(&pool).context("Failed to run migrations")?;

    println!("{}", "Derived tables".bold());
    println!("{}", "─".repeat(50));
    for table in DERIVED_TABLES {
        let count = meta::table_count(&pool, table)?;
        println!("  {:<40} {}", table, count.to_string().cyan());
    }

    match meta::last_run_time(&pool)? {
        Some(run_at) => println!("\nLast transform: {}", run_at.yellow()),
        None => println!("\n{}", "No transform recorded yet.".dimmed()),
    }

    // Graph totals are best-effort; the relational status is still
    // useful when Neo4j is down.
    match GraphClient::connect_from_env().await {
        Ok(client) => {
            let counts = client.get_counts().await?;
            println!("\n{}", "Neo4j".bold());
            println!("{}", "─".repeat(50));
            println!("  Nodes:         {}", counts.nodes.to_string().cyan());
            println!("  Relationships: {}", counts.relationships.to_string().cyan());
        }
        Err(_) => println!("\n{}", "Neo4j unreachable; skipping graph totals.".dimmed()),
    }

    Ok(())
}

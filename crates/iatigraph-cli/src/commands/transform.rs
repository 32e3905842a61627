//! `iatigraph transform` - recompute the derived tables.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use iatigraph_db::{migrations, DbPool};

pub fn execute(db_path: &Path) -> Result<()> {
    let pool = DbPool::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    migrations::run_migrations(&pool).context("Failed to run migrations")?;

    println!("{}", "Transforming raw tables...".bold());

    let summary = iatigraph_core::run_transform(&pool).context("Transformation failed")?;

    println!("\n{}", "Transform complete:".green().bold());
    println!("  Published activities:     {}", summary.published_activities);
    println!("  Published organisations:  {}", summary.published_organisations);
    println!("  Phantom organisations:    {}", summary.phantom_organisations);
    println!("  Phantom activity records: {}", summary.phantom_activities);
    println!("  Participation links:      {}", summary.participation_links);
    println!("  Financial links:          {}", summary.financial_links);
    println!("  Funds links:              {}", summary.funds_links);
    println!("  Hierarchy links:          {}", summary.hierarchy_links);
    println!(
        "  Participation summaries:  {}",
        summary.activity_participation_summary_links
    );

    Ok(())
}

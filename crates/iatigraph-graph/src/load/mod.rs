//! SQLite to Neo4j load pipeline.
//!
//! Every node table is loaded before any edge table so endpoint
//! matching never races node creation. Within each phase the order is
//! fixed, which keeps log output comparable between runs.

pub mod edges;
pub mod nodes;

use anyhow::{Context, Result};
use tracing::info;

use iatigraph_db::DbPool;

use crate::GraphClient;

/// Result of a load operation.
///
/// Counters reflect rows actually MERGEd into the graph; an edge row
/// whose endpoints were not found writes nothing and is not counted.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    pub nodes_written: usize,
    pub relationships_written: usize,
}

impl LoadResult {
    fn merge(&mut self, other: &LoadResult) {
        self.nodes_written += other.nodes_written;
        self.relationships_written += other.relationships_written;
    }
}

/// Load all node tables into the graph.
pub async fn load_all_nodes(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let mut total = LoadResult::default();

    let result = nodes::load_published_activities(client, db)
        .await
        .context("Failed to load published activities")?;
    info!(nodes = result.nodes_written, "Published activities loaded");
    total.merge(&result);

    let result = nodes::load_published_organisations(client, db)
        .await
        .context("Failed to load published organisations")?;
    info!(nodes = result.nodes_written, "Published organisations loaded");
    total.merge(&result);

    let result = nodes::load_phantom_activities(client, db)
        .await
        .context("Failed to load phantom activities")?;
    info!(nodes = result.nodes_written, "Phantom activities loaded");
    total.merge(&result);

    let result = nodes::load_phantom_organisations(client, db)
        .await
        .context("Failed to load phantom organisations")?;
    info!(nodes = result.nodes_written, "Phantom organisations loaded");
    total.merge(&result);

    Ok(total)
}

/// Load all edge tables into the graph. Assumes nodes are present.
pub async fn load_all_edges(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let mut total = LoadResult::default();

    let result = edges::load_participation_links(client, db)
        .await
        .context("Failed to load participation links")?;
    info!(rels = result.relationships_written, "Participation links loaded");
    total.merge(&result);

    let result = edges::load_financial_links(client, db)
        .await
        .context("Failed to load financial links")?;
    info!(rels = result.relationships_written, "Financial links loaded");
    total.merge(&result);

    let result = edges::load_funds_links(client, db)
        .await
        .context("Failed to load funds links")?;
    info!(rels = result.relationships_written, "Funds links loaded");
    total.merge(&result);

    let result = edges::load_hierarchy_links(client, db)
        .await
        .context("Failed to load hierarchy links")?;
    info!(rels = result.relationships_written, "Hierarchy links loaded");
    total.merge(&result);

    let result = edges::load_activity_participation_links(client, db)
        .await
        .context("Failed to load activity participation links")?;
    info!(rels = result.relationships_written, "Activity participation links loaded");
    total.merge(&result);

    let result = edges::load_publishes_links(client, db)
        .await
        .context("Failed to load publishes links")?;
    info!(rels = result.relationships_written, "Publishes links loaded");
    total.merge(&result);

    Ok(total)
}

/// Run the full load: nodes first, then edges.
pub async fn run_full_load(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    info!("Starting full graph load");

    let mut total = load_all_nodes(client, db).await?;
    let edge_total = load_all_edges(client, db).await?;
    total.merge(&edge_total);

    info!(
        nodes = total.nodes_written,
        relationships = total.relationships_written,
        "Full load complete"
    );

    Ok(total)
}

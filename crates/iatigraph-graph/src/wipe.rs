//! Batched graph wipe.
//!
//! Deleting millions of relationships in one transaction exhausts the
//! server heap, so relationships are removed in fixed-size batches
//! before the nodes are detached and deleted the same way.

use anyhow::Result;
use neo4rs::Query;
use tracing::info;

use crate::GraphClient;

const WIPE_BATCH_SIZE: usize = 10_000;

/// Delete everything in the graph, relationships first.
pub async fn wipe_graph(client: &GraphClient) -> Result<()> {
    info!(batch_size = WIPE_BATCH_SIZE, "Wiping graph");

    loop {
        let deleted = client
            .count(
                Query::new(format!(
                    "MATCH ()-[r]->() WITH r LIMIT {WIPE_BATCH_SIZE}
                     DELETE r RETURN count(r) as deleted"
                )),
                "deleted",
            )
            .await?;
        if deleted == 0 {
            break;
        }
        info!(deleted, "Deleted relationship batch");
    }

    loop {
        let deleted = client
            .count(
                Query::new(format!(
                    "MATCH (n) WITH n LIMIT {WIPE_BATCH_SIZE}
                     DETACH DELETE n RETURN count(n) as deleted"
                )),
                "deleted",
            )
            .await?;
        if deleted == 0 {
            break;
        }
        info!(deleted, "Deleted node batch");
    }

    info!("Graph wiped");
    Ok(())
}

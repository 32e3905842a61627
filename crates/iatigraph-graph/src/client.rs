//! Neo4j connection handling.

use anyhow::{Context, Result};
use neo4rs::{ConfigBuilder, Graph, Query};
use serde::Deserialize;

/// Connection settings for the target Neo4j instance.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "iati_dev_2026".to_string(),
        }
    }
}

impl GraphConfig {
    /// Read NEO4J_URI / NEO4J_USER / NEO4J_PASSWORD, keeping the local
    /// development defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            uri: std::env::var("NEO4J_URI").unwrap_or(defaults.uri),
            user: std::env::var("NEO4J_USER").unwrap_or(defaults.user),
            password: std::env::var("NEO4J_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// Handle on the bolt connection pool used by the loaders.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect and verify the server answers.
    ///
    /// The pool behind `Graph::connect` is lazy and never touches the
    /// network on its own, so a bad address or password would only
    /// surface once the first load statement runs. A `RETURN 1` ping
    /// forces the bolt handshake up front and fails fast instead.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let bolt_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db("neo4j")
            // Rows are written one statement at a time, a handful of
            // connections is plenty.
            .max_connections(4)
            .build()
            .context("Invalid Neo4j connection settings")?;

        let graph = Graph::connect(bolt_config)
            .await
            .context("Failed to set up Neo4j connection pool")?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .context("Neo4j did not answer the connection check")?;

        Ok(Self { graph })
    }

    /// Connect with settings taken from the environment.
    pub async fn connect_from_env() -> Result<Self> {
        Self::connect(&GraphConfig::from_env()).await
    }

    /// Run a statement, discarding any result rows.
    pub async fn execute(&self, query: Query) -> Result<()> {
        self.graph
            .run(query)
            .await
            .context("Neo4j statement failed")?;
        Ok(())
    }

    /// Run a statement projecting a single count column and return it.
    ///
    /// An empty result reads as zero, which is the natural answer for
    /// both the batched wipe and the MATCH-gated edge writes.
    pub async fn count(&self, query: Query, column: &str) -> Result<i64> {
        let mut stream = self
            .graph
            .execute(query)
            .await
            .context("Neo4j statement failed")?;

        match stream.next().await.context("Neo4j result stream failed")? {
            Some(row) => row
                .get::<i64>(column)
                .map_err(|e| anyhow::anyhow!("Count column '{}' missing from result: {:?}", column, e)),
            None => Ok(0),
        }
    }

    /// Node and relationship totals for status output.
    pub async fn get_counts(&self) -> Result<GraphCounts> {
        let nodes = self
            .count(
                Query::new("MATCH (n) RETURN count(n) as total".to_string()),
                "total",
            )
            .await?;
        let relationships = self
            .count(
                Query::new("MATCH ()-[r]->() RETURN count(r) as total".to_string()),
                "total",
            )
            .await?;

        Ok(GraphCounts {
            nodes: nodes as usize,
            relationships: relationships as usize,
        })
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

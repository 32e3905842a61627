//! Neo4j schema initialization (constraints and indexes).

use anyhow::Result;
use neo4rs::Query;
use tracing::info;

use crate::GraphClient;

/// Cypher statements for schema initialization.
const SCHEMA_STATEMENTS: &[&str] = &[
    // Uniqueness constraints
    "CREATE CONSTRAINT published_activity_id IF NOT EXISTS FOR (a:PublishedActivity) REQUIRE a.iatiidentifier IS UNIQUE",
    "CREATE CONSTRAINT published_organisation_id IF NOT EXISTS FOR (o:PublishedOrganisation) REQUIRE o.organisationidentifier IS UNIQUE",
    "CREATE CONSTRAINT phantom_activity_id IF NOT EXISTS FOR (a:PhantomActivity) REQUIRE a.phantom_activity_identifier IS UNIQUE",
    "CREATE CONSTRAINT phantom_organisation_id IF NOT EXISTS FOR (o:PhantomOrganisation) REQUIRE o.reference IS UNIQUE",
    // Lookup indexes for relationship endpoint matching
    "CREATE INDEX published_activity_reportingorg IF NOT EXISTS FOR (a:PublishedActivity) ON (a.reportingorg_ref)",
];

/// Initialize Neo4j schema with constraints and indexes.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema(client: &GraphClient) -> Result<()> {
    info!("Initializing Neo4j schema...");

    for statement in SCHEMA_STATEMENTS {
        client.execute(Query::new(statement.to_string())).await?;
    }

    info!("Neo4j schema initialized ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}

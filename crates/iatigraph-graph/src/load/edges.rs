//! Relationship loading.
//!
//! An edge endpoint id may resolve to either a published or a phantom
//! node, so endpoint matching is an OR over both labels with the
//! identifying property of each. Edges are MERGEd on their key so a
//! reload never duplicates relationships. Every statement projects a
//! written count back: a MERGE whose MATCH found no endpoints writes
//! nothing, and the totals must say so.

use anyhow::Result;
use neo4rs::Query;
use tracing::debug;

use iatigraph_db::queries::entities;
use iatigraph_db::queries::links::{self, NodeKind};
use iatigraph_db::DbPool;

use super::LoadResult;
use crate::GraphClient;

/// Cypher predicate matching node `var` against `$param` for a kind,
/// across both the published and phantom label for that kind.
fn endpoint_predicate(kind: NodeKind, var: &str, param: &str) -> String {
    match kind {
        NodeKind::Activity => format!(
            "(({var}:PublishedActivity AND {var}.iatiidentifier = ${param}) \
             OR ({var}:PhantomActivity AND {var}.phantom_activity_identifier = ${param}))"
        ),
        NodeKind::Organisation => format!(
            "(({var}:PublishedOrganisation AND {var}.organisationidentifier = ${param}) \
             OR ({var}:PhantomOrganisation AND {var}.reference = ${param}))"
        ),
    }
}

fn two_endpoint_match(source_kind: NodeKind, target_kind: NodeKind) -> String {
    format!(
        "MATCH (s), (t) WHERE {} AND {}",
        endpoint_predicate(source_kind, "s", "source"),
        endpoint_predicate(target_kind, "t", "target"),
    )
}

/// Append the projection that reports how many relationships the
/// statement actually touched. Zero when the endpoint MATCH found
/// nothing.
fn with_written_count(statement: String) -> String {
    format!("{statement}\n RETURN count(r) as written")
}

/// Load PARTICIPATES_IN edges, one per (org, activity, role).
pub async fn load_participation_links(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = links::list_participation_links(db)
        .map_err(|e| anyhow::anyhow!("Failed to list participation links: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        let query = Query::new(with_written_count(format!(
            "{}
             MERGE (s)-[r:PARTICIPATES_IN {{role_code: $role_code}}]->(t)
             SET r.role_name = $role_name",
            two_endpoint_match(NodeKind::Organisation, NodeKind::Activity),
        )))
        .param("source", row.organisation_id.as_str())
        .param("target", row.activity_id.as_str())
        .param("role_code", row.role_code.as_str())
        .param("role_name", row.role_name.as_deref().unwrap_or(""));

        result.relationships_written += client.count(query, "written").await? as usize;
    }

    debug!(count = rows.len(), "Loaded participation links");
    Ok(result)
}

/// Load FINANCIAL_TRANSACTION edges, keyed by transaction type.
pub async fn load_financial_links(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = links::list_financial_links(db)
        .map_err(|e| anyhow::anyhow!("Failed to list financial links: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        let query = Query::new(with_written_count(format!(
            "{}
             MERGE (s)-[r:FINANCIAL_TRANSACTION {{transactiontype_code: $code}}]->(t)
             SET r.transaction_type_name = $name,
                 r.currency = $currency,
                 r.total_value_usd = $total",
            two_endpoint_match(row.source_node_type, row.target_node_type),
        )))
        .param("source", row.source_node_id.as_str())
        .param("target", row.target_node_id.as_str())
        .param("code", row.transactiontype_code.as_str())
        .param("name", row.transaction_type_name.as_str())
        .param("currency", row.currency.as_str())
        .param("total", row.total_value_usd);

        result.relationships_written += client.count(query, "written").await? as usize;
    }

    debug!(count = rows.len(), "Loaded financial links");
    Ok(result)
}

/// Load FUNDS edges between activities.
pub async fn load_funds_links(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = links::list_funds_links(db)
        .map_err(|e| anyhow::anyhow!("Failed to list funds links: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        let query = Query::new(with_written_count(format!(
            "{}
             MERGE (s)-[r:FUNDS]->(t)
             SET r.currency = $currency,
                 r.total_value_usd = $total",
            two_endpoint_match(NodeKind::Activity, NodeKind::Activity),
        )))
        .param("source", row.source_node_id.as_str())
        .param("target", row.target_node_id.as_str())
        .param("currency", row.currency.as_str())
        .param("total", row.total_value_usd);

        result.relationships_written += client.count(query, "written").await? as usize;
    }

    debug!(count = rows.len(), "Loaded funds links");
    Ok(result)
}

/// Load PARENT_OF and SIBLING_OF edges with provenance arrays.
pub async fn load_hierarchy_links(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = links::list_hierarchy_links(db)
        .map_err(|e| anyhow::anyhow!("Failed to list hierarchy links: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        // Relationship types cannot be parameterised in Cypher.
        let rel_type = row.relationship_type.as_str();
        let query = Query::new(with_written_count(format!(
            "{}
             MERGE (s)-[r:{rel_type}]->(t)
             SET r.declared_by = $declared_by",
            two_endpoint_match(NodeKind::Activity, NodeKind::Activity),
        )))
        .param("source", row.source_node_id.as_str())
        .param("target", row.target_node_id.as_str())
        .param("declared_by", row.declared_by.clone());

        result.relationships_written += client.count(query, "written").await? as usize;
    }

    debug!(count = rows.len(), "Loaded hierarchy links");
    Ok(result)
}

/// Load ACTIVITY_PARTICIPATION summary edges with role unions.
pub async fn load_activity_participation_links(
    client: &GraphClient,
    db: &DbPool,
) -> Result<LoadResult> {
    let rows = links::list_activity_participation_summaries(db)
        .map_err(|e| anyhow::anyhow!("Failed to list participation summaries: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        let query = Query::new(with_written_count(format!(
            "{}
             MERGE (s)-[r:ACTIVITY_PARTICIPATION]->(t)
             SET r.role_codes = $role_codes,
                 r.role_names = $role_names",
            two_endpoint_match(NodeKind::Activity, NodeKind::Activity),
        )))
        .param("source", row.source_activity_id.as_str())
        .param("target", row.target_activity_id.as_str())
        .param("role_codes", row.role_codes.clone())
        .param("role_names", row.role_names.clone());

        result.relationships_written += client.count(query, "written").await? as usize;
    }

    debug!(count = rows.len(), "Loaded activity participation links");
    Ok(result)
}

/// Load PUBLISHES edges from each publisher to its activities.
///
/// Derived from the canonical activities' reporting-org reference
/// rather than a dedicated link table; activities whose publisher was
/// never described simply get no edge, and the written count reflects
/// that.
pub async fn load_publishes_links(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = entities::list_published_activities(db)
        .map_err(|e| anyhow::anyhow!("Failed to list published activities: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        let Some(publisher) = row.reportingorg_ref.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        let query = Query::new(with_written_count(
            "MATCH (o:PublishedOrganisation {organisationidentifier: $publisher}),
                   (a:PublishedActivity {iatiidentifier: $activity})
             MERGE (o)-[r:PUBLISHES]->(a)"
                .to_string(),
        ))
        .param("publisher", publisher)
        .param("activity", row.iatiidentifier.as_str());

        result.relationships_written += client.count(query, "written").await? as usize;
    }

    debug!("Loaded publishes links");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_predicate_covers_both_labels() {
        let p = endpoint_predicate(NodeKind::Activity, "s", "source");
        assert!(p.contains("s:PublishedActivity AND s.iatiidentifier = $source"));
        assert!(p.contains("s:PhantomActivity AND s.phantom_activity_identifier = $source"));
    }

    #[test]
    fn test_organisation_predicate_covers_both_labels() {
        let p = endpoint_predicate(NodeKind::Organisation, "t", "target");
        assert!(p.contains("t:PublishedOrganisation AND t.organisationidentifier = $target"));
        assert!(p.contains("t:PhantomOrganisation AND t.reference = $target"));
    }

    #[test]
    fn test_two_endpoint_match_binds_distinct_vars() {
        let m = two_endpoint_match(NodeKind::Organisation, NodeKind::Activity);
        assert!(m.starts_with("MATCH (s), (t) WHERE"));
        assert!(m.contains("$source"));
        assert!(m.contains("$target"));
    }

    #[test]
    fn test_edge_statements_project_written_count() {
        let s = with_written_count(format!(
            "{}
             MERGE (s)-[r:FUNDS]->(t)",
            two_endpoint_match(NodeKind::Activity, NodeKind::Activity),
        ));
        assert!(s.trim_end().ends_with("RETURN count(r) as written"));
    }
}

//! Node loading: one label per entity table.

use std::collections::BTreeMap;

use anyhow::Result;
use neo4rs::Query;
use tracing::debug;

use iatigraph_db::queries::entities;
use iatigraph_db::DbPool;

use super::LoadResult;
use crate::GraphClient;

/// MERGE updates nodes in place, so an absent hierarchy must clear any
/// previously stored level rather than defaulting to zero.
fn hierarchy_clause(var: &str, hierarchy: Option<i64>) -> String {
    match hierarchy {
        Some(_) => format!("SET {var}.hierarchy = $hierarchy"),
        None => format!("REMOVE {var}.hierarchy"),
    }
}

/// Load canonical activities as (:PublishedActivity) nodes.
pub async fn load_published_activities(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = entities::list_published_activities(db)
        .map_err(|e| anyhow::anyhow!("Failed to list published activities: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        let mut query = Query::new(format!(
            "MERGE (a:PublishedActivity {{iatiidentifier: $iatiidentifier}})
             SET a.title = $title,
                 a.reportingorg_ref = $reportingorg_ref,
                 a.reportingorg_narrative = $reportingorg_narrative,
                 a.reportingorg_type = $reportingorg_type,
                 a.activitystatus_code = $activitystatus_code,
                 a.plannedstart = $plannedstart,
                 a.plannedend = $plannedend,
                 a.actualstart = $actualstart,
                 a.actualend = $actualend,
                 a.lastupdateddatetime = $lastupdateddatetime,
                 a.dportal_link = $dportal_link
             {}",
            hierarchy_clause("a", row.hierarchy),
        ))
        .param("iatiidentifier", row.iatiidentifier.as_str())
        .param("title", row.title_narrative.as_deref().unwrap_or(""))
        .param("reportingorg_ref", row.reportingorg_ref.as_deref().unwrap_or(""))
        .param(
            "reportingorg_narrative",
            row.reportingorg_narrative.as_deref().unwrap_or(""),
        )
        .param("reportingorg_type", row.reportingorg_type.as_deref().unwrap_or(""))
        .param(
            "activitystatus_code",
            row.activitystatus_code.as_deref().unwrap_or(""),
        )
        .param("plannedstart", row.plannedstart.as_deref().unwrap_or(""))
        .param("plannedend", row.plannedend.as_deref().unwrap_or(""))
        .param("actualstart", row.actualstart.as_deref().unwrap_or(""))
        .param("actualend", row.actualend.as_deref().unwrap_or(""))
        .param(
            "lastupdateddatetime",
            row.lastupdateddatetime.as_deref().unwrap_or(""),
        )
        .param("dportal_link", row.dportal_link.as_str());
        if let Some(hierarchy) = row.hierarchy {
            query = query.param("hierarchy", hierarchy);
        }

        client.execute(query).await?;
        result.nodes_written += 1;
    }

    debug!(count = rows.len(), "Loaded published activities");
    Ok(result)
}

/// Load canonical organisations as (:PublishedOrganisation) nodes.
pub async fn load_published_organisations(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = entities::list_published_organisations(db)
        .map_err(|e| anyhow::anyhow!("Failed to list published organisations: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        let mut query = Query::new(format!(
            "MERGE (o:PublishedOrganisation {{organisationidentifier: $organisationidentifier}})
             SET o.name = $name,
                 o.reportingorg_ref = $reportingorg_ref,
                 o.dportal_link = $dportal_link
             {}",
            hierarchy_clause("o", row.hierarchy),
        ))
        .param("organisationidentifier", row.organisationidentifier.as_str())
        .param("name", row.name_narrative.as_deref().unwrap_or(""))
        .param("reportingorg_ref", row.reportingorg_ref.as_deref().unwrap_or(""))
        .param("dportal_link", row.dportal_link.as_str());
        if let Some(hierarchy) = row.hierarchy {
            query = query.param("hierarchy", hierarchy);
        }

        client.execute(query).await?;
        result.nodes_written += 1;
    }

    debug!(count = rows.len(), "Loaded published organisations");
    Ok(result)
}

/// Load phantom organisations as (:PhantomOrganisation) nodes.
pub async fn load_phantom_organisations(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = entities::list_phantom_organisations(db)
        .map_err(|e| anyhow::anyhow!("Failed to list phantom organisations: {}", e))?;

    let mut result = LoadResult::default();

    for row in &rows {
        let query = Query::new(
            "MERGE (o:PhantomOrganisation {reference: $reference})
             SET o.distinct_narratives = $distinct_narratives,
                 o.phantom_in_participatingorg = $phantom_in_participatingorg,
                 o.phantom_in_transaction_provider = $phantom_in_transaction_provider,
                 o.phantom_in_transaction_receiver = $phantom_in_transaction_receiver,
                 o.phantom_in_orgbudget_recipient = $phantom_in_orgbudget_recipient"
                .to_string(),
        )
        .param("reference", row.reference.as_str())
        .param("distinct_narratives", row.distinct_narratives.clone())
        .param("phantom_in_participatingorg", row.phantom_in_participatingorg)
        .param(
            "phantom_in_transaction_provider",
            row.phantom_in_transaction_provider,
        )
        .param(
            "phantom_in_transaction_receiver",
            row.phantom_in_transaction_receiver,
        )
        .param(
            "phantom_in_orgbudget_recipient",
            row.phantom_in_orgbudget_recipient,
        );

        client.execute(query).await?;
        result.nodes_written += 1;
    }

    debug!(count = rows.len(), "Loaded phantom organisations");
    Ok(result)
}

/// Load phantom activities as (:PhantomActivity) nodes.
///
/// The audit table keeps one row per (identifier, source column,
/// declaring activity) triple; the graph gets one node per identifier
/// with both provenance dimensions folded into array properties.
pub async fn load_phantom_activities(client: &GraphClient, db: &DbPool) -> Result<LoadResult> {
    let rows = entities::list_phantom_activities(db)
        .map_err(|e| anyhow::anyhow!("Failed to list phantom activities: {}", e))?;

    let mut grouped: BTreeMap<&str, (Vec<&str>, Vec<&str>)> = BTreeMap::new();
    for row in &rows {
        let (columns, sources) = grouped
            .entry(row.phantom_activity_identifier.as_str())
            .or_default();
        if !columns.contains(&row.source_column.as_str()) {
            columns.push(row.source_column.as_str());
        }
        if !sources.contains(&row.source_activity_id.as_str()) {
            sources.push(row.source_activity_id.as_str());
        }
    }

    let mut result = LoadResult::default();

    for (identifier, (columns, sources)) in &grouped {
        let query = Query::new(
            "MERGE (a:PhantomActivity {phantom_activity_identifier: $identifier})
             SET a.source_columns = $source_columns,
                 a.source_activity_ids = $source_activity_ids,
                 a.dportal_link = $dportal_link"
                .to_string(),
        )
        .param("identifier", *identifier)
        .param(
            "source_columns",
            columns.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
        )
        .param(
            "source_activity_ids",
            sources.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )
        .param(
            "dportal_link",
            format!("http://d-portal.org/q.html?aid={identifier}"),
        );

        client.execute(query).await?;
        result.nodes_written += 1;
    }

    debug!(
        triples = rows.len(),
        nodes = grouped.len(),
        "Loaded phantom activities"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_set_when_present() {
        assert_eq!(hierarchy_clause("a", Some(2)), "SET a.hierarchy = $hierarchy");
    }

    #[test]
    fn test_hierarchy_removed_when_absent() {
        assert_eq!(hierarchy_clause("o", None), "REMOVE o.hierarchy");
    }
}

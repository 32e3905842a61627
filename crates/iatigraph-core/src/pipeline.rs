//! Full transformation run over the raw tables.
//!
//! Stages are ordered so entity resolution feeds phantom discovery and
//! financial aggregation feeds funds derivation. Each derived table is
//! replaced wholesale inside its own transaction; a failed stage leaves
//! earlier stages committed and later tables untouched.

use chrono::Utc;
use tracing::info;

use iatigraph_db::queries::{entities, links, meta, source};
use iatigraph_db::DbPool;

use crate::error::IatiGraphResult;
use crate::{canonical, financial, hierarchy, participation, phantom};

/// Row counts per derived table for one completed run.
#[derive(Debug, Clone, Default)]
pub struct TransformSummary {
    pub run_at: String,
    pub published_activities: usize,
    pub published_organisations: usize,
    pub phantom_organisations: usize,
    pub phantom_activities: usize,
    pub participation_links: usize,
    pub financial_links: usize,
    pub funds_links: usize,
    pub hierarchy_links: usize,
    pub activity_participation_summary_links: usize,
}

/// Recompute every derived table from the raw source tables.
pub fn run_transform(pool: &DbPool) -> IatiGraphResult<TransformSummary> {
    let run_at = Utc::now().to_rfc3339();

    let activities = source::list_activities(pool)?;
    let organisations = source::list_organisations(pool)?;
    let participating = source::list_participating_orgs(pool)?;
    let transactions = source::list_transactions(pool)?;
    let other_identifiers = source::list_other_identifiers(pool)?;
    let budgets = source::list_recipient_org_budgets(pool)?;
    let related = source::list_related_activities(pool)?;
    let disbursements = source::list_planned_disbursements(pool)?;
    info!(
        activities = activities.len(),
        organisations = organisations.len(),
        participating = participating.len(),
        transactions = transactions.len(),
        "raw tables loaded"
    );

    let published_activities = canonical::canonicalize_activities(&activities);
    entities::replace_published_activities(pool, &published_activities)?;
    meta::record_run(pool, &run_at, "published_activities", published_activities.len())?;
    info!(rows = published_activities.len(), "published activities resolved");

    let published_organisations = canonical::canonicalize_organisations(&organisations);
    entities::replace_published_organisations(pool, &published_organisations)?;
    meta::record_run(
        pool,
        &run_at,
        "published_organisations",
        published_organisations.len(),
    )?;
    info!(rows = published_organisations.len(), "published organisations resolved");

    let phantom_orgs = phantom::discover_phantom_organisations(
        &participating,
        &transactions,
        &budgets,
        &published_organisations,
        &other_identifiers,
    );
    entities::replace_phantom_organisations(pool, &phantom_orgs)?;
    meta::record_run(pool, &run_at, "phantom_organisations", phantom_orgs.len())?;
    info!(rows = phantom_orgs.len(), "phantom organisations discovered");

    let phantom_acts = phantom::discover_phantom_activities(
        &participating,
        &transactions,
        &related,
        &disbursements,
        &published_activities,
    );
    entities::replace_phantom_activities(pool, &phantom_acts)?;
    meta::record_run(pool, &run_at, "phantom_activities", phantom_acts.len())?;
    info!(rows = phantom_acts.len(), "phantom activities discovered");

    let participation_links = participation::build_participation_links(&participating);
    links::replace_participation_links(pool, &participation_links)?;
    meta::record_run(pool, &run_at, "participation_links", participation_links.len())?;

    let financial_links = financial::aggregate_financial_links(&transactions);
    links::replace_financial_links(pool, &financial_links)?;
    meta::record_run(pool, &run_at, "financial_links", financial_links.len())?;

    let funds_links = financial::aggregate_funds_links(&financial_links);
    links::replace_funds_links(pool, &funds_links)?;
    meta::record_run(pool, &run_at, "funds_links", funds_links.len())?;

    let hierarchy_links = hierarchy::compress_hierarchy(&related);
    links::replace_hierarchy_links(pool, &hierarchy_links)?;
    meta::record_run(pool, &run_at, "hierarchy_links", hierarchy_links.len())?;

    let summaries = participation::summarize_activity_participation(&participating);
    links::replace_activity_participation_summaries(pool, &summaries)?;
    meta::record_run(
        pool,
        &run_at,
        "activity_participation_summary_links",
        summaries.len(),
    )?;
    info!(
        participation = participation_links.len(),
        financial = financial_links.len(),
        funds = funds_links.len(),
        hierarchy = hierarchy_links.len(),
        summaries = summaries.len(),
        "edge tables rebuilt"
    );

    Ok(TransformSummary {
        run_at,
        published_activities: published_activities.len(),
        published_organisations: published_organisations.len(),
        phantom_organisations: phantom_orgs.len(),
        phantom_activities: phantom_acts.len(),
        participation_links: participation_links.len(),
        financial_links: financial_links.len(),
        funds_links: funds_links.len(),
        hierarchy_links: hierarchy_links.len(),
        activity_participation_summary_links: summaries.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use iatigraph_db::migrations::run_migrations;
    use iatigraph_db::queries::links::{HierarchyKind, NodeKind};

    fn fixture_pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        pool.with_conn(|conn| {
            conn.execute_batch(
                r#"
                INSERT INTO activity (iatiidentifier, title_narrative, reportingorg_ref,
                                      lastupdateddatetime, dataset)
                VALUES
                  ('XM-1-ACT1', 'Old title', 'XM-1', '2023-01-01T00:00:00Z', 'set-a'),
                  ('XM-1-ACT1', 'New title', 'XM-1', '2024-06-01T00:00:00Z', 'set-b'),
                  ('XM-1-ACT2', 'Second activity', 'XM-1', '2024-01-01T00:00:00Z', 'set-a');

                INSERT INTO organisation (organisationidentifier, name_narrative,
                                          lastupdateddatetime, dataset)
                VALUES ('XM-1', 'Publisher One', '2024-01-01T00:00:00Z', 'set-a');

                INSERT INTO participatingorg (iatiidentifier, ref, narrative, role_code,
                                              role_name, activityid)
                VALUES
                  ('XM-1-ACT1', 'XM-1', 'Publisher One', '1', 'Funding', NULL),
                  ('XM-1-ACT1', 'GHOST-ORG', 'Ghost Org', '4', 'Implementing', NULL),
                  ('XM-1-ACT2', 'XM-1', 'Publisher One', '1', 'Funding', 'XM-1-ACT1');

                INSERT INTO "transaction" (iatiidentifier, transactiontype_code, value_usd,
                                           providerorg_ref, providerorg_provider_activity_id,
                                           receiverorg_ref)
                VALUES
                  ('XM-1-ACT1', '2', 100.0, 'XM-1', NULL, NULL),
                  ('XM-1-ACT1', '2', 50.0, 'XM-1', NULL, NULL),
                  ('XM-1-ACT2', '3', 30.0, NULL, 'XM-1-ACT1', NULL),
                  ('XM-1-ACT1', '3', 20.0, NULL, NULL, 'GHOST-ORG');

                INSERT INTO relatedactivity (iatiidentifier, ref, type)
                VALUES
                  ('XM-1-ACT2', 'XM-1-ACT1', 1),
                  ('XM-1-ACT2', 'GHOST-ACT', 3);
                "#,
            )?;
            Ok(())
        })
        .unwrap();
        pool
    }

    #[test]
    fn test_full_run_populates_every_table() {
        let pool = fixture_pool();
        let summary = run_transform(&pool).unwrap();

        assert_eq!(summary.published_activities, 2);
        assert_eq!(summary.published_organisations, 1);
        assert_eq!(summary.phantom_organisations, 1);
        assert_eq!(summary.phantom_activities, 1);
        assert_eq!(summary.participation_links, 3);
        assert_eq!(summary.financial_links, 3);
        assert_eq!(summary.funds_links, 1);
        assert_eq!(summary.hierarchy_links, 2);
        assert_eq!(summary.activity_participation_summary_links, 1);

        // Duplicate submissions collapse to the latest version.
        let acts = entities::list_published_activities(&pool).unwrap();
        assert_eq!(acts[0].title_narrative.as_deref(), Some("New title"));

        let ghosts = entities::list_phantom_organisations(&pool).unwrap();
        assert_eq!(ghosts[0].reference, "GHOST-ORG");
        assert!(ghosts[0].phantom_in_participatingorg);
        assert!(ghosts[0].phantom_in_transaction_receiver);
        assert!(!ghosts[0].phantom_in_transaction_provider);

        let fin = links::list_financial_links(&pool).unwrap();
        let org_edge = fin
            .iter()
            .find(|e| e.source_node_type == NodeKind::Organisation)
            .unwrap();
        assert_eq!(org_edge.total_value_usd, 150.0);

        let hier = links::list_hierarchy_links(&pool).unwrap();
        assert!(hier.iter().any(|e| {
            e.relationship_type == HierarchyKind::ParentOf
                && e.source_node_id == "XM-1-ACT1"
                && e.target_node_id == "XM-1-ACT2"
        }));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let pool = fixture_pool();
        run_transform(&pool).unwrap();
        let first = links::list_financial_links(&pool).unwrap();
        let summary = run_transform(&pool).unwrap();
        let second = links::list_financial_links(&pool).unwrap();

        assert_eq!(first, second);
        assert_eq!(summary.published_activities, 2);
        // Both runs are tracked.
        assert_eq!(meta::last_run_time(&pool).unwrap(), Some(summary.run_at));
    }

    #[test]
    fn test_empty_database_yields_empty_tables() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        let summary = run_transform(&pool).unwrap();
        assert_eq!(summary.published_activities, 0);
        assert_eq!(summary.funds_links, 0);
        assert!(links::list_participation_links(&pool).unwrap().is_empty());
    }
}

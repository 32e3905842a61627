//! Canonicalization of duplicate raw submissions.
//!
//! Raw activity and organisation tables contain one row per submission,
//! so a resubmitted record appears many times under the same business
//! identifier. Exactly one row survives per identifier, chosen by a
//! total order: latest `lastupdateddatetime` (nulls least), then
//! lexicographically greatest dataset tag, then greatest rowid.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use iatigraph_db::queries::entities::{PublishedActivityRow, PublishedOrganisationRow};
use iatigraph_db::queries::source::{ActivityRow, OrganisationRow};

use crate::codelist;
use crate::non_empty;

/// Ranking key for competing submissions of the same identifier.
/// `Option<&str>` ordering puts `None` first, which is exactly the
/// "null timestamps are least preferred" rule; ISO-8601 timestamps
/// compare correctly as strings.
fn submission_rank<'a>(
    lastupdated: &'a Option<String>,
    dataset: &'a Option<String>,
    row_id: i64,
) -> (Option<&'a str>, Option<&'a str>, i64) {
    (lastupdated.as_deref(), dataset.as_deref(), row_id)
}

/// Collapse raw activity submissions to one canonical row per
/// identifier. Rows with a null or empty identifier are excluded
/// before ranking.
pub fn canonicalize_activities(rows: &[ActivityRow]) -> Vec<PublishedActivityRow> {
    let mut best: BTreeMap<&str, &ActivityRow> = BTreeMap::new();
    for row in rows {
        let Some(id) = non_empty(&row.iatiidentifier) else {
            continue;
        };
        match best.entry(id) {
            Entry::Vacant(e) => {
                e.insert(row);
            }
            Entry::Occupied(mut e) => {
                let incumbent = *e.get();
                if submission_rank(&row.lastupdateddatetime, &row.dataset, row.row_id)
                    > submission_rank(
                        &incumbent.lastupdateddatetime,
                        &incumbent.dataset,
                        incumbent.row_id,
                    )
                {
                    e.insert(row);
                }
            }
        }
    }

    best.into_iter()
        .map(|(id, row)| PublishedActivityRow {
            iatiidentifier: id.to_string(),
            title_narrative: row.title_narrative.clone(),
            reportingorg_ref: row.reportingorg_ref.clone(),
            reportingorg_narrative: row.reportingorg_narrative.clone(),
            reportingorg_type: row.reportingorg_type.clone(),
            activitystatus_code: row.activitystatus_code.clone(),
            plannedstart: row.plannedstart.clone(),
            plannedend: row.plannedend.clone(),
            actualstart: row.actualstart.clone(),
            actualend: row.actualend.clone(),
            lastupdateddatetime: row.lastupdateddatetime.clone(),
            hierarchy: row.hierarchy,
            dportal_link: codelist::activity_dportal_link(id),
        })
        .collect()
}

/// Collapse raw organisation submissions to one canonical row per
/// identifier, with the same total order as activities.
pub fn canonicalize_organisations(rows: &[OrganisationRow]) -> Vec<PublishedOrganisationRow> {
    let mut best: BTreeMap<&str, &OrganisationRow> = BTreeMap::new();
    for row in rows {
        let Some(id) = non_empty(&row.organisationidentifier) else {
            continue;
        };
        match best.entry(id) {
            Entry::Vacant(e) => {
                e.insert(row);
            }
            Entry::Occupied(mut e) => {
                let incumbent = *e.get();
                if submission_rank(&row.lastupdateddatetime, &row.dataset, row.row_id)
                    > submission_rank(
                        &incumbent.lastupdateddatetime,
                        &incumbent.dataset,
                        incumbent.row_id,
                    )
                {
                    e.insert(row);
                }
            }
        }
    }

    best.into_iter()
        .map(|(id, row)| PublishedOrganisationRow {
            organisationidentifier: id.to_string(),
            name_narrative: row.name_narrative.clone(),
            hierarchy: row.hierarchy,
            reportingorg_ref: row.reportingorg_ref.clone(),
            dportal_link: codelist::organisation_dportal_link(id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_activity(
        row_id: i64,
        id: Option<&str>,
        ts: Option<&str>,
        dataset: Option<&str>,
        title: &str,
    ) -> ActivityRow {
        ActivityRow {
            row_id,
            iatiidentifier: id.map(String::from),
            title_narrative: Some(title.to_string()),
            reportingorg_ref: None,
            reportingorg_narrative: None,
            reportingorg_type: None,
            activitystatus_code: None,
            plannedstart: None,
            plannedend: None,
            actualstart: None,
            actualend: None,
            lastupdateddatetime: ts.map(String::from),
            hierarchy: None,
            dataset: dataset.map(String::from),
        }
    }

    #[test]
    fn test_latest_timestamp_wins() {
        let rows = vec![
            raw_activity(1, Some("A1"), Some("2023-01-01"), Some("ds-a"), "Old"),
            raw_activity(2, Some("A1"), Some("2023-06-01"), Some("ds-a"), "New"),
        ];
        let out = canonicalize_activities(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].iatiidentifier, "A1");
        assert_eq!(out[0].title_narrative.as_deref(), Some("New"));
    }

    #[test]
    fn test_null_timestamp_is_least_preferred() {
        let rows = vec![
            raw_activity(1, Some("A1"), None, Some("zz-late"), "Untimestamped"),
            raw_activity(2, Some("A1"), Some("2020-01-01"), Some("aa-early"), "Timestamped"),
        ];
        let out = canonicalize_activities(&rows);
        assert_eq!(out[0].title_narrative.as_deref(), Some("Timestamped"));
    }

    #[test]
    fn test_dataset_breaks_timestamp_ties() {
        let rows = vec![
            raw_activity(1, Some("A1"), None, Some("dataset-b"), "B"),
            raw_activity(2, Some("A1"), None, Some("dataset-a"), "A"),
        ];
        let out = canonicalize_activities(&rows);
        assert_eq!(out[0].title_narrative.as_deref(), Some("B"));
    }

    #[test]
    fn test_rowid_breaks_full_ties() {
        let rows = vec![
            raw_activity(7, Some("A1"), Some("2023-01-01"), Some("ds"), "First"),
            raw_activity(9, Some("A1"), Some("2023-01-01"), Some("ds"), "Second"),
        ];
        let out = canonicalize_activities(&rows);
        assert_eq!(out[0].title_narrative.as_deref(), Some("Second"));
    }

    #[test]
    fn test_null_and_empty_identifiers_excluded() {
        let rows = vec![
            raw_activity(1, None, Some("2023-01-01"), None, "No id"),
            raw_activity(2, Some(""), Some("2023-01-01"), None, "Empty id"),
            raw_activity(3, Some("A1"), Some("2023-01-01"), None, "Real"),
        ];
        let out = canonicalize_activities(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].iatiidentifier, "A1");
    }

    #[test]
    fn test_output_sorted_by_identifier() {
        let rows = vec![
            raw_activity(1, Some("B2"), None, None, "b"),
            raw_activity(2, Some("A1"), None, None, "a"),
        ];
        let out = canonicalize_activities(&rows);
        assert_eq!(out[0].iatiidentifier, "A1");
        assert_eq!(out[1].iatiidentifier, "B2");
    }

    #[test]
    fn test_activity_dportal_link_templated() {
        let rows = vec![raw_activity(1, Some("GB-1-A1"), None, None, "t")];
        let out = canonicalize_activities(&rows);
        assert_eq!(out[0].dportal_link, "http://d-portal.org/q.html?aid=GB-1-A1");
    }

    #[test]
    fn test_organisation_canonicalization() {
        let rows = vec![
            OrganisationRow {
                row_id: 1,
                organisationidentifier: Some("GB-1".to_string()),
                name_narrative: Some("Old name".to_string()),
                hierarchy: Some(1),
                reportingorg_ref: Some("GB-1".to_string()),
                lastupdateddatetime: Some("2022-01-01".to_string()),
                dataset: Some("ds".to_string()),
            },
            OrganisationRow {
                row_id: 2,
                organisationidentifier: Some("GB-1".to_string()),
                name_narrative: Some("New name".to_string()),
                hierarchy: Some(1),
                reportingorg_ref: Some("GB-1".to_string()),
                lastupdateddatetime: Some("2024-01-01".to_string()),
                dataset: Some("ds".to_string()),
            },
        ];
        let out = canonicalize_organisations(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name_narrative.as_deref(), Some("New name"));
        assert!(out[0].dportal_link.contains("publisher=GB-1"));
    }
}

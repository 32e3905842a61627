//! Participation edges between organisations and activities.

use std::collections::{BTreeMap, BTreeSet};

use iatigraph_db::queries::links::{ActivityParticipationSummaryRow, ParticipationLinkRow};
use iatigraph_db::queries::source::ParticipatingOrgRow;

use crate::non_empty;

/// Build one PARTICIPATES_IN edge per (org, activity, role) triple.
///
/// An organisation may hold several roles on the same activity and each
/// role yields its own edge. Declarations without a role code, an org
/// reference or a declaring activity are skipped. When duplicate
/// declarations disagree on the role name, the first name seen fills an
/// otherwise empty slot.
pub fn build_participation_links(declarations: &[ParticipatingOrgRow]) -> Vec<ParticipationLinkRow> {
    let mut links: BTreeMap<(String, String, String), Option<String>> = BTreeMap::new();

    for decl in declarations {
        let (Some(org), Some(activity), Some(role)) = (
            non_empty(&decl.org_ref),
            non_empty(&decl.iatiidentifier),
            non_empty(&decl.role_code),
        ) else {
            continue;
        };
        let name = links
            .entry((org.to_string(), activity.to_string(), role.to_string()))
            .or_insert(None);
        if name.is_none() {
            *name = non_empty(&decl.role_name).map(String::from);
        }
    }

    links
        .into_iter()
        .map(|((org, activity, role), role_name)| ParticipationLinkRow {
            organisation_id: org,
            activity_id: activity,
            role_code: role,
            role_name,
        })
        .collect()
}

/// Summarise activity-to-activity participation.
///
/// When a participating-org declaration names the participant's own
/// activity, the participant activity is linked to the declaring one,
/// with the union of role codes and names across every declaration for
/// that pair. Self-references are dropped.
pub fn summarize_activity_participation(
    declarations: &[ParticipatingOrgRow],
) -> Vec<ActivityParticipationSummaryRow> {
    let mut pairs: BTreeMap<(String, String), (BTreeSet<String>, BTreeSet<String>)> =
        BTreeMap::new();

    for decl in declarations {
        let (Some(participant), Some(declarer)) =
            (non_empty(&decl.activityid), non_empty(&decl.iatiidentifier))
        else {
            continue;
        };
        if participant == declarer {
            continue;
        }
        let (codes, names) = pairs
            .entry((participant.to_string(), declarer.to_string()))
            .or_default();
        if let Some(code) = non_empty(&decl.role_code) {
            codes.insert(code.to_string());
        }
        if let Some(name) = non_empty(&decl.role_name) {
            names.insert(name.to_string());
        }
    }

    pairs
        .into_iter()
        .map(|((source, target), (codes, names))| ActivityParticipationSummaryRow {
            source_activity_id: source,
            target_activity_id: target,
            role_codes: codes.into_iter().collect(),
            role_names: names.into_iter().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(
        activity: Option<&str>,
        org: Option<&str>,
        role_code: Option<&str>,
        role_name: Option<&str>,
        activityid: Option<&str>,
    ) -> ParticipatingOrgRow {
        ParticipatingOrgRow {
            iatiidentifier: activity.map(String::from),
            org_ref: org.map(String::from),
            narrative: None,
            role_code: role_code.map(String::from),
            role_name: role_name.map(String::from),
            activityid: activityid.map(String::from),
        }
    }

    #[test]
    fn test_one_edge_per_role() {
        let decls = vec![
            decl(Some("ACT1"), Some("ORG1"), Some("1"), Some("Funding"), None),
            decl(Some("ACT1"), Some("ORG1"), Some("4"), Some("Implementing"), None),
            decl(Some("ACT1"), Some("ORG1"), Some("1"), Some("Funding"), None),
        ];
        let links = build_participation_links(&decls);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].role_code, "1");
        assert_eq!(links[1].role_code, "4");
    }

    #[test]
    fn test_incomplete_declarations_skipped() {
        let decls = vec![
            decl(Some("ACT1"), Some("ORG1"), None, None, None),
            decl(Some("ACT1"), None, Some("1"), None, None),
            decl(None, Some("ORG1"), Some("1"), None, None),
            decl(Some("ACT1"), Some(""), Some("1"), None, None),
        ];
        assert!(build_participation_links(&decls).is_empty());
    }

    #[test]
    fn test_first_role_name_fills_empty_slot() {
        let decls = vec![
            decl(Some("ACT1"), Some("ORG1"), Some("1"), None, None),
            decl(Some("ACT1"), Some("ORG1"), Some("1"), Some("Funding"), None),
        ];
        let links = build_participation_links(&decls);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].role_name.as_deref(), Some("Funding"));
    }

    #[test]
    fn test_summary_unions_roles_per_pair() {
        let decls = vec![
            decl(Some("ACT1"), Some("ORG1"), Some("1"), Some("Funding"), Some("ACT9")),
            decl(Some("ACT1"), Some("ORG2"), Some("4"), Some("Implementing"), Some("ACT9")),
            decl(Some("ACT2"), Some("ORG1"), Some("1"), Some("Funding"), Some("ACT9")),
        ];
        let summaries = summarize_activity_participation(&decls);
        assert_eq!(summaries.len(), 2);
        let first = &summaries[0];
        assert_eq!(first.source_activity_id, "ACT9");
        assert_eq!(first.target_activity_id, "ACT1");
        assert_eq!(first.role_codes, vec!["1", "4"]);
        assert_eq!(first.role_names, vec!["Funding", "Implementing"]);
        assert_eq!(summaries[1].target_activity_id, "ACT2");
    }

    #[test]
    fn test_summary_skips_self_reference_and_missing_activityid() {
        let decls = vec![
            decl(Some("ACT1"), Some("ORG1"), Some("1"), None, Some("ACT1")),
            decl(Some("ACT1"), Some("ORG1"), Some("1"), None, None),
        ];
        assert!(summarize_activity_participation(&decls).is_empty());
    }
}

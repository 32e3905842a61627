//! Financial edge aggregation.
//!
//! Raw transactions are reduced to one summary edge per (source,
//! target, transaction type) key across three directions, then further
//! collapsed into coarse activity-to-activity FUNDS edges.

use std::collections::BTreeMap;

use iatigraph_db::queries::links::{FinancialLinkRow, FundsLinkRow, NodeKind};
use iatigraph_db::queries::source::TransactionRow;

use crate::codelist::{self, CURRENCY_USD, FUND_TRANSACTION_TYPES};
use crate::non_empty;

type EdgeKey = (NodeKind, String, NodeKind, String, String);

/// Aggregate raw transactions into directed financial summary edges.
///
/// Three directions are aggregated independently and unioned:
/// provider org → owning activity, owning activity → receiver org, and
/// provider activity → owning activity. The last direction only counts
/// when no provider organisation is named on the record, so a
/// transaction naming both never contributes twice. Records missing an
/// endpoint, a type code or a value are excluded before grouping.
pub fn aggregate_financial_links(transactions: &[TransactionRow]) -> Vec<FinancialLinkRow> {
    let mut totals: BTreeMap<EdgeKey, f64> = BTreeMap::new();

    for t in transactions {
        let Some(code) = non_empty(&t.transactiontype_code) else {
            continue;
        };
        let Some(value) = t.value_usd else {
            continue;
        };
        let activity = non_empty(&t.iatiidentifier);
        let provider_org = non_empty(&t.providerorg_ref);

        // Provider organisation -> owning activity
        if let (Some(provider), Some(act)) = (provider_org, activity) {
            *totals
                .entry((
                    NodeKind::Organisation,
                    provider.to_string(),
                    NodeKind::Activity,
                    act.to_string(),
                    code.to_string(),
                ))
                .or_default() += value;
        }

        // Owning activity -> receiver organisation
        if let (Some(act), Some(receiver)) = (activity, non_empty(&t.receiverorg_ref)) {
            *totals
                .entry((
                    NodeKind::Activity,
                    act.to_string(),
                    NodeKind::Organisation,
                    receiver.to_string(),
                    code.to_string(),
                ))
                .or_default() += value;
        }

        // Provider activity -> owning activity, org-less records only
        if provider_org.is_none() {
            if let (Some(provider_act), Some(act)) =
                (non_empty(&t.providerorg_provider_activity_id), activity)
            {
                *totals
                    .entry((
                        NodeKind::Activity,
                        provider_act.to_string(),
                        NodeKind::Activity,
                        act.to_string(),
                        code.to_string(),
                    ))
                    .or_default() += value;
            }
        }
    }

    totals
        .into_iter()
        .map(|((source_kind, source, target_kind, target, code), total)| {
            let name = codelist::transaction_type_name(&code)
                .map(String::from)
                .unwrap_or_else(|| code.clone());
            FinancialLinkRow {
                source_node_id: source,
                target_node_id: target,
                source_node_type: source_kind,
                target_node_type: target_kind,
                transactiontype_code: code,
                transaction_type_name: name,
                currency: CURRENCY_USD.to_string(),
                total_value_usd: total,
            }
        })
        .collect()
}

/// Collapse financial links into one FUNDS edge per activity pair.
///
/// Restricted to activity→activity edges whose transaction type is a
/// genuine fund movement; type granularity is dropped and pairs whose
/// qualifying transactions sum to zero or less are omitted.
pub fn aggregate_funds_links(links: &[FinancialLinkRow]) -> Vec<FundsLinkRow> {
    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();

    for link in links {
        if link.source_node_type != NodeKind::Activity
            || link.target_node_type != NodeKind::Activity
        {
            continue;
        }
        if !FUND_TRANSACTION_TYPES.contains(&link.transactiontype_code.as_str()) {
            continue;
        }
        *totals
            .entry((link.source_node_id.clone(), link.target_node_id.clone()))
            .or_default() += link.total_value_usd;
    }

    totals
        .into_iter()
        .filter(|(_, total)| *total > 0.0)
        .map(|((source, target), total)| FundsLinkRow {
            source_node_id: source,
            target_node_id: target,
            currency: CURRENCY_USD.to_string(),
            total_value_usd: total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(
        activity: Option<&str>,
        code: Option<&str>,
        value: Option<f64>,
        provider_org: Option<&str>,
        receiver_org: Option<&str>,
        provider_activity: Option<&str>,
    ) -> TransactionRow {
        TransactionRow {
            iatiidentifier: activity.map(String::from),
            transactiontype_code: code.map(String::from),
            value_usd: value,
            providerorg_ref: provider_org.map(String::from),
            providerorg_narrative: None,
            providerorg_provider_activity_id: provider_activity.map(String::from),
            receiverorg_ref: receiver_org.map(String::from),
            receiverorg_narrative: None,
            receiverorg_receiver_activity_id: None,
        }
    }

    #[test]
    fn test_provider_org_edges_sum_by_type() {
        let txns = vec![
            txn(Some("ACT1"), Some("2"), Some(100.0), Some("ORG1"), None, None),
            txn(Some("ACT1"), Some("2"), Some(50.0), Some("ORG1"), None, None),
        ];
        let out = aggregate_financial_links(&txns);
        assert_eq!(out.len(), 1);
        let edge = &out[0];
        assert_eq!(edge.source_node_id, "ORG1");
        assert_eq!(edge.target_node_id, "ACT1");
        assert_eq!(edge.source_node_type, NodeKind::Organisation);
        assert_eq!(edge.target_node_type, NodeKind::Activity);
        assert_eq!(edge.total_value_usd, 150.0);
        assert_eq!(edge.transaction_type_name, "Outgoing Commitment");
        assert_eq!(edge.currency, "USD");
    }

    #[test]
    fn test_invalid_records_do_not_contribute() {
        let txns = vec![
            txn(Some("ACT1"), Some("3"), Some(10.0), Some("ORG1"), None, None),
            txn(Some("ACT1"), None, Some(99.0), Some("ORG1"), None, None),
            txn(Some("ACT1"), Some(""), Some(99.0), Some("ORG1"), None, None),
            txn(Some("ACT1"), Some("3"), None, Some("ORG1"), None, None),
            txn(None, Some("3"), Some(99.0), Some("ORG1"), None, None),
            txn(Some(""), Some("3"), Some(99.0), Some("ORG1"), None, None),
        ];
        let out = aggregate_financial_links(&txns);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].total_value_usd, 10.0);
    }

    #[test]
    fn test_type_codes_keep_separate_edges() {
        let txns = vec![
            txn(Some("ACT1"), Some("2"), Some(100.0), Some("ORG1"), None, None),
            txn(Some("ACT1"), Some("3"), Some(40.0), Some("ORG1"), None, None),
        ];
        let out = aggregate_financial_links(&txns);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_receiver_edges_run_activity_to_org() {
        let txns = vec![txn(
            Some("ACT1"),
            Some("3"),
            Some(25.0),
            None,
            Some("ORG2"),
            None,
        )];
        let out = aggregate_financial_links(&txns);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_node_id, "ACT1");
        assert_eq!(out[0].target_node_id, "ORG2");
        assert_eq!(out[0].source_node_type, NodeKind::Activity);
        assert_eq!(out[0].target_node_type, NodeKind::Organisation);
    }

    #[test]
    fn test_provider_activity_gated_on_missing_provider_org() {
        // Both a provider org and provider activity named: only the org
        // edge may count, otherwise the flow is double-counted.
        let both = txn(
            Some("ACT1"),
            Some("1"),
            Some(75.0),
            Some("ORG1"),
            None,
            Some("ACT0"),
        );
        let activity_only = txn(Some("ACT2"), Some("1"), Some(30.0), None, None, Some("ACT0"));
        let out = aggregate_financial_links(&[both, activity_only]);

        assert_eq!(out.len(), 2);
        assert!(out.iter().any(|e| e.source_node_id == "ORG1"
            && e.source_node_type == NodeKind::Organisation
            && e.total_value_usd == 75.0));
        assert!(out.iter().any(|e| e.source_node_id == "ACT0"
            && e.source_node_type == NodeKind::Activity
            && e.target_node_id == "ACT2"
            && e.total_value_usd == 30.0));
    }

    #[test]
    fn test_unknown_type_code_falls_back_to_code() {
        let txns = vec![txn(Some("ACT1"), Some("42"), Some(5.0), Some("ORG1"), None, None)];
        let out = aggregate_financial_links(&txns);
        assert_eq!(out[0].transaction_type_name, "42");
    }

    #[test]
    fn test_funds_collapse_types_per_pair() {
        let txns = vec![
            txn(Some("ACT1"), Some("1"), Some(100.0), None, None, Some("ACT0")),
            txn(Some("ACT1"), Some("3"), Some(40.0), None, None, Some("ACT0")),
        ];
        let links = aggregate_financial_links(&txns);
        let funds = aggregate_funds_links(&links);
        assert_eq!(funds.len(), 1);
        assert_eq!(funds[0].source_node_id, "ACT0");
        assert_eq!(funds[0].target_node_id, "ACT1");
        assert_eq!(funds[0].total_value_usd, 140.0);
    }

    #[test]
    fn test_funds_ignore_non_fund_types_and_org_edges() {
        let txns = vec![
            // Interest payment: not a fund movement
            txn(Some("ACT1"), Some("5"), Some(100.0), None, None, Some("ACT0")),
            // Org-to-activity direction never qualifies
            txn(Some("ACT1"), Some("3"), Some(60.0), Some("ORG1"), None, None),
        ];
        let links = aggregate_financial_links(&txns);
        let funds = aggregate_funds_links(&links);
        assert!(funds.is_empty());
    }

    #[test]
    fn test_funds_drop_non_positive_totals() {
        let txns = vec![
            txn(Some("ACT1"), Some("1"), Some(100.0), None, None, Some("ACT0")),
            txn(Some("ACT1"), Some("3"), Some(-100.0), None, None, Some("ACT0")),
        ];
        let links = aggregate_financial_links(&txns);
        let funds = aggregate_funds_links(&links);
        assert!(funds.is_empty(), "zero-sum pair must not appear");
    }
}

//! Phantom entity discovery.
//!
//! A phantom is an identifier that appears as the target of a reference
//! inside some relationship-bearing record but has no canonical row of
//! its own. Organisation phantoms are grouped to one row per reference
//! with per-family provenance flags; activity phantoms stay as full
//! (identifier, source column, declaring activity) audit triples.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use iatigraph_db::queries::entities::{
    PhantomActivityRow, PhantomOrganisationRow, PublishedActivityRow, PublishedOrganisationRow,
};
use iatigraph_db::queries::source::{
    OtherIdentifierRow, ParticipatingOrgRow, PlannedDisbursementRow, RecipientOrgBudgetRow,
    RelatedActivityRow, TransactionRow,
};

use crate::non_empty;

/// Source-column names recorded on phantom-activity audit rows.
pub mod source_columns {
    pub const PARTICIPATINGORG_ACTIVITYID: &str = "participatingorg.activityid";
    pub const TRANSACTION_PROVIDER: &str = "transaction.providerorg_provider_activity_id";
    pub const TRANSACTION_RECEIVER: &str = "transaction.receiverorg_receiver_activity_id";
    pub const RELATEDACTIVITY_REF: &str = "relatedactivity.ref";
    pub const PLANNEDDISBURSEMENT_PROVIDER: &str =
        "planneddisbursement.providerorg_provider_activity_id";
    pub const PLANNEDDISBURSEMENT_RECEIVER: &str =
        "planneddisbursement.receiverorg_receiver_activity_id";
}

#[derive(Default)]
struct PhantomOrgAcc {
    narratives: BTreeSet<String>,
    in_participatingorg: bool,
    in_transaction_provider: bool,
    in_transaction_receiver: bool,
    in_orgbudget_recipient: bool,
}

fn observe_org<'m>(
    phantoms: &'m mut BTreeMap<String, PhantomOrgAcc>,
    reference: &str,
    narrative: Option<&str>,
) -> &'m mut PhantomOrgAcc {
    let acc = phantoms.entry(reference.to_string()).or_default();
    if let Some(n) = narrative.filter(|n| !n.is_empty()) {
        acc.narratives.insert(n.to_string());
    }
    acc
}

/// Discover organisation references with no canonical description.
///
/// Four reference families are scanned; a reference known to the
/// canonical organisation table or the alternate-identifier lookup is
/// never a phantom. Flags are OR-aggregated across all observations,
/// narratives collected as a sorted distinct set.
pub fn discover_phantom_organisations(
    participating: &[ParticipatingOrgRow],
    transactions: &[TransactionRow],
    budgets: &[RecipientOrgBudgetRow],
    canonical: &[PublishedOrganisationRow],
    other_identifiers: &[OtherIdentifierRow],
) -> Vec<PhantomOrganisationRow> {
    let known: HashSet<&str> = canonical
        .iter()
        .map(|o| o.organisationidentifier.as_str())
        .chain(other_identifiers.iter().filter_map(|o| non_empty(&o.org_ref)))
        .collect();

    let mut phantoms: BTreeMap<String, PhantomOrgAcc> = BTreeMap::new();

    for row in participating {
        if let Some(reference) = non_empty(&row.org_ref).filter(|r| !known.contains(r)) {
            observe_org(&mut phantoms, reference, row.narrative.as_deref())
                .in_participatingorg = true;
        }
    }
    for row in transactions {
        if let Some(reference) = non_empty(&row.providerorg_ref).filter(|r| !known.contains(r)) {
            observe_org(&mut phantoms, reference, row.providerorg_narrative.as_deref())
                .in_transaction_provider = true;
        }
        if let Some(reference) = non_empty(&row.receiverorg_ref).filter(|r| !known.contains(r)) {
            observe_org(&mut phantoms, reference, row.receiverorg_narrative.as_deref())
                .in_transaction_receiver = true;
        }
    }
    for row in budgets {
        if let Some(reference) = non_empty(&row.recipientorg_ref).filter(|r| !known.contains(r)) {
            observe_org(&mut phantoms, reference, row.recipientorg_narrative.as_deref())
                .in_orgbudget_recipient = true;
        }
    }

    phantoms
        .into_iter()
        .map(|(reference, acc)| PhantomOrganisationRow {
            reference,
            distinct_narratives: acc.narratives.into_iter().collect(),
            phantom_in_participatingorg: acc.in_participatingorg,
            phantom_in_transaction_provider: acc.in_transaction_provider,
            phantom_in_transaction_receiver: acc.in_transaction_receiver,
            phantom_in_orgbudget_recipient: acc.in_orgbudget_recipient,
        })
        .collect()
}

/// Discover activity references with no canonical description.
///
/// Unlike organisations, the output keeps one audit row per distinct
/// (reference, source column, declaring activity) triple; collapsing to
/// one node per identifier is the graph loader's call.
pub fn discover_phantom_activities(
    participating: &[ParticipatingOrgRow],
    transactions: &[TransactionRow],
    related: &[RelatedActivityRow],
    disbursements: &[PlannedDisbursementRow],
    canonical: &[PublishedActivityRow],
) -> Vec<PhantomActivityRow> {
    let known: HashSet<&str> = canonical.iter().map(|a| a.iatiidentifier.as_str()).collect();

    let mut triples: BTreeSet<PhantomActivityRow> = BTreeSet::new();
    let mut observe = |reference: Option<&str>, source_column: &str, declarer: Option<&str>| {
        let (Some(reference), Some(declarer)) = (reference, declarer) else {
            return;
        };
        if known.contains(reference) {
            return;
        }
        triples.insert(PhantomActivityRow {
            phantom_activity_identifier: reference.to_string(),
            source_column: source_column.to_string(),
            source_activity_id: declarer.to_string(),
        });
    };

    for row in participating {
        observe(
            non_empty(&row.activityid),
            source_columns::PARTICIPATINGORG_ACTIVITYID,
            non_empty(&row.iatiidentifier),
        );
    }
    for row in transactions {
        observe(
            non_empty(&row.providerorg_provider_activity_id),
            source_columns::TRANSACTION_PROVIDER,
            non_empty(&row.iatiidentifier),
        );
        observe(
            non_empty(&row.receiverorg_receiver_activity_id),
            source_columns::TRANSACTION_RECEIVER,
            non_empty(&row.iatiidentifier),
        );
    }
    for row in related {
        observe(
            non_empty(&row.related_ref),
            source_columns::RELATEDACTIVITY_REF,
            non_empty(&row.iatiidentifier),
        );
    }
    for row in disbursements {
        observe(
            non_empty(&row.providerorg_provider_activity_id),
            source_columns::PLANNEDDISBURSEMENT_PROVIDER,
            non_empty(&row.iatiidentifier),
        );
        observe(
            non_empty(&row.receiverorg_receiver_activity_id),
            source_columns::PLANNEDDISBURSEMENT_RECEIVER,
            non_empty(&row.iatiidentifier),
        );
    }

    triples.into_iter().collect()
}

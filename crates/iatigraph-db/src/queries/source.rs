//! Readers for the raw IATI source tables.
//!
//! Each reader returns the complete table; the transformation layer is
//! a batch recompute over full snapshots, so there is no row-level
//! filtering at this level. `row_id` on versioned tables is the SQLite
//! rowid, used as the stable last-resort tie-break when ranking
//! duplicate submissions.

use rusqlite::Row;

use crate::pool::{DbPool, DbResult};

/// A raw activity submission. Many rows may share an `iatiidentifier`.
#[derive(Debug, Clone)]
pub struct ActivityRow {
    pub row_id: i64,
    pub iatiidentifier: Option<String>,
    pub title_narrative: Option<String>,
    pub reportingorg_ref: Option<String>,
    pub reportingorg_narrative: Option<String>,
    pub reportingorg_type: Option<String>,
    pub activitystatus_code: Option<String>,
    pub plannedstart: Option<String>,
    pub plannedend: Option<String>,
    pub actualstart: Option<String>,
    pub actualend: Option<String>,
    pub lastupdateddatetime: Option<String>,
    pub hierarchy: Option<i64>,
    pub dataset: Option<String>,
}

/// A raw organisation submission.
#[derive(Debug, Clone)]
pub struct OrganisationRow {
    pub row_id: i64,
    pub organisationidentifier: Option<String>,
    pub name_narrative: Option<String>,
    pub hierarchy: Option<i64>,
    pub reportingorg_ref: Option<String>,
    pub lastupdateddatetime: Option<String>,
    pub dataset: Option<String>,
}

/// A participating-org declaration inside an activity.
#[derive(Debug, Clone)]
pub struct ParticipatingOrgRow {
    /// The declaring activity.
    pub iatiidentifier: Option<String>,
    /// The participating organisation's reference.
    pub org_ref: Option<String>,
    pub narrative: Option<String>,
    pub role_code: Option<String>,
    pub role_name: Option<String>,
    /// The participant's own activity, when declared.
    pub activityid: Option<String>,
}

/// A financial transaction owned by an activity. Values are already
/// normalised to USD by the upstream ingest.
#[derive(Debug, Clone)]
pub struct TransactionRow {
    pub iatiidentifier: Option<String>,
    pub transactiontype_code: Option<String>,
    pub value_usd: Option<f64>,
    pub providerorg_ref: Option<String>,
    pub providerorg_narrative: Option<String>,
    pub providerorg_provider_activity_id: Option<String>,
    pub receiverorg_ref: Option<String>,
    pub receiverorg_narrative: Option<String>,
    pub receiverorg_receiver_activity_id: Option<String>,
}

/// An alternate organisation identifier.
#[derive(Debug, Clone)]
pub struct OtherIdentifierRow {
    pub org_ref: Option<String>,
}

/// A recipient-org line from an organisation budget.
#[derive(Debug, Clone)]
pub struct RecipientOrgBudgetRow {
    pub recipientorg_ref: Option<String>,
    pub recipientorg_narrative: Option<String>,
}

/// A related-activity declaration. Type 1 declares the referenced
/// activity as parent, 2 as child, 3 as sibling.
#[derive(Debug, Clone)]
pub struct RelatedActivityRow {
    pub iatiidentifier: Option<String>,
    pub related_ref: Option<String>,
    pub relation_type: Option<i64>,
}

/// A planned disbursement with optional provider/receiver activities.
#[derive(Debug, Clone)]
pub struct PlannedDisbursementRow {
    pub iatiidentifier: Option<String>,
    pub providerorg_provider_activity_id: Option<String>,
    pub receiverorg_receiver_activity_id: Option<String>,
}

fn activity_from_row(row: &Row) -> rusqlite::Result<ActivityRow> {
    Ok(ActivityRow {
        row_id: row.get(0)?,
        iatiidentifier: row.get(1)?,
        title_narrative: row.get(2)?,
        reportingorg_ref: row.get(3)?,
        reportingorg_narrative: row.get(4)?,
        reportingorg_type: row.get(5)?,
        activitystatus_code: row.get(6)?,
        plannedstart: row.get(7)?,
        plannedend: row.get(8)?,
        actualstart: row.get(9)?,
        actualend: row.get(10)?,
        lastupdateddatetime: row.get(11)?,
        hierarchy: row.get(12)?,
        dataset: row.get(13)?,
    })
}

/// Read all raw activity rows.
pub fn list_activities(pool: &DbPool) -> DbResult<Vec<ActivityRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT rowid, iatiidentifier, title_narrative, reportingorg_ref,
                    reportingorg_narrative, reportingorg_type, activitystatus_code,
                    plannedstart, plannedend, actualstart, actualend,
                    lastupdateddatetime, hierarchy, dataset
             FROM activity",
        )?;
        let rows = stmt
            .query_map([], activity_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Read all raw organisation rows.
pub fn list_organisations(pool: &DbPool) -> DbResult<Vec<OrganisationRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT rowid, organisationidentifier, name_narrative, hierarchy,
                    reportingorg_ref, lastupdateddatetime, dataset
             FROM organisation",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(OrganisationRow {
                    row_id: row.get(0)?,
                    organisationidentifier: row.get(1)?,
                    name_narrative: row.get(2)?,
                    hierarchy: row.get(3)?,
                    reportingorg_ref: row.get(4)?,
                    lastupdateddatetime: row.get(5)?,
                    dataset: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Read all participating-org declarations.
pub fn list_participating_orgs(pool: &DbPool) -> DbResult<Vec<ParticipatingOrgRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT iatiidentifier, ref, narrative, role_code, role_name, activityid
             FROM participatingorg",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ParticipatingOrgRow {
                    iatiidentifier: row.get(0)?,
                    org_ref: row.get(1)?,
                    narrative: row.get(2)?,
                    role_code: row.get(3)?,
                    role_name: row.get(4)?,
                    activityid: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Read all raw transactions.
pub fn list_transactions(pool: &DbPool) -> DbResult<Vec<TransactionRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT iatiidentifier, transactiontype_code, value_usd,
                    providerorg_ref, providerorg_narrative,
                    providerorg_provider_activity_id,
                    receiverorg_ref, receiverorg_narrative,
                    receiverorg_receiver_activity_id
             FROM \"transaction\"",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TransactionRow {
                    iatiidentifier: row.get(0)?,
                    transactiontype_code: row.get(1)?,
                    value_usd: row.get(2)?,
                    providerorg_ref: row.get(3)?,
                    providerorg_narrative: row.get(4)?,
                    providerorg_provider_activity_id: row.get(5)?,
                    receiverorg_ref: row.get(6)?,
                    receiverorg_narrative: row.get(7)?,
                    receiverorg_receiver_activity_id: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Read alternate organisation identifiers.
pub fn list_other_identifiers(pool: &DbPool) -> DbResult<Vec<OtherIdentifierRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT ref FROM otheridentifier")?;
        let rows = stmt
            .query_map([], |row| Ok(OtherIdentifierRow { org_ref: row.get(0)? }))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Read recipient-org budget lines.
pub fn list_recipient_org_budgets(pool: &DbPool) -> DbResult<Vec<RecipientOrgBudgetRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT recipientorg_ref, recipientorg_narrative
             FROM organisation_recipientorgbudget",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RecipientOrgBudgetRow {
                    recipientorg_ref: row.get(0)?,
                    recipientorg_narrative: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Read related-activity declarations.
pub fn list_related_activities(pool: &DbPool) -> DbResult<Vec<RelatedActivityRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT iatiidentifier, ref, type FROM relatedactivity")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RelatedActivityRow {
                    iatiidentifier: row.get(0)?,
                    related_ref: row.get(1)?,
                    relation_type: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Read planned disbursements.
pub fn list_planned_disbursements(pool: &DbPool) -> DbResult<Vec<PlannedDisbursementRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT iatiidentifier, providerorg_provider_activity_id,
                    receiverorg_receiver_activity_id
             FROM planneddisbursement",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PlannedDisbursementRow {
                    iatiidentifier: row.get(0)?,
                    providerorg_provider_activity_id: row.get(1)?,
                    receiverorg_receiver_activity_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

//! Derived entity tables: published and phantom activities/organisations.
//!
//! Writers replace the whole table inside a transaction, so a failed
//! run never leaves a partially written table behind. Primary keys on
//! the derived tables turn duplicate canonical/phantom identifiers
//! into hard constraint errors instead of silent dedup.

use rusqlite::params;

use crate::pool::{DbPool, DbResult};

/// Canonical activity, one row per IATI identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedActivityRow {
    pub iatiidentifier: String,
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
    pub dportal_link: String,
}

/// Canonical organisation, one row per organisation identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedOrganisationRow {
    pub organisationidentifier: String,
    pub name_narrative: Option<String>,
    pub hierarchy: Option<i64>,
    pub reportingorg_ref: Option<String>,
    pub dportal_link: String,
}

/// An organisation referenced somewhere but never described. Flags
/// record which reference families the phantom was observed in.
#[derive(Debug, Clone, PartialEq)]
pub struct PhantomOrganisationRow {
    pub reference: String,
    pub distinct_narratives: Vec<String>,
    pub phantom_in_participatingorg: bool,
    pub phantom_in_transaction_provider: bool,
    pub phantom_in_transaction_receiver: bool,
    pub phantom_in_orgbudget_recipient: bool,
}

/// One phantom-activity audit record per (identifier, source column,
/// declaring activity) triple. Identifier-level grouping happens in
/// the graph loader.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhantomActivityRow {
    pub phantom_activity_identifier: String,
    pub source_column: String,
    pub source_activity_id: String,
}

/// Replace the published_activities table.
pub fn replace_published_activities(
    pool: &DbPool,
    rows: &[PublishedActivityRow],
) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM published_activities", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO published_activities
                 (iatiidentifier, title_narrative, reportingorg_ref,
                  reportingorg_narrative, reportingorg_type, activitystatus_code,
                  plannedstart, plannedend, actualstart, actualend,
                  lastupdateddatetime, hierarchy, dportal_link)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.iatiidentifier,
                    r.title_narrative,
                    r.reportingorg_ref,
                    r.reportingorg_narrative,
                    r.reportingorg_type,
                    r.activitystatus_code,
                    r.plannedstart,
                    r.plannedend,
                    r.actualstart,
                    r.actualend,
                    r.lastupdateddatetime,
                    r.hierarchy,
                    r.dportal_link,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all published activities.
pub fn list_published_activities(pool: &DbPool) -> DbResult<Vec<PublishedActivityRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT iatiidentifier, title_narrative, reportingorg_ref,
                    reportingorg_narrative, reportingorg_type, activitystatus_code,
                    plannedstart, plannedend, actualstart, actualend,
                    lastupdateddatetime, hierarchy, dportal_link
             FROM published_activities ORDER BY iatiidentifier",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PublishedActivityRow {
                    iatiidentifier: row.get(0)?,
                    title_narrative: row.get(1)?,
                    reportingorg_ref: row.get(2)?,
                    reportingorg_narrative: row.get(3)?,
                    reportingorg_type: row.get(4)?,
                    activitystatus_code: row.get(5)?,
                    plannedstart: row.get(6)?,
                    plannedend: row.get(7)?,
                    actualstart: row.get(8)?,
                    actualend: row.get(9)?,
                    lastupdateddatetime: row.get(10)?,
                    hierarchy: row.get(11)?,
                    dportal_link: row.get(12)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Replace the published_organisations table.
pub fn replace_published_organisations(
    pool: &DbPool,
    rows: &[PublishedOrganisationRow],
) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM published_organisations", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO published_organisations
                 (organisationidentifier, name_narrative, hierarchy,
                  reportingorg_ref, dportal_link)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.organisationidentifier,
                    r.name_narrative,
                    r.hierarchy,
                    r.reportingorg_ref,
                    r.dportal_link,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all published organisations.
pub fn list_published_organisations(pool: &DbPool) -> DbResult<Vec<PublishedOrganisationRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT organisationidentifier, name_narrative, hierarchy,
                    reportingorg_ref, dportal_link
             FROM published_organisations ORDER BY organisationidentifier",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PublishedOrganisationRow {
                    organisationidentifier: row.get(0)?,
                    name_narrative: row.get(1)?,
                    hierarchy: row.get(2)?,
                    reportingorg_ref: row.get(3)?,
                    dportal_link: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Replace the phantom_organisations table.
pub fn replace_phantom_organisations(
    pool: &DbPool,
    rows: &[PhantomOrganisationRow],
) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM phantom_organisations", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO phantom_organisations
                 (reference, distinct_narratives, phantom_in_participatingorg,
                  phantom_in_transaction_provider, phantom_in_transaction_receiver,
                  phantom_in_orgbudget_recipient)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in rows {
                let narratives = serde_json::to_string(&r.distinct_narratives)
                    .map_err(crate::pool::DbError::Json)?;
                stmt.execute(params![
                    r.reference,
                    narratives,
                    r.phantom_in_participatingorg,
                    r.phantom_in_transaction_provider,
                    r.phantom_in_transaction_receiver,
                    r.phantom_in_orgbudget_recipient,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all phantom organisations.
pub fn list_phantom_organisations(pool: &DbPool) -> DbResult<Vec<PhantomOrganisationRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT reference, distinct_narratives, phantom_in_participatingorg,
                    phantom_in_transaction_provider, phantom_in_transaction_receiver,
                    phantom_in_orgbudget_recipient
             FROM phantom_organisations ORDER BY reference",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, bool>(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.into_iter()
            .map(|(reference, narratives, p, tp, tr, ob)| {
                Ok(PhantomOrganisationRow {
                    reference,
                    distinct_narratives: serde_json::from_str(&narratives)?,
                    phantom_in_participatingorg: p,
                    phantom_in_transaction_provider: tp,
                    phantom_in_transaction_receiver: tr,
                    phantom_in_orgbudget_recipient: ob,
                })
            })
            .collect()
    })
}

/// Replace the phantom_activities table.
pub fn replace_phantom_activities(pool: &DbPool, rows: &[PhantomActivityRow]) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM phantom_activities", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO phantom_activities
                 (phantom_activity_identifier, source_column, source_activity_id)
                 VALUES (?1, ?2, ?3)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.phantom_activity_identifier,
                    r.source_column,
                    r.source_activity_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all phantom-activity audit records, ordered by identifier so
/// the loader can group consecutive rows into one node.
pub fn list_phantom_activities(pool: &DbPool) -> DbResult<Vec<PhantomActivityRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT phantom_activity_identifier, source_column, source_activity_id
             FROM phantom_activities
             ORDER BY phantom_activity_identifier, source_column, source_activity_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PhantomActivityRow {
                    phantom_activity_identifier: row.get(0)?,
                    source_column: row.get(1)?,
                    source_activity_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

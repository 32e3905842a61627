//! Derived edge tables: participation, financial, funds, hierarchy and
//! activity-participation summary links.

use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
    ToSql,
};

use crate::pool::{DbPool, DbResult};

/// Kind of node an edge endpoint refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Activity,
    Organisation,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "ACTIVITY",
            Self::Organisation => "ORGANISATION",
        }
    }
}

impl ToSql for NodeKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for NodeKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "ACTIVITY" => Ok(Self::Activity),
            "ORGANISATION" => Ok(Self::Organisation),
            other => Err(FromSqlError::Other(
                format!("unknown node kind: {other}").into(),
            )),
        }
    }
}

/// Direction of a resolved hierarchy edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HierarchyKind {
    ParentOf,
    SiblingOf,
}

impl HierarchyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParentOf => "PARENT_OF",
            Self::SiblingOf => "SIBLING_OF",
        }
    }
}

impl ToSql for HierarchyKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for HierarchyKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "PARENT_OF" => Ok(Self::ParentOf),
            "SIBLING_OF" => Ok(Self::SiblingOf),
            other => Err(FromSqlError::Other(
                format!("unknown hierarchy kind: {other}").into(),
            )),
        }
    }
}

/// One edge per distinct (organisation, activity, role) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationLinkRow {
    pub organisation_id: String,
    pub activity_id: String,
    pub role_code: String,
    pub role_name: Option<String>,
}

/// Directed financial summary edge, one per (source, target, type).
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialLinkRow {
    pub source_node_id: String,
    pub target_node_id: String,
    pub source_node_type: NodeKind,
    pub target_node_type: NodeKind,
    pub transactiontype_code: String,
    pub transaction_type_name: String,
    pub currency: String,
    pub total_value_usd: f64,
}

/// Coarse activity-to-activity funding edge; totals strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct FundsLinkRow {
    pub source_node_id: String,
    pub target_node_id: String,
    pub currency: String,
    pub total_value_usd: f64,
}

/// Resolved hierarchy edge with declaring-activity provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyLinkRow {
    pub source_node_id: String,
    pub target_node_id: String,
    pub relationship_type: HierarchyKind,
    pub declared_by: Vec<String>,
}

/// Role unions per declared activity pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityParticipationSummaryRow {
    pub source_activity_id: String,
    pub target_activity_id: String,
    pub role_codes: Vec<String>,
    pub role_names: Vec<String>,
}

/// Replace the participation_links table.
pub fn replace_participation_links(pool: &DbPool, rows: &[ParticipationLinkRow]) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM participation_links", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO participation_links
                 (organisation_id, activity_id, role_code, role_name)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.organisation_id,
                    r.activity_id,
                    r.role_code,
                    r.role_name
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all participation links.
pub fn list_participation_links(pool: &DbPool) -> DbResult<Vec<ParticipationLinkRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT organisation_id, activity_id, role_code, role_name
             FROM participation_links
             ORDER BY organisation_id, activity_id, role_code",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ParticipationLinkRow {
                    organisation_id: row.get(0)?,
                    activity_id: row.get(1)?,
                    role_code: row.get(2)?,
                    role_name: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Replace the financial_links table.
pub fn replace_financial_links(pool: &DbPool, rows: &[FinancialLinkRow]) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM financial_links", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO financial_links
                 (source_node_id, target_node_id, source_node_type, target_node_type,
                  transactiontype_code, transaction_type_name, currency, total_value_usd)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.source_node_id,
                    r.target_node_id,
                    r.source_node_type,
                    r.target_node_type,
                    r.transactiontype_code,
                    r.transaction_type_name,
                    r.currency,
                    r.total_value_usd,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all financial links.
pub fn list_financial_links(pool: &DbPool) -> DbResult<Vec<FinancialLinkRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT source_node_id, target_node_id, source_node_type, target_node_type,
                    transactiontype_code, transaction_type_name, currency, total_value_usd
             FROM financial_links
             ORDER BY source_node_id, target_node_id, transactiontype_code",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FinancialLinkRow {
                    source_node_id: row.get(0)?,
                    target_node_id: row.get(1)?,
                    source_node_type: row.get(2)?,
                    target_node_type: row.get(3)?,
                    transactiontype_code: row.get(4)?,
                    transaction_type_name: row.get(5)?,
                    currency: row.get(6)?,
                    total_value_usd: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Replace the funds_links table.
pub fn replace_funds_links(pool: &DbPool, rows: &[FundsLinkRow]) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM funds_links", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO funds_links
                 (source_node_id, target_node_id, source_node_type, target_node_type,
                  currency, total_value_usd)
                 VALUES (?1, ?2, 'ACTIVITY', 'ACTIVITY', ?3, ?4)",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.source_node_id,
                    r.target_node_id,
                    r.currency,
                    r.total_value_usd,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all funds links.
pub fn list_funds_links(pool: &DbPool) -> DbResult<Vec<FundsLinkRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT source_node_id, target_node_id, currency, total_value_usd
             FROM funds_links ORDER BY source_node_id, target_node_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FundsLinkRow {
                    source_node_id: row.get(0)?,
                    target_node_id: row.get(1)?,
                    currency: row.get(2)?,
                    total_value_usd: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
}

/// Replace the hierarchy_links table.
pub fn replace_hierarchy_links(pool: &DbPool, rows: &[HierarchyLinkRow]) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM hierarchy_links", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO hierarchy_links
                 (source_node_id, target_node_id, relationship_type, declared_by)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for r in rows {
                let declared_by = serde_json::to_string(&r.declared_by)?;
                stmt.execute(params![
                    r.source_node_id,
                    r.target_node_id,
                    r.relationship_type,
                    declared_by,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all hierarchy links.
pub fn list_hierarchy_links(pool: &DbPool) -> DbResult<Vec<HierarchyLinkRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT source_node_id, target_node_id, relationship_type, declared_by
             FROM hierarchy_links
             ORDER BY relationship_type, source_node_id, target_node_id",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, HierarchyKind>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.into_iter()
            .map(|(source, target, kind, declared_by)| {
                Ok(HierarchyLinkRow {
                    source_node_id: source,
                    target_node_id: target,
                    relationship_type: kind,
                    declared_by: serde_json::from_str(&declared_by)?,
                })
            })
            .collect()
    })
}

/// Replace the activity_participation_summary_links table.
pub fn replace_activity_participation_summaries(
    pool: &DbPool,
    rows: &[ActivityParticipationSummaryRow],
) -> DbResult<()> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM activity_participation_summary_links", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO activity_participation_summary_links
                 (source_activity_id, target_activity_id, role_codes, role_names)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for r in rows {
                let codes = serde_json::to_string(&r.role_codes)?;
                let names = serde_json::to_string(&r.role_names)?;
                stmt.execute(params![
                    r.source_activity_id,
                    r.target_activity_id,
                    codes,
                    names
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
}

/// Read all activity-participation summary links.
pub fn list_activity_participation_summaries(
    pool: &DbPool,
) -> DbResult<Vec<ActivityParticipationSummaryRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT source_activity_id, target_activity_id, role_codes, role_names
             FROM activity_participation_summary_links
             ORDER BY source_activity_id, target_activity_id",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.into_iter()
            .map(|(source, target, codes, names)| {
                Ok(ActivityParticipationSummaryRow {
                    source_activity_id: source,
                    target_activity_id: target,
                    role_codes: serde_json::from_str(&codes)?,
                    role_names: serde_json::from_str(&names)?,
                })
            })
            .collect()
    })
}

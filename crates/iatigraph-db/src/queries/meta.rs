//! Transform-run audit records.

use rusqlite::params;

use crate::pool::{DbError, DbPool, DbResult};

/// Record the row count a transform run produced for one derived table.
pub fn record_run(pool: &DbPool, run_at: &str, table_name: &str, row_count: usize) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO transform_runs (run_at, table_name, row_count)
             VALUES (?1, ?2, ?3)",
            params![run_at, table_name, row_count as i64],
        )?;
        Ok(())
    })
}

/// Timestamp of the most recent transform run, if any.
pub fn last_run_time(pool: &DbPool) -> DbResult<Option<String>> {
    pool.with_conn(|conn| {
        let latest = conn.query_row("SELECT MAX(run_at) FROM transform_runs", [], |row| {
            row.get::<_, Option<String>>(0)
        })?;
        Ok(latest)
    })
}

/// Current row count of a derived table, for status display.
pub fn table_count(pool: &DbPool, table_name: &str) -> DbResult<i64> {
    pool.with_conn(|conn| {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![table_name],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::MissingTable(table_name.to_string()));
        }
        // Table names come from a fixed internal list, never user input.
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{table_name}\""),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    #[test]
    fn test_record_and_last_run() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();

        assert_eq!(last_run_time(&pool).unwrap(), None);
        record_run(&pool, "2026-01-01T00:00:00Z", "published_activities", 10).unwrap();
        record_run(&pool, "2026-02-01T00:00:00Z", "published_activities", 12).unwrap();
        assert_eq!(
            last_run_time(&pool).unwrap().as_deref(),
            Some("2026-02-01T00:00:00Z")
        );
    }

    #[test]
    fn test_table_count_on_known_table() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        assert_eq!(table_count(&pool, "published_activities").unwrap(), 0);
    }

    #[test]
    fn test_table_count_rejects_unknown_table() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        let err = table_count(&pool, "no_such_table").unwrap_err();
        assert!(matches!(err, DbError::MissingTable(name) if name == "no_such_table"));
    }
}

//! Store methods for the canonical metric and headcount tables.

use super::PeerStore;
use crate::{
    error::PeerResult,
    table::{HeadcountRecord, HeadcountTable, MetricRecord, MetricTable},
    types::Year,
};
use rusqlite::{params, Row};

fn metric_from_row(row: &Row<'_>) -> rusqlite::Result<MetricRecord> {
    Ok(MetricRecord {
        institution_id:   row.get(0)?,
        year:             row.get(1)?,
        institution_name: row.get(2)?,
        metric_value:     row.get(3)?,
        source_flag:      row.get(4)?,
        is_revised:       row.get::<_, Option<i32>>(5)?.map(|v| v != 0),
        sector:           row.get(6)?,
    })
}

impl PeerStore {
    // ── Metric ─────────────────────────────────────────────────

    /// Upsert metric rows; a repeated (institution_id, year) replaces the
    /// earlier value. Returns rows written.
    pub fn insert_metrics(&self, table: &MetricTable) -> PeerResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO metric
                    (institution_id, year, institution_name, metric_value, source_flag, is_revised, sector)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in table.records() {
                stmt.execute(params![
                    r.institution_id,
                    r.year,
                    r.institution_name,
                    r.metric_value,
                    r.source_flag,
                    r.is_revised.map(|b| b as i32),
                    r.sector,
                ])?;
            }
        }
        tx.commit()?;
        Ok(table.len())
    }

    /// Load the metric table, optionally restricted to one year.
    pub fn load_metric_table(&self, year: Option<Year>) -> PeerResult<MetricTable> {
        let mut stmt = self.conn.prepare(
            "SELECT institution_id, year, institution_name, metric_value, source_flag, is_revised, sector
             FROM metric
             WHERE ?1 IS NULL OR year = ?1
             ORDER BY year ASC, institution_id ASC",
        )?;
        let records = stmt
            .query_map(params![year], metric_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MetricTable::new(records))
    }

    pub fn metric_count(&self) -> PeerResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM metric", [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Headcount ──────────────────────────────────────────────

    pub fn insert_headcounts(&self, table: &HeadcountTable) -> PeerResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO headcount (institution_id, year, headcount, headcount_source)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for r in table.records() {
                stmt.execute(params![r.institution_id, r.year, r.headcount, r.headcount_source])?;
            }
        }
        tx.commit()?;
        Ok(table.len())
    }

    pub fn load_headcount_table(&self, year: Option<Year>) -> PeerResult<HeadcountTable> {
        let mut stmt = self.conn.prepare(
            "SELECT institution_id, year, headcount, headcount_source
             FROM headcount
             WHERE ?1 IS NULL OR year = ?1
             ORDER BY year ASC, institution_id ASC",
        )?;
        let records = stmt
            .query_map(params![year], |row| {
                Ok(HeadcountRecord {
                    institution_id:   row.get(0)?,
                    year:             row.get(1)?,
                    headcount:        row.get(2)?,
                    headcount_source: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HeadcountTable::new(records))
    }

    pub fn headcount_count(&self) -> PeerResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM headcount", [], |row| row.get(0))?;
        Ok(count)
    }
}

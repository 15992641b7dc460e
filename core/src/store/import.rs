//! Store methods for the import log: one row per table load.

use super::PeerStore;
use crate::{
    error::PeerResult,
    types::{ImportId, Year},
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub import_id:   ImportId,
    pub source:      String,
    pub table_name:  String,
    pub row_count:   i64,
    pub year_range:  Option<(Year, Year)>,
    pub imported_at: DateTime<Utc>,
}

impl PeerStore {
    /// Record one import and return its generated id.
    pub fn record_import(
        &self,
        source: &str,
        table_name: &str,
        row_count: usize,
        year_range: Option<(Year, Year)>,
    ) -> PeerResult<ImportId> {
        let import_id = uuid::Uuid::new_v4().to_string();
        let imported_at = Utc::now();
        self.conn.execute(
            "INSERT INTO import_log (import_id, source, table_name, row_count, year_min, year_max, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                import_id,
                source,
                table_name,
                row_count as i64,
                year_range.map(|(lo, _)| lo),
                year_range.map(|(_, hi)| hi),
                imported_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;
        log::info!("import {import_id}: {row_count} {table_name} rows from {source}");
        Ok(import_id)
    }

    /// Most recent imports first.
    pub fn recent_imports(&self, limit: usize) -> PeerResult<Vec<ImportRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT import_id, source, table_name, row_count, year_min, year_max, imported_at
             FROM import_log
             ORDER BY imported_at DESC, rowid DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let year_min: Option<Year> = row.get(4)?;
                let year_max: Option<Year> = row.get(5)?;
                let imported_at: String = row.get(6)?;
                let imported_at = DateTime::parse_from_rfc3339(&imported_at)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e))
                    })?;
                Ok(ImportRecord {
                    import_id:   row.get(0)?,
                    source:      row.get(1)?,
                    table_name:  row.get(2)?,
                    row_count:   row.get(3)?,
                    year_range:  year_min.zip(year_max),
                    imported_at,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn import_count(&self) -> PeerResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM import_log", [], |row| row.get(0))?;
        Ok(count)
    }
}

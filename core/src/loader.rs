//! CSV loading for the canonical long table and the headcount table.
//!
//! RULE: schema is validated here, at the untyped boundary. Once a table
//! exists every row has its join keys, so the engine never re-checks.
//!
//! Value cells that fail to parse are coerced to missing; key cells
//! (institution_id, year) that fail to parse reject the load.

use crate::{
    error::{PeerError, PeerResult},
    table::{HeadcountRecord, HeadcountTable, MetricRecord, MetricTable},
    types::{InstitutionId, Year},
};
use csv::StringRecord;
use std::{io::Read, path::Path};

const METRIC_TABLE: &str = "metrics";
const HEADCOUNT_TABLE: &str = "headcounts";

const ID_COLUMNS: &[&str] = &["institution_id", "unitid"];
const YEAR_COLUMNS: &[&str] = &["year"];
const NAME_COLUMNS: &[&str] = &["institution_name", "instnm"];
const HEADCOUNT_COLUMNS: &[&str] = &["headcount", "ft_ug_headcount"];
const HEADCOUNT_SOURCE_COLUMNS: &[&str] = &["headcount_source"];

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

fn require_column(headers: &StringRecord, table: &str, names: &[&str]) -> PeerResult<usize> {
    find_column(headers, names).ok_or_else(|| PeerError::schema(table, names[0]))
}

fn cell<'r>(record: &'r StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_key<T: std::str::FromStr>(
    record: &StringRecord,
    idx: usize,
    column: &str,
    line: usize,
) -> PeerResult<T> {
    let raw = cell(record, Some(idx)).unwrap_or_default();
    // Integer keys are sometimes exported as floats ("100654.0").
    raw.parse::<T>()
        .ok()
        .or_else(|| raw.strip_suffix(".0").and_then(|s| s.parse::<T>().ok()))
        .ok_or_else(|| PeerError::DataLoad {
            path: format!("line {line}"),
            reason: format!("invalid {column} '{raw}'"),
        })
}

fn parse_value(record: &StringRecord, idx: Option<usize>, column: &str, line: usize) -> Option<f64> {
    let raw = cell(record, idx)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            log::warn!("line {line}: coercing non-numeric {column} '{raw}' to missing");
            None
        }
    }
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "t" => Some(true),
        "false" | "0" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}

/// Read the long-format metric table. `metric_column` names the value
/// column (e.g. `grad_rate_150`).
pub fn read_metric_table<R: Read>(reader: R, metric_column: &str) -> PeerResult<MetricTable> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let id_idx = require_column(&headers, METRIC_TABLE, ID_COLUMNS)?;
    let year_idx = require_column(&headers, METRIC_TABLE, YEAR_COLUMNS)?;
    let name_idx = require_column(&headers, METRIC_TABLE, NAME_COLUMNS)?;
    let value_idx = require_column(&headers, METRIC_TABLE, &[metric_column])?;
    let source_flag_idx = find_column(&headers, &["source_flag"]);
    let revised_idx = find_column(&headers, &["is_revised"]);
    let sector_idx = find_column(&headers, &["sector"]);

    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let line = i + 2;
        records.push(MetricRecord {
            institution_id: parse_key::<InstitutionId>(&row, id_idx, ID_COLUMNS[0], line)?,
            year: parse_key::<Year>(&row, year_idx, YEAR_COLUMNS[0], line)?,
            institution_name: cell(&row, Some(name_idx)).unwrap_or_default().to_string(),
            metric_value: parse_value(&row, Some(value_idx), metric_column, line),
            source_flag: cell(&row, source_flag_idx).map(str::to_string),
            is_revised: parse_flag(cell(&row, revised_idx)),
            sector: cell(&row, sector_idx).map(str::to_string),
        });
    }
    Ok(MetricTable::new(records))
}

/// Read the headcount table. `headcount` and `headcount_source` are
/// optional columns; when absent every row carries None.
pub fn read_headcount_table<R: Read>(reader: R) -> PeerResult<HeadcountTable> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let id_idx = require_column(&headers, HEADCOUNT_TABLE, ID_COLUMNS)?;
    let year_idx = require_column(&headers, HEADCOUNT_TABLE, YEAR_COLUMNS)?;
    let headcount_idx = find_column(&headers, HEADCOUNT_COLUMNS);
    let source_idx = find_column(&headers, HEADCOUNT_SOURCE_COLUMNS);

    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let line = i + 2;
        records.push(HeadcountRecord {
            institution_id: parse_key::<InstitutionId>(&row, id_idx, ID_COLUMNS[0], line)?,
            year: parse_key::<Year>(&row, year_idx, YEAR_COLUMNS[0], line)?,
            headcount: parse_value(&row, headcount_idx, HEADCOUNT_COLUMNS[0], line)
                .filter(|v| *v >= 0.0),
            headcount_source: cell(&row, source_idx).map(str::to_string),
        });
    }
    Ok(HeadcountTable::new(records))
}

fn open(path: &Path) -> PeerResult<std::fs::File> {
    std::fs::File::open(path).map_err(|e| PeerError::DataLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn with_path<T>(path: &Path, result: PeerResult<T>) -> PeerResult<T> {
    result.map_err(|e| match e {
        PeerError::DataLoad { reason, path: at } => PeerError::DataLoad {
            path: path.display().to_string(),
            reason: format!("{at}: {reason}"),
        },
        other => other,
    })
}

pub fn load_metric_csv(path: &Path, metric_column: &str) -> PeerResult<MetricTable> {
    let table = with_path(path, read_metric_table(open(path)?, metric_column))?;
    log::info!("loaded {} metric rows from {}", table.len(), path.display());
    Ok(table)
}

pub fn load_headcount_csv(path: &Path) -> PeerResult<HeadcountTable> {
    let table = with_path(path, read_headcount_table(open(path)?))?;
    log::info!("loaded {} headcount rows from {}", table.len(), path.display());
    Ok(table)
}

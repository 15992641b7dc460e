//! Canonical derived outputs built from the long table.
//!
//!   - latest_by_institution: one row per institution, most recent year.
//!   - summary_by_year:       per (year, sector) distribution summary.
//!   - BuildMetadata:         provenance for one build.

use crate::{
    stats,
    table::{MetricRecord, MetricTable},
    types::{InstitutionId, Year},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const UNKNOWN_SECTOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year:              Year,
    pub sector:            String,
    pub institution_count: usize,
    pub avg:               Option<f64>,
    pub median:            Option<f64>,
    pub p25:               Option<f64>,
    pub p75:               Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub built_at:     DateTime<Utc>,
    pub source_rows:  usize,
    pub latest_rows:  usize,
    pub summary_rows: usize,
    /// (min, max) year; None for an empty source.
    pub year_range:   Option<(Year, Year)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOutputs {
    pub latest:   Vec<MetricRecord>,
    pub summary:  Vec<YearSummary>,
    pub metadata: BuildMetadata,
}

/// Most recent row per institution, ordered by institution id. On a
/// duplicated (institution, year) the later table row wins.
pub fn latest_by_institution(metrics: &MetricTable) -> Vec<MetricRecord> {
    let mut latest: BTreeMap<InstitutionId, &MetricRecord> = BTreeMap::new();
    for record in metrics.records() {
        latest
            .entry(record.institution_id)
            .and_modify(|current| {
                if record.year >= current.year {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest.into_values().cloned().collect()
}

pub fn summary_by_year(metrics: &MetricTable) -> Vec<YearSummary> {
    let mut groups: BTreeMap<(Year, String), (BTreeSet<InstitutionId>, Vec<f64>)> = BTreeMap::new();
    for record in metrics.records() {
        let sector = record
            .sector
            .clone()
            .unwrap_or_else(|| UNKNOWN_SECTOR.to_string());
        let (ids, values) = groups.entry((record.year, sector)).or_default();
        ids.insert(record.institution_id);
        if let Some(v) = record.metric_value.filter(|v| !v.is_nan()) {
            values.push(v);
        }
    }

    groups
        .into_iter()
        .map(|((year, sector), (ids, values))| YearSummary {
            year,
            sector,
            institution_count: ids.len(),
            avg: stats::mean(&values),
            median: stats::median(&values),
            p25: stats::percentile(&values, 25.0),
            p75: stats::percentile(&values, 75.0),
        })
        .collect()
}

pub fn build_outputs(metrics: &MetricTable) -> CanonicalOutputs {
    let latest = latest_by_institution(metrics);
    let summary = summary_by_year(metrics);
    let years = metrics.years();
    let metadata = BuildMetadata {
        built_at: Utc::now(),
        source_rows: metrics.len(),
        latest_rows: latest.len(),
        summary_rows: summary.len(),
        year_range: years.first().zip(years.last()).map(|(a, b)| (*a, *b)),
    };

    let missing_sector = metrics.records().iter().filter(|r| r.sector.is_none()).count();
    if missing_sector > 0 {
        log::warn!("{missing_sector} rows missing sector metadata");
    }

    CanonicalOutputs {
        latest,
        summary,
        metadata,
    }
}

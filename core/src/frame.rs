//! Single-year joined frame: metric rows with their headcounts attached.
//!
//! Join order (fixed):
//!   1. Select the year, drop rows without a metric value.
//!   2. Left-join headcounts on (institution_id, year).
//!   3. Derive a source label where the join carried none.
//!   4. Substitute fallback headcounts for rows still missing one.
//!   5. Fill remaining gaps with 0.

use crate::{
    table::{FallbackHeadcounts, HeadcountTable, MetricTable},
    types::{InstitutionId, Year},
};
use serde::{Deserialize, Serialize};

pub const SOURCE_PRIMARY: &str = "primary";
pub const SOURCE_FALLBACK: &str = "fallback";
pub const SOURCE_MISSING: &str = "missing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRow {
    pub institution_id:   InstitutionId,
    pub year:             Year,
    pub institution_name: String,
    pub metric_value:     f64,
    /// Always present after the join; 0 when no source supplied one.
    pub headcount:        f64,
    pub headcount_source: String,
    pub source_flag:      Option<String>,
    pub is_revised:       Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedFrame {
    pub year: Year,
    pub rows: Vec<JoinedRow>,
}

impl JoinedFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row for the institution, if any.
    pub fn find(&self, institution_id: InstitutionId) -> Option<&JoinedRow> {
        self.rows.iter().find(|r| r.institution_id == institution_id)
    }
}

/// Build the joined frame for `year`.
///
/// Column presence is enforced when tables are built from untyped sources
/// (see `loader`), so this join itself cannot fail.
pub fn prepare_peer_frame(
    metrics: &MetricTable,
    headcounts: Option<&HeadcountTable>,
    year: Year,
    fallback: Option<&FallbackHeadcounts>,
) -> JoinedFrame {
    let index = headcounts
        .filter(|h| !h.is_empty())
        .map(HeadcountTable::index);

    let rows = metrics
        .for_year(year)
        .filter_map(|record| {
            let metric_value = record.metric_value.filter(|v| !v.is_nan())?;

            let (mut headcount, mut source) = match &index {
                Some(index) => match index.get(&(record.institution_id, record.year)) {
                    Some(hc) => (
                        hc.headcount.filter(|v| !v.is_nan()),
                        hc.headcount_source.clone(),
                    ),
                    None => (None, None),
                },
                None => (None, Some(SOURCE_MISSING.to_string())),
            };

            if source.is_none() {
                let label = if headcount.is_some() { SOURCE_PRIMARY } else { SOURCE_MISSING };
                source = Some(label.to_string());
            }

            if headcount.is_none() {
                if let Some(value) = fallback
                    .and_then(|f| f.get(record.institution_id))
                    .filter(|v| !v.is_nan())
                {
                    headcount = Some(value);
                    source = Some(SOURCE_FALLBACK.to_string());
                }
            }

            Some(JoinedRow {
                institution_id: record.institution_id,
                year: record.year,
                institution_name: record.institution_name.clone(),
                metric_value,
                headcount: headcount.unwrap_or(0.0),
                headcount_source: source.unwrap_or_else(|| SOURCE_MISSING.to_string()),
                source_flag: record.source_flag.clone(),
                is_revised: record.is_revised,
            })
        })
        .collect();

    JoinedFrame { year, rows }
}

/// Borrowed input tables for one engine call.
#[derive(Debug, Clone, Copy)]
pub struct PeerInputs<'a> {
    pub metrics:    &'a MetricTable,
    pub headcounts: Option<&'a HeadcountTable>,
    pub fallback:   Option<&'a FallbackHeadcounts>,
}

impl<'a> PeerInputs<'a> {
    pub fn new(metrics: &'a MetricTable) -> Self {
        Self {
            metrics,
            headcounts: None,
            fallback: None,
        }
    }

    pub fn with_headcounts(mut self, headcounts: &'a HeadcountTable) -> Self {
        self.headcounts = Some(headcounts);
        self
    }

    pub fn with_fallback(mut self, fallback: &'a FallbackHeadcounts) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn frame(&self, year: Year) -> JoinedFrame {
        prepare_peer_frame(self.metrics, self.headcounts, year, self.fallback)
    }
}

//! Long-format input tables.
//!
//! A `MetricTable` holds one canonical metric value per (institution, year).
//! A `HeadcountTable` holds the enrollment headcounts that are left-joined
//! onto it when building peer groups.

use crate::types::{InstitutionId, Year};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One row of the canonical long-format metric table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub institution_id:   InstitutionId,
    pub year:             Year,
    pub institution_name: String,
    pub metric_value:     Option<f64>,
    // Provenance pass-through, never interpreted by the engine.
    #[serde(default)]
    pub source_flag:      Option<String>,
    #[serde(default)]
    pub is_revised:       Option<bool>,
    #[serde(default)]
    pub sector:           Option<String>,
}

impl MetricRecord {
    pub fn new(
        institution_id: InstitutionId,
        year: Year,
        institution_name: impl Into<String>,
        metric_value: Option<f64>,
    ) -> Self {
        Self {
            institution_id,
            year,
            institution_name: institution_name.into(),
            metric_value,
            source_flag: None,
            is_revised: None,
            sector: None,
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }
}

/// One row of the optional headcount table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadcountRecord {
    pub institution_id:   InstitutionId,
    pub year:             Year,
    pub headcount:        Option<f64>,
    #[serde(default)]
    pub headcount_source: Option<String>,
}

impl HeadcountRecord {
    pub fn new(institution_id: InstitutionId, year: Year, headcount: Option<f64>) -> Self {
        Self {
            institution_id,
            year,
            headcount,
            headcount_source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.headcount_source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    records: Vec<MetricRecord>,
}

impl MetricTable {
    pub fn new(records: Vec<MetricRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: MetricRecord) {
        self.records.push(record);
    }

    /// Rows for a single reporting year, in table order.
    pub fn for_year(&self, year: Year) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter().filter(move |r| r.year == year)
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<Year> {
        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Mutable access for fixtures that patch a value in place.
    pub fn records_mut(&mut self) -> &mut [MetricRecord] {
        &mut self.records
    }
}

impl FromIterator<MetricRecord> for MetricTable {
    fn from_iter<I: IntoIterator<Item = MetricRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadcountTable {
    records: Vec<HeadcountRecord>,
}

impl HeadcountTable {
    pub fn new(records: Vec<HeadcountRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[HeadcountRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index by join key. On duplicate keys the first row wins, which
    /// keeps the left join one-to-one.
    pub fn index(&self) -> HashMap<(InstitutionId, Year), &HeadcountRecord> {
        let mut index = HashMap::with_capacity(self.records.len());
        for record in &self.records {
            index
                .entry((record.institution_id, record.year))
                .or_insert(record);
        }
        index
    }
}

impl FromIterator<HeadcountRecord> for HeadcountTable {
    fn from_iter<I: IntoIterator<Item = HeadcountRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Fallback headcounts keyed by institution (e.g. fall undergraduate
/// enrollment), used when the primary headcount is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackHeadcounts {
    values: HashMap<InstitutionId, f64>,
}

impl FallbackHeadcounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, institution_id: InstitutionId, headcount: f64) {
        self.values.insert(institution_id, headcount);
    }

    pub fn get(&self, institution_id: InstitutionId) -> Option<f64> {
        self.values.get(&institution_id).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(InstitutionId, f64)> for FallbackHeadcounts {
    fn from_iter<I: IntoIterator<Item = (InstitutionId, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

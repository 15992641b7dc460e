//! Deterministic mock dataset for development and tests.
//!
//! Produces a canonical metric table, a headcount table and a fallback
//! headcount map with realistic shapes: right-skewed enrollment, bounded
//! 0–100 rates loosely correlated with size, and a small share of missing
//! cells so the join's fallback and missing paths get exercised.
//! Same seed = same tables.

use crate::{
    rng::{MockStream, SeededRng},
    table::{FallbackHeadcounts, HeadcountRecord, HeadcountTable, MetricRecord, MetricTable},
    types::{InstitutionId, Year},
};

pub const FIRST_INSTITUTION_ID: InstitutionId = 100_000;
pub const MOCK_HEADCOUNT_SOURCE: &str = "FT_UG_12M";

const MISSING_HEADCOUNT_RATE: f64 = 0.06;
const FALLBACK_AVAILABLE_RATE: f64 = 0.70;
const MISSING_METRIC_RATE: f64 = 0.02;

const KNOWN_NAMES: &[&str] = &[
    "Harvard University",
    "Stanford University",
    "MIT",
    "UCLA",
    "UC Berkeley",
    "Community College Example",
    "For-Profit College Example",
];

const SECTORS: &[&str] = &[
    "Public, 4-year or above",
    "Private nonprofit, 4-year or above",
    "Private for-profit, 4-year or above",
    "Public, 2-year",
    "Private nonprofit, 2-year",
    "Private for-profit, 2-year",
];

#[derive(Debug, Clone)]
pub struct MockDataset {
    pub metrics:    MetricTable,
    pub headcounts: HeadcountTable,
    pub fallback:   FallbackHeadcounts,
}

struct MockInstitution {
    id:        InstitutionId,
    name:      String,
    sector:    &'static str,
    headcount: f64,
    quality:   f64,
}

impl MockDataset {
    pub fn generate(seed: u64, n_institutions: usize, years: &[Year]) -> Self {
        let mut inst_rng = SeededRng::for_stream(seed, MockStream::Institutions);
        let mut hc_rng = SeededRng::for_stream(seed, MockStream::Headcounts);
        let mut metric_rng = SeededRng::for_stream(seed, MockStream::Metrics);
        let mut missing_rng = SeededRng::for_stream(seed, MockStream::Missingness);

        let institutions: Vec<MockInstitution> = (0..n_institutions)
            .map(|i| {
                let name = KNOWN_NAMES
                    .get(i)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("Institution {i:04}"));
                let sector = SECTORS[inst_rng.next_u64_below(SECTORS.len() as u64) as usize];
                // Median ~1,800 full-time undergrads, long right tail.
                let headcount = hc_rng.log_normal(7.5, 1.2).round().max(10.0);
                let quality = metric_rng.normal(0.0, 1.0);
                MockInstitution {
                    id: FIRST_INSTITUTION_ID + i as InstitutionId,
                    name,
                    sector,
                    headcount,
                    quality,
                }
            })
            .collect();

        let mut metrics = Vec::with_capacity(n_institutions * years.len());
        let mut headcounts = Vec::with_capacity(n_institutions * years.len());
        let mut fallback = FallbackHeadcounts::new();

        for inst in &institutions {
            if missing_rng.chance(FALLBACK_AVAILABLE_RATE) {
                // Fall enrollment runs a little above the 12-month FT count.
                fallback.insert(inst.id, (inst.headcount * 1.1).round());
            }

            for (offset, &year) in years.iter().enumerate() {
                let size_effect = 4.0 * (inst.headcount.ln() - 7.5);
                let drift = offset as f64 * 0.4;
                let rate = (55.0 + 15.0 * inst.quality + size_effect + drift
                    + metric_rng.normal(0.0, 3.0))
                .clamp(0.0, 100.0);
                let metric_value = (!missing_rng.chance(MISSING_METRIC_RATE))
                    .then(|| (rate * 10.0).round() / 10.0);

                let mut record = MetricRecord::new(inst.id, year, inst.name.clone(), metric_value)
                    .with_sector(inst.sector);
                record.source_flag = Some("DRVGR".to_string());
                record.is_revised = Some(false);
                metrics.push(record);

                let yearly = (inst.headcount * (1.0 + hc_rng.normal(0.0, 0.03))).round().max(0.0);
                let headcount = if missing_rng.chance(MISSING_HEADCOUNT_RATE) {
                    HeadcountRecord::new(inst.id, year, None)
                } else {
                    HeadcountRecord::new(inst.id, year, Some(yearly)).with_source(MOCK_HEADCOUNT_SOURCE)
                };
                headcounts.push(headcount);
            }
        }

        log::info!(
            "mock: generated {} institutions x {} years (seed={seed})",
            n_institutions,
            years.len()
        );

        Self {
            metrics: MetricTable::new(metrics),
            headcounts: HeadcountTable::new(headcounts),
            fallback,
        }
    }
}

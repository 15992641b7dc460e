//! The peer engine: a configuration-owning facade over the statistics.
//!
//! RULES:
//!   - The engine never caches or persists. Every call joins, filters and
//!     scores from the tables it is handed.
//!   - Threshold tiers and winsorization percentiles come from PeerConfig,
//!     never from global state.
//!   - The engine is immutable after construction and may be shared
//!     across threads.

use crate::{
    anchor::{summarize_anchor, AnchorQuery, AnchorReport},
    config::PeerConfig,
    error::PeerResult,
    frame::{JoinedFrame, PeerInputs},
    peer::{compute_peer_distribution, PeerDistribution, PeerQuery},
    stats::{self, Winsorized},
    threshold::ThresholdTable,
    types::Year,
};

#[derive(Debug, Clone)]
pub struct PeerEngine {
    config: PeerConfig,
}

impl PeerEngine {
    pub fn new(config: PeerConfig) -> PeerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine with the four standard tiers and 1st/99th percentile bounds.
    pub fn standard() -> Self {
        Self {
            config: PeerConfig::default(),
        }
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.config.thresholds
    }

    pub fn prepare_peer_frame(&self, inputs: &PeerInputs<'_>, year: Year) -> JoinedFrame {
        inputs.frame(year)
    }

    /// Winsorize with the configured percentiles.
    pub fn winsorize(&self, values: &[Option<f64>]) -> Winsorized {
        stats::winsorize(
            values,
            self.config.winsorize.lower_pct,
            self.config.winsorize.upper_pct,
        )
    }

    pub fn compute_peer_distribution(
        &self,
        inputs: &PeerInputs<'_>,
        query: &PeerQuery,
    ) -> PeerResult<PeerDistribution> {
        compute_peer_distribution(inputs, &self.config.thresholds, query, self.config.winsorize)
    }

    pub fn summarize_anchor(
        &self,
        inputs: &PeerInputs<'_>,
        query: &AnchorQuery,
    ) -> PeerResult<AnchorReport> {
        let report = summarize_anchor(inputs, &self.config.thresholds, query, self.config.winsorize)?;
        log::debug!(
            "anchor={} year={} in_peer_group={} z={:?} z_robust={:?} pct={:?}",
            report.summary.institution_id,
            report.summary.year,
            report.summary.in_peer_group,
            report.summary.z_score,
            report.summary.z_score_robust,
            report.summary.percentile,
        );
        Ok(report)
    }
}

impl Default for PeerEngine {
    fn default() -> Self {
        Self::standard()
    }
}

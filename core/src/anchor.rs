//! Anchor summary: one institution placed against its peer distribution.
//!
//! The anchor is scored whether or not it clears the tier itself;
//! `in_peer_group` only reports whether it would.

use crate::{
    error::{PeerError, PeerResult},
    frame::PeerInputs,
    peer::{distribution_from_frame, PeerGroup, PeerQuery, PeerStats, WinsorPercentiles},
    stats,
    threshold::ThresholdTable,
    types::{InstitutionId, Year},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorQuery {
    pub institution_id:  InstitutionId,
    pub year:            Year,
    pub threshold_label: String,
    pub robust:          bool,
    pub winsorize:       bool,
}

impl AnchorQuery {
    pub fn new(institution_id: InstitutionId, year: Year, threshold_label: impl Into<String>) -> Self {
        Self {
            institution_id,
            year,
            threshold_label: threshold_label.into(),
            robust: false,
            winsorize: false,
        }
    }

    pub fn robust(mut self, robust: bool) -> Self {
        self.robust = robust;
        self
    }

    pub fn winsorized(mut self, winsorize: bool) -> Self {
        self.winsorize = winsorize;
        self
    }

    pub fn peer_query(&self) -> PeerQuery {
        PeerQuery::new(self.year, self.threshold_label.clone()).winsorized(self.winsorize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSummary {
    pub institution_id:   InstitutionId,
    pub institution_name: String,
    pub year:             Year,
    /// Raw value, never winsorized.
    pub metric_value:     Option<f64>,
    pub headcount:        Option<f64>,
    pub z_score:          Option<f64>,
    pub z_score_robust:   Option<f64>,
    pub percentile:       Option<f64>,
    pub in_peer_group:    bool,
    pub headcount_source: Option<String>,
}

impl AnchorSummary {
    /// The score a caller asked for.
    pub fn active_score(&self, robust: bool) -> Option<f64> {
        if robust { self.z_score_robust } else { self.z_score }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorReport {
    pub summary: AnchorSummary,
    pub stats:   PeerStats,
    /// Peer rows with `z_score_active` filled in.
    pub group:   PeerGroup,
    /// Anchor value actually scored (clipped when winsorizing).
    pub scored_value: f64,
}

pub fn summarize_anchor(
    inputs: &PeerInputs<'_>,
    thresholds: &ThresholdTable,
    query: &AnchorQuery,
    percentiles: WinsorPercentiles,
) -> PeerResult<AnchorReport> {
    let frame = inputs.frame(query.year);
    let anchor = frame
        .find(query.institution_id)
        .ok_or(PeerError::InstitutionNotFound {
            institution_id: query.institution_id,
            year: query.year,
        })?
        .clone();

    let distribution = distribution_from_frame(&frame, thresholds, &query.peer_query(), percentiles)?;
    let peer_stats = distribution.stats;
    let mut group = distribution.group;

    let in_peer_group = anchor.headcount >= peer_stats.min_headcount as f64;

    let raw_value = anchor.metric_value;
    let scored_value = match distribution.bounds {
        Some(bounds) if query.winsorize => bounds.clip(raw_value),
        _ => raw_value,
    };

    let summary = AnchorSummary {
        institution_id: anchor.institution_id,
        institution_name: anchor.institution_name,
        year: query.year,
        metric_value: Some(raw_value),
        headcount: Some(anchor.headcount),
        z_score: peer_stats.z_score(scored_value),
        z_score_robust: peer_stats.robust_z_score(scored_value),
        // Strict "percent below" over raw peer values. Peers themselves use
        // tie-averaged ranks, so the two can disagree for an in-group anchor.
        percentile: stats::percent_below(&group.metric_values(), raw_value),
        in_peer_group,
        headcount_source: Some(anchor.headcount_source),
    };

    group.activate(query.robust);

    Ok(AnchorReport {
        summary,
        stats: peer_stats,
        group,
        scored_value,
    })
}

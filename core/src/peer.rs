//! Peer distribution: one reporting year, one headcount tier.
//!
//! Z-scores are computed on the (optionally winsorized) calc value.
//! Percentiles always use the raw metric value.

use crate::{
    error::{PeerError, PeerResult},
    frame::{JoinedFrame, JoinedRow, PeerInputs},
    stats::{self, Dispersion, WinsorBounds, DEFAULT_LOWER_PCT, DEFAULT_UPPER_PCT},
    threshold::ThresholdTable,
    types::{InstitutionId, Year},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRow {
    pub institution_id:   InstitutionId,
    pub year:             Year,
    pub institution_name: String,
    pub metric_value:     f64,
    pub headcount:        f64,
    pub headcount_source: String,
    pub source_flag:      Option<String>,
    pub is_revised:       Option<bool>,
    pub z_score:          Option<f64>,
    pub z_score_robust:   Option<f64>,
    pub percentile:       f64,
    /// Set by anchor summaries to whichever score mode was requested.
    pub z_score_active:   Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerGroup {
    pub rows: Vec<PeerRow>,
}

impl PeerGroup {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw metric values in row order.
    pub fn metric_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.metric_value).collect()
    }

    pub fn find(&self, institution_id: InstitutionId) -> Option<&PeerRow> {
        self.rows.iter().find(|r| r.institution_id == institution_id)
    }

    /// Fill `z_score_active` with the robust or classical score.
    pub fn activate(&mut self, robust: bool) {
        for row in &mut self.rows {
            row.z_score_active = if robust { row.z_score_robust } else { row.z_score };
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStats {
    pub year:            Year,
    pub threshold_label: String,
    pub min_headcount:   u32,
    pub peer_count:      usize,
    pub mean:            f64,
    pub std:             f64,
    pub median:          f64,
    pub mad:             f64,
    pub winsorized:      bool,
}

impl PeerStats {
    pub fn z_score(&self, value: f64) -> Option<f64> {
        stats::z_score(value, self.mean, self.std)
    }

    pub fn robust_z_score(&self, value: f64) -> Option<f64> {
        stats::robust_z_score(value, self.median, self.mad)
    }
}

/// Lower/upper percentiles used when winsorizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinsorPercentiles {
    pub lower_pct: f64,
    pub upper_pct: f64,
}

impl Default for WinsorPercentiles {
    fn default() -> Self {
        Self {
            lower_pct: DEFAULT_LOWER_PCT,
            upper_pct: DEFAULT_UPPER_PCT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerQuery {
    pub year:            Year,
    pub threshold_label: String,
    pub winsorize:       bool,
}

impl PeerQuery {
    pub fn new(year: Year, threshold_label: impl Into<String>) -> Self {
        Self {
            year,
            threshold_label: threshold_label.into(),
            winsorize: false,
        }
    }

    pub fn winsorized(mut self, winsorize: bool) -> Self {
        self.winsorize = winsorize;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDistribution {
    pub group:  PeerGroup,
    pub stats:  PeerStats,
    /// Present only when winsorization ran over at least one value.
    pub bounds: Option<WinsorBounds>,
}

/// Build the peer group for `query` from an already-joined frame.
pub fn distribution_from_frame(
    frame: &JoinedFrame,
    thresholds: &ThresholdTable,
    query: &PeerQuery,
    percentiles: WinsorPercentiles,
) -> PeerResult<PeerDistribution> {
    let tier = thresholds.resolve(&query.threshold_label)?;

    let peers: Vec<&JoinedRow> = frame
        .rows
        .iter()
        .filter(|r| tier.admits(r.headcount))
        .collect();

    if peers.is_empty() {
        return Err(PeerError::EmptyPeerGroup {
            year: query.year,
            threshold_label: tier.label.clone(),
            min_headcount: tier.min_headcount,
        });
    }

    let raw: Vec<f64> = peers.iter().map(|r| r.metric_value).collect();

    let (calc, bounds) = if query.winsorize {
        let w = stats::winsorize(
            &raw.iter().copied().map(Some).collect::<Vec<_>>(),
            percentiles.lower_pct,
            percentiles.upper_pct,
        );
        // Peer values are never missing, so every slot is filled.
        let calc: Vec<f64> = w
            .values
            .iter()
            .zip(&raw)
            .map(|(c, r)| c.unwrap_or(*r))
            .collect();
        (calc, w.bounds)
    } else {
        (raw.clone(), None)
    };

    let dispersion = Dispersion::of(&calc).ok_or_else(|| PeerError::EmptyPeerGroup {
        year: query.year,
        threshold_label: tier.label.clone(),
        min_headcount: tier.min_headcount,
    })?;
    let percentile = stats::average_rank_pct(&raw);

    let rows = peers
        .iter()
        .zip(calc.iter().zip(percentile))
        .map(|(row, (calc_value, percentile))| PeerRow {
            institution_id: row.institution_id,
            year: row.year,
            institution_name: row.institution_name.clone(),
            metric_value: row.metric_value,
            headcount: row.headcount,
            headcount_source: row.headcount_source.clone(),
            source_flag: row.source_flag.clone(),
            is_revised: row.is_revised,
            z_score: dispersion.z_score(*calc_value),
            z_score_robust: dispersion.robust_z_score(*calc_value),
            percentile,
            z_score_active: None,
        })
        .collect();

    let stats = PeerStats {
        year: query.year,
        threshold_label: tier.label.clone(),
        min_headcount: tier.min_headcount,
        peer_count: peers.len(),
        mean: dispersion.mean,
        std: dispersion.std,
        median: dispersion.median,
        mad: dispersion.mad,
        winsorized: query.winsorize,
    };

    log::debug!(
        "year={} tier='{}' peers={} mean={:.3} std={:.3} median={:.3} mad={:.3} winsorized={}",
        stats.year,
        stats.threshold_label,
        stats.peer_count,
        stats.mean,
        stats.std,
        stats.median,
        stats.mad,
        stats.winsorized,
    );

    Ok(PeerDistribution {
        group: PeerGroup { rows },
        stats,
        bounds,
    })
}

/// Join the inputs for `query.year`, filter by tier and score every peer.
pub fn compute_peer_distribution(
    inputs: &PeerInputs<'_>,
    thresholds: &ThresholdTable,
    query: &PeerQuery,
    percentiles: WinsorPercentiles,
) -> PeerResult<PeerDistribution> {
    // Resolve first so an unknown label fails before any join work.
    thresholds.resolve(&query.threshold_label)?;
    let frame = inputs.frame(query.year);
    distribution_from_frame(&frame, thresholds, query, percentiles)
}

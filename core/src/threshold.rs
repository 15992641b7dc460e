//! Headcount threshold tiers used to build peer groups.
//!
//! The tiers are an explicit, immutable configuration value. The engine
//! owns one `ThresholdTable`; nothing reads tiers from global state.

use crate::error::{PeerError, PeerResult};
use serde::{Deserialize, Serialize};

pub const ALL_INSTITUTIONS: &str = "All institutions";
pub const MORE_THAN_1K: &str = "More than 1,000 full-time undergrads";
pub const MORE_THAN_5K: &str = "More than 5,000 full-time undergrads";
pub const MORE_THAN_10K: &str = "More than 10,000 full-time undergrads";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadcountThreshold {
    pub label:         String,
    pub min_headcount: u32,
}

impl HeadcountThreshold {
    pub fn new(label: impl Into<String>, min_headcount: u32) -> Self {
        Self {
            label: label.into(),
            min_headcount,
        }
    }

    /// Whether a joined headcount clears this tier.
    pub fn admits(&self, headcount: f64) -> bool {
        headcount >= self.min_headcount as f64
    }
}

/// Ordered list of tiers, lowest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable {
    tiers: Vec<HeadcountThreshold>,
}

impl ThresholdTable {
    pub fn new(tiers: Vec<HeadcountThreshold>) -> PeerResult<Self> {
        if tiers.is_empty() {
            return Err(PeerError::Config("threshold table has no tiers".into()));
        }
        for (i, tier) in tiers.iter().enumerate() {
            if tiers[..i].iter().any(|t| t.label == tier.label) {
                return Err(PeerError::Config(format!(
                    "duplicate threshold label '{}'",
                    tier.label
                )));
            }
        }
        Ok(Self { tiers })
    }

    /// The four fixed full-time undergraduate tiers.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                HeadcountThreshold::new(ALL_INSTITUTIONS, 0),
                HeadcountThreshold::new(MORE_THAN_1K, 1_000),
                HeadcountThreshold::new(MORE_THAN_5K, 5_000),
                HeadcountThreshold::new(MORE_THAN_10K, 10_000),
            ],
        }
    }

    pub fn resolve(&self, label: &str) -> PeerResult<&HeadcountThreshold> {
        self.tiers
            .iter()
            .find(|t| t.label == label)
            .ok_or_else(|| PeerError::UnknownThreshold {
                label: label.to_string(),
            })
    }

    pub fn tiers(&self) -> &[HeadcountThreshold] {
        &self.tiers
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|t| t.label.as_str())
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::standard()
    }
}

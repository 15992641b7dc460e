use crate::{
    error::{PeerError, PeerResult},
    peer::WinsorPercentiles,
    threshold::{HeadcountThreshold, ThresholdTable},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_METRIC_COLUMN: &str = "metric_value";

/// Internal file shape for peer_config.json. Every field is optional so a
/// file may override only what it needs.
#[derive(Debug, Clone, Deserialize)]
struct PeerConfigFile {
    #[serde(default)]
    thresholds: Option<Vec<HeadcountThreshold>>,
    #[serde(default)]
    winsorize: Option<WinsorPercentiles>,
    #[serde(default)]
    metric_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerConfig {
    pub thresholds:    ThresholdTable,
    pub winsorize:     WinsorPercentiles,
    /// Header of the metric value column in canonical CSV extracts.
    pub metric_column: String,
}

impl PeerConfig {
    /// Load from a JSON file.
    /// In tests, use PeerConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))
    }

    pub fn from_json(content: &str) -> PeerResult<Self> {
        let file: PeerConfigFile = serde_json::from_str(content)?;
        let defaults = Self::default();
        let thresholds = match file.thresholds {
            Some(tiers) => ThresholdTable::new(tiers)?,
            None => defaults.thresholds,
        };
        let config = Self {
            thresholds,
            winsorize: file.winsorize.unwrap_or(defaults.winsorize),
            metric_column: file.metric_column.unwrap_or(defaults.metric_column),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject percentiles outside 0 <= lower <= upper <= 100.
    pub fn validate(&self) -> PeerResult<()> {
        let WinsorPercentiles { lower_pct, upper_pct } = self.winsorize;
        let in_range = |p: f64| (0.0..=100.0).contains(&p);
        if !in_range(lower_pct) || !in_range(upper_pct) || lower_pct > upper_pct {
            return Err(PeerError::Config(format!(
                "winsorize percentiles must satisfy 0 <= lower <= upper <= 100 (got {lower_pct}, {upper_pct})"
            )));
        }
        if self.metric_column.trim().is_empty() {
            return Err(PeerError::Config("metric_column must not be empty".into()));
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self::default()
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdTable::standard(),
            winsorize: WinsorPercentiles::default(),
            metric_column: DEFAULT_METRIC_COLUMN.to_string(),
        }
    }
}

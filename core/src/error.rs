use crate::types::{InstitutionId, Year};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeerError {
    #[error("Table '{table}' is missing required column '{column}'")]
    Schema { table: String, column: String },

    #[error("Unknown threshold '{label}'")]
    UnknownThreshold { label: String },

    #[error("No peers available for year {year} after applying '{threshold_label}' (min headcount {min_headcount})")]
    EmptyPeerGroup {
        year: Year,
        threshold_label: String,
        min_headcount: u32,
    },

    #[error("Institution {institution_id} missing from canonical data for year {year}")]
    InstitutionNotFound { institution_id: InstitutionId, year: Year },

    #[error("Failed to load {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PeerError {
    pub fn schema(table: &str, column: &str) -> Self {
        Self::Schema {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

pub type PeerResult<T> = Result<T, PeerError>;

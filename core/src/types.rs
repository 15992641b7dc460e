//! Shared primitive types used across the engine and its collaborators.

/// Stable institution identifier (IPEDS UNITID), unique across years.
pub type InstitutionId = i64;

/// Cohort / reporting year.
pub type Year = i32;

/// Identifier of one import batch recorded in the store.
pub type ImportId = String;

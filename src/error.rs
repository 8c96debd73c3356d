//! Error taxonomy shared by every stage of the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the effective-area pipeline.
///
/// None of these are retried or downgraded to defaults; the first one
/// raised aborts the whole computation.
#[derive(Debug, Error)]
pub enum AeffError {
    /// Bad selection/purity name, non-numeric declination, missing unit.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Valid request, but the table for this combination is not provisioned.
    #[error(
        "Effective area for selection '{selection}' at a declination of {declination_deg} deg \
         (bucket '{bucket}') has not yet been added"
    )]
    Unimplemented {
        selection: &'static str,
        bucket: &'static str,
        declination_deg: f64,
    },

    /// Normalisation energy outside the open domain of the energy PDF.
    #[error(
        "Normalisation energy of {energy_gev:.3e} GeV lies outside the energy range of \
         {e_min:.2e} GeV - {e_max:.2e} GeV for which the energy PDF is defined"
    )]
    OutOfRange {
        energy_gev: f64,
        e_min: f64,
        e_max: f64,
    },

    /// Quantity carries a unit, but of the wrong physical dimension.
    #[error("Unit mismatch: expected {expected}, found {found}")]
    UnitMismatch { expected: String, found: String },

    #[error("Failed to read effective area table {path}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, AeffError>;

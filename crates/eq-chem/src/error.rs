//! Chemical state and system errors.

use eq_core::EqError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for chemical state operations.
pub type ChemResult<T> = Result<T, ChemError>;

/// Errors raised while building or mutating chemical systems and states.
#[derive(Error, Debug)]
pub enum ChemError {
    /// Species name not present in the table or system.
    #[error("Unknown species: {name}")]
    UnknownSpecies { name: String },

    /// Element symbol not present in the system.
    #[error("Unknown element: {symbol}")]
    UnknownElement { symbol: String },

    /// Negative or non-finite species amount.
    #[error("Invalid amount for species {name}: {amount} mol")]
    InvalidAmount { name: String, amount: f64 },

    /// Species registered twice.
    #[error("Duplicate species: {name}")]
    DuplicateSpecies { name: String },

    /// Phase registered twice.
    #[error("Duplicate phase: {name}")]
    DuplicatePhase { name: String },

    /// Unparseable chemical formula.
    #[error("Invalid formula {formula:?}: {reason}")]
    Formula {
        formula: String,
        reason: &'static str,
    },

    /// Non-physical values (non-positive temperature, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// Report could not be written.
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] EqError),
}

impl ChemError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ChemError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

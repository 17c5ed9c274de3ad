//! Error types for equilibrium calculations.

use eq_chem::ChemError;
use thiserror::Error;

/// Errors that can occur while equilibrating a chemical state.
#[derive(Error, Debug)]
pub enum SolverError {
    /// Iteration budget exhausted, or a Newton step could not be taken
    /// (singular KKT matrix, non-finite potentials or iterates).
    #[error("Convergence failure after {iterations} iterations (residual = {residual:e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },

    #[error("Infeasible constraints: {what}")]
    InfeasibleConstraints { what: String },

    #[error("Invalid options: {what}")]
    InvalidOptions { what: String },

    #[error("Worker error: {what}")]
    Worker { what: String },

    #[error("Chemical state error: {0}")]
    Chem(#[from] ChemError),
}

pub type SolverResult<T> = Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convergence_failure_reports_context() {
        let err = SolverError::ConvergenceFailure {
            iterations: 200,
            residual: 3.5e-4,
        };
        let msg = err.to_string();
        assert!(msg.contains("200"));
        assert!(msg.contains("3.5e-4"));
    }

    #[test]
    fn chem_errors_convert() {
        let err: SolverError = ChemError::UnknownSpecies {
            name: "X".to_string(),
        }
        .into();
        assert!(matches!(err, SolverError::Chem(ChemError::UnknownSpecies { .. })));
    }
}

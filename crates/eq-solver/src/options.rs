//! Equilibrium solver configuration.

use crate::error::{SolverError, SolverResult};

/// How the Hessian of the chemical potentials is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HessianMode {
    /// Use the model's analytic Hessian.
    Analytic,
    /// Forward differences of the chemical potentials with relative step `epsilon`.
    FiniteDifference { epsilon: f64 },
}

/// Interior-point Gibbs minimisation options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquilibriumOptions {
    /// Maximum Newton iterations
    pub max_iterations: usize,
    /// Convergence tolerance on the optimality (μ/RT units), relative
    /// feasibility and relative complementarity residuals
    pub tolerance: f64,
    /// Barrier parameter: amounts of species that are absent at equilibrium
    /// settle near `barrier / (driving force)`
    pub barrier: f64,
    /// Fraction of the distance to the bound n = 0 a step may cover
    pub step_fraction: f64,
    /// Lower bound applied to initial amounts so the iteration starts in the interior
    pub amount_floor: f64,
    pub hessian: HessianMode,
}

impl Default for EquilibriumOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-9,
            barrier: 1e-14,
            step_fraction: 0.99,
            amount_floor: 1e-10,
            hessian: HessianMode::Analytic,
        }
    }
}

impl EquilibriumOptions {
    pub fn validate(&self) -> SolverResult<()> {
        let invalid = |what: &str| {
            Err(SolverError::InvalidOptions {
                what: what.to_string(),
            })
        };
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1");
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return invalid("tolerance must be positive");
        }
        if !(self.barrier.is_finite() && self.barrier > 0.0) {
            return invalid("barrier must be positive");
        }
        if !(self.step_fraction > 0.0 && self.step_fraction < 1.0) {
            return invalid("step_fraction must lie in (0, 1)");
        }
        if !(self.amount_floor.is_finite() && self.amount_floor > 0.0) {
            return invalid("amount_floor must be positive");
        }
        if let HessianMode::FiniteDifference { epsilon } = self.hessian
            && !(epsilon.is_finite() && epsilon > 0.0)
        {
            return invalid("finite-difference epsilon must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EquilibriumOptions::default().validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut opts = EquilibriumOptions::default();
        opts.step_fraction = 1.0;
        assert!(opts.validate().is_err());

        let mut opts = EquilibriumOptions::default();
        opts.barrier = 0.0;
        assert!(opts.validate().is_err());

        let mut opts = EquilibriumOptions::default();
        opts.hessian = HessianMode::FiniteDifference { epsilon: -1.0 };
        assert!(opts.validate().is_err());

        let mut opts = EquilibriumOptions::default();
        opts.max_iterations = 0;
        assert!(opts.validate().is_err());
    }
}

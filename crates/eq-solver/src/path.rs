//! Equilibrium states along a line between two states.

use crate::equilibrium::{EquilibriumResult, EquilibriumSolver};
use crate::error::{SolverError, SolverResult};
use eq_chem::ChemicalState;
use eq_core::units::{k, pa};
use tracing::debug;

/// One converged point of an [`EquilibriumPath`].
#[derive(Debug, Clone)]
pub struct PathPoint {
    /// Path parameter in [0, 1]
    pub t: f64,
    pub result: EquilibriumResult,
}

/// Equilibrates along the straight line between the element amounts,
/// temperatures and pressures of two states.
///
/// Every point is warm-started from the previous one.
#[derive(Debug, Clone)]
pub struct EquilibriumPath {
    solver: EquilibriumSolver,
}

impl EquilibriumPath {
    pub fn new(solver: EquilibriumSolver) -> Self {
        Self { solver }
    }

    /// Solve at `steps + 1` evenly spaced parameters from `start` (t = 0) to
    /// `end` (t = 1). The result states use the species layout of `start`.
    pub fn solve(
        &self,
        start: &ChemicalState,
        end: &ChemicalState,
        steps: usize,
    ) -> SolverResult<Vec<PathPoint>> {
        if steps == 0 {
            return Err(SolverError::InvalidOptions {
                what: "path needs at least one step".to_string(),
            });
        }
        let system = self.solver.system();
        let b0 = system.element_amounts(start)?;
        let b1 = system.element_amounts(end)?;
        let (t0, t1) = (start.temperature().value, end.temperature().value);
        let (p0, p1) = (start.pressure().value, end.pressure().value);

        let first = self.solver.equilibrate(start)?;
        let mut points = Vec::with_capacity(steps + 1);
        points.push(PathPoint { t: 0.0, result: first });

        for i in 1..=steps {
            let s = i as f64 / steps as f64;
            let b = &b0 + (&b1 - &b0) * s;
            let warm = points.last().map(|pt| &pt.result.optimum);
            let result = self.solver.equilibrate_with_element_amounts(
                start,
                k(t0 + (t1 - t0) * s),
                pa(p0 + (p1 - p0) * s),
                &b,
                warm,
            )?;
            debug!(
                target: "equilibria::path",
                step = i,
                iterations = result.iterations,
                "path point converged"
            );
            points.push(PathPoint { t: s, result });
        }
        Ok(points)
    }
}

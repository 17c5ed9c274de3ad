//! Primal-dual point of the Gibbs minimisation problem.

use nalgebra::DVector;

/// Primal and dual variables of an equilibrium calculation.
///
/// Vectors are indexed over the species and element rows that take part in
/// the minimisation (see [`GibbsProblem`](crate::GibbsProblem)).
#[derive(Debug, Clone, PartialEq)]
pub struct OptimumState {
    /// Species amounts [mol]
    pub n: DVector<f64>,
    /// Element potentials (Lagrange multipliers of mass balance), μ/RT units
    pub y: DVector<f64>,
    /// Multipliers of the bounds n ≥ 0
    pub z: DVector<f64>,
}

impl OptimumState {
    /// Interior starting point: amounts floored, y = 0, z = barrier / n.
    pub fn initial(n: &DVector<f64>, num_constraints: usize, floor: f64, barrier: f64) -> Self {
        let n = n.map(|v| v.max(floor));
        let z = n.map(|v| barrier / v);
        Self {
            n,
            y: DVector::zeros(num_constraints),
            z,
        }
    }

    /// True if the dual vectors fit a problem of the given dimensions.
    pub fn fits(&self, num_species: usize, num_constraints: usize) -> bool {
        self.n.len() == num_species && self.z.len() == num_species && self.y.len() == num_constraints
    }
}

//! Interior-point Newton solver for Gibbs energy minimisation.
//!
//! Solves
//!
//! ```text
//! min G(n)   subject to   A n = b,  n ≥ 0
//! ```
//!
//! with a primal-dual Newton iteration on the perturbed KKT conditions
//!
//! ```text
//! ∇G(n) - Aᵀy - z = 0
//! A n - b         = 0
//! nᵢ zᵢ           = barrier
//! ```
//!
//! Steps keep n and z strictly positive (fraction-to-boundary rule).

use crate::error::{SolverError, SolverResult};
use crate::optimum::OptimumState;
use crate::options::EquilibriumOptions;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Newton iteration result.
#[derive(Debug)]
pub struct NewtonResult {
    /// Primal-dual solution
    pub optimum: OptimumState,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Residual norms of the perturbed KKT conditions.
///
/// Feasibility is relative to the largest element amount and
/// complementarity relative to the barrier parameter.
#[derive(Debug, Clone, Copy)]
pub struct KktResidual {
    pub optimality: f64,
    pub feasibility: f64,
    pub complementarity: f64,
}

impl KktResidual {
    pub fn norm(&self) -> f64 {
        self.optimality.max(self.feasibility).max(self.complementarity)
    }
}

/// Evaluate the KKT residual at `x`; `gradient` is ∇G(n)/RT.
pub fn kkt_residual(
    x: &OptimumState,
    gradient: &DVector<f64>,
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    barrier: f64,
) -> KktResidual {
    let optimality = (gradient - a.tr_mul(&x.y) - &x.z).amax();
    let feasibility = if b.is_empty() {
        0.0
    } else {
        (a * &x.n - b).amax() / b.amax().max(f64::MIN_POSITIVE)
    };
    let complementarity = x
        .n
        .iter()
        .zip(x.z.iter())
        .map(|(ni, zi)| (ni * zi / barrier - 1.0).abs())
        .fold(0.0, f64::max);
    KktResidual {
        optimality,
        feasibility,
        complementarity,
    }
}

/// Largest α ≤ 1 with x + α dx ≥ (1 - fraction) x.
fn step_to_boundary(x: &DVector<f64>, dx: &DVector<f64>, fraction: f64) -> f64 {
    x.iter()
        .zip(dx.iter())
        .filter(|(_, d)| **d < 0.0)
        .map(|(xi, di)| -fraction * xi / di)
        .fold(1.0, f64::min)
}

/// Interior-point Newton solver.
///
/// `evaluate` returns the gradient ∇G(n)/RT (the normalized chemical
/// potentials) and its Hessian at the given amounts.
pub fn ip_newton_solve<F>(
    x0: OptimumState,
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    evaluate: F,
    config: &EquilibriumOptions,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<(DVector<f64>, DMatrix<f64>)>,
{
    let ns = x0.n.len();
    let m = b.len();
    if a.nrows() != m || a.ncols() != ns || !x0.fits(ns, m) {
        return Err(SolverError::InfeasibleConstraints {
            what: format!(
                "constraint matrix is {}x{}, expected {m}x{ns}",
                a.nrows(),
                a.ncols()
            ),
        });
    }
    if x0.n.iter().chain(x0.z.iter()).any(|v| !(v.is_finite() && *v > 0.0)) {
        return Err(SolverError::InfeasibleConstraints {
            what: "starting point is not strictly interior".to_string(),
        });
    }

    let mu = config.barrier;
    let mut x = x0;
    let mut residual_norm = f64::INFINITY;

    for iter in 0..config.max_iterations {
        let (gradient, hessian) = evaluate(&x.n)?;

        // Check convergence
        let residual = kkt_residual(&x, &gradient, a, b, mu);
        residual_norm = residual.norm();
        if !residual_norm.is_finite() || gradient.iter().any(|g| !g.is_finite()) {
            return Err(breakdown("non-finite residual", iter, residual_norm));
        }
        if residual_norm < config.tolerance {
            return Ok(NewtonResult {
                optimum: x,
                residual_norm,
                iterations: iter,
            });
        }

        // Assemble [H + Z/N, -Aᵀ; A, 0] [dn; y_step] = [-(∇G - Aᵀy - μ/n); b - A n]
        let dim = ns + m;
        let mut kkt = DMatrix::zeros(dim, dim);
        kkt.view_mut((0, 0), (ns, ns)).copy_from(&hessian);
        for i in 0..ns {
            kkt[(i, i)] += x.z[i] / x.n[i];
        }
        kkt.view_mut((0, ns), (ns, m)).copy_from(&(-a.transpose()));
        kkt.view_mut((ns, 0), (m, ns)).copy_from(a);

        let mut rhs = DVector::zeros(dim);
        let barrier_grad = x.n.map(|ni| mu / ni);
        rhs.rows_mut(0, ns)
            .copy_from(&(-(gradient - a.tr_mul(&x.y) - barrier_grad)));
        rhs.rows_mut(ns, m).copy_from(&(b - a * &x.n));

        // Solve the linearized KKT system
        let step = kkt
            .lu()
            .solve(&rhs)
            .ok_or_else(|| breakdown("singular KKT matrix", iter, residual_norm))?;
        let dn = step.rows(0, ns).into_owned();
        let dy = step.rows(ns, m).into_owned();
        let mut dz = DVector::zeros(ns);
        for i in 0..ns {
            dz[i] = (mu - x.n[i] * x.z[i] - x.z[i] * dn[i]) / x.n[i];
        }

        // Fraction-to-boundary step lengths
        let alpha_n = step_to_boundary(&x.n, &dn, config.step_fraction);
        let alpha_z = step_to_boundary(&x.z, &dz, config.step_fraction);

        x.n += alpha_n * &dn;
        x.y += alpha_n * &dy;
        x.z += alpha_z * &dz;

        debug!(
            target: "equilibria::solver",
            iteration = iter,
            optimality = residual.optimality,
            feasibility = residual.feasibility,
            complementarity = residual.complementarity,
            alpha_n,
            alpha_z,
            "interior-point step"
        );

        if x.n.iter().chain(x.z.iter()).any(|v| !v.is_finite()) {
            return Err(breakdown("non-finite iterate", iter + 1, residual_norm));
        }
    }

    Err(SolverError::ConvergenceFailure {
        iterations: config.max_iterations,
        residual: residual_norm,
    })
}

/// A Newton step that cannot be taken ends the iteration like an
/// exhausted budget.
fn breakdown(what: &'static str, iterations: usize, residual: f64) -> SolverError {
    warn!(
        target: "equilibria::solver",
        iterations,
        residual,
        what,
        "interior-point iteration broke down"
    );
    SolverError::ConvergenceFailure {
        iterations,
        residual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// min Σ nᵢ (cᵢ + ln nᵢ - 1) s.t. Σ nᵢ = 1  →  nᵢ = exp(-cᵢ) / Σ exp(-cⱼ)
    fn entropy_problem(c: Vec<f64>) -> impl Fn(&DVector<f64>) -> SolverResult<(DVector<f64>, DMatrix<f64>)> {
        move |n: &DVector<f64>| {
            let g = DVector::from_fn(n.len(), |i, _| c[i] + n[i].ln());
            let h = DMatrix::from_fn(n.len(), n.len(), |i, j| if i == j { 1.0 / n[i] } else { 0.0 });
            Ok((g, h))
        }
    }

    #[test]
    fn boltzmann_distribution() {
        let c = vec![0.0, 1.0, 2.0];
        let a = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0]);
        let config = EquilibriumOptions::default();
        let x0 = OptimumState::initial(&DVector::from_vec(vec![1.0, 0.0, 0.0]), 1, 1e-16, config.barrier);

        let result = ip_newton_solve(x0, &a, &b, entropy_problem(c.clone()), &config).unwrap();

        let total: f64 = c.iter().map(|ci| (-ci).exp()).sum();
        for (i, ci) in c.iter().enumerate() {
            let expected = (-ci).exp() / total;
            assert!((result.optimum.n[i] - expected).abs() < 1e-8);
        }
        assert!(result.residual_norm < config.tolerance);
    }

    #[test]
    fn linear_species_is_driven_to_bound() {
        // n0 enters with ln, n1 linearly with a large cost: n1 → barrier / cost
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0]);
        let evaluate = |n: &DVector<f64>| -> SolverResult<(DVector<f64>, DMatrix<f64>)> {
            let g = DVector::from_vec(vec![n[0].ln(), 5.0]);
            let h = DMatrix::from_row_slice(2, 2, &[1.0 / n[0], 0.0, 0.0, 0.0]);
            Ok((g, h))
        };
        let config = EquilibriumOptions::default();
        let x0 = OptimumState::initial(&DVector::from_vec(vec![0.5, 0.5]), 1, 1e-16, config.barrier);

        let result = ip_newton_solve(x0, &a, &b, evaluate, &config).unwrap();

        assert!(result.optimum.n[1] < 1e-12);
        assert!((result.optimum.n[0] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn iteration_budget_exhaustion_is_reported() {
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0]);
        let config = EquilibriumOptions {
            max_iterations: 1,
            ..EquilibriumOptions::default()
        };
        let x0 = OptimumState::initial(&DVector::from_vec(vec![1.0, 0.0]), 1, 1e-16, config.barrier);

        let err = ip_newton_solve(x0, &a, &b, entropy_problem(vec![0.0, 0.0]), &config).unwrap_err();
        match err {
            SolverError::ConvergenceFailure { iterations, residual } => {
                assert_eq!(iterations, 1);
                assert!(residual > 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_potentials_end_as_convergence_failure() {
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0]);
        let evaluate = |_: &DVector<f64>| -> SolverResult<(DVector<f64>, DMatrix<f64>)> {
            Ok((DVector::from_vec(vec![f64::NAN, 0.0]), DMatrix::identity(2, 2)))
        };
        let config = EquilibriumOptions::default();
        let x0 = OptimumState::initial(&DVector::from_vec(vec![0.5, 0.5]), 1, 1e-16, config.barrier);

        let err = ip_newton_solve(x0, &a, &b, evaluate, &config).unwrap_err();
        assert!(
            matches!(err, SolverError::ConvergenceFailure { iterations: 0, .. }),
            "{err}"
        );
    }

    #[test]
    fn mismatched_dimensions_are_infeasible() {
        let a = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]);
        let b = DVector::from_vec(vec![1.0]);
        let config = EquilibriumOptions::default();
        let x0 = OptimumState::initial(&DVector::from_vec(vec![0.5, 0.5]), 1, 1e-16, config.barrier);

        let err = ip_newton_solve(x0, &a, &b, entropy_problem(vec![0.0, 0.0]), &config).unwrap_err();
        assert!(matches!(err, SolverError::InfeasibleConstraints { .. }), "{err}");
    }

    #[test]
    fn step_to_boundary_limits_decrease() {
        let x = DVector::from_vec(vec![1.0, 1.0]);
        let dx = DVector::from_vec(vec![-2.0, 5.0]);
        assert!((step_to_boundary(&x, &dx, 0.99) - 0.495).abs() < 1e-15);
        assert_eq!(step_to_boundary(&x, &DVector::from_vec(vec![1.0, 1.0]), 0.99), 1.0);
    }
}

//! Reduction of an equilibrium calculation to a well-posed minimisation.
//!
//! Species containing an element with zero total amount cannot form and are
//! removed; element rows that are linear combinations of others are dropped
//! so the KKT matrix stays nonsingular. Species held at fixed amounts are
//! removed too, after their share of every element is taken off the totals.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian;
use crate::optimum::OptimumState;
use crate::options::{EquilibriumOptions, HessianMode};
use eq_chem::{CHARGE_SYMBOL, ChemicalSystem, GibbsModel};
use eq_core::units::{Pressure, Temperature};
use nalgebra::{DMatrix, DVector};

/// Rows whose component orthogonal to the accepted rows is below this
/// fraction of their norm are treated as dependent.
const RANK_TOLERANCE: f64 = 1e-10;

/// Element amounts left after removing fixed species that are below this
/// fraction of the removed amount count as zero.
const CANCELLATION_TOLERANCE: f64 = 1e-12;

/// Gibbs minimisation over the active species and independent element rows.
pub struct GibbsProblem<'a> {
    system: &'a ChemicalSystem,
    model: &'a dyn GibbsModel,
    t: Temperature,
    p: Pressure,
    active: Vec<usize>,
    rows: Vec<usize>,
    a: DMatrix<f64>,
    b: DVector<f64>,
    b_full: DVector<f64>,
    fixed: DVector<f64>,
    hessian: HessianMode,
}

impl<'a> GibbsProblem<'a> {
    /// Set up the problem for element totals `b_full` (system element order).
    ///
    /// Species flagged in `excluded` never take part.
    pub fn new(
        system: &'a ChemicalSystem,
        model: &'a dyn GibbsModel,
        t: Temperature,
        p: Pressure,
        b_full: &DVector<f64>,
        excluded: &[bool],
        options: &EquilibriumOptions,
    ) -> SolverResult<Self> {
        let fixed = DVector::zeros(system.num_species());
        Self::with_fixed_amounts(system, model, t, p, b_full, excluded, &fixed, options)
    }

    /// Like [`GibbsProblem::new`], but excluded species sit at the amounts in
    /// `fixed` (system species order) instead of zero.
    ///
    /// Their elements are subtracted from `b_full` before the remaining totals
    /// are distributed over the active species, and the model sees them in
    /// every evaluation.
    #[allow(clippy::too_many_arguments)]
    pub fn with_fixed_amounts(
        system: &'a ChemicalSystem,
        model: &'a dyn GibbsModel,
        t: Temperature,
        p: Pressure,
        b_full: &DVector<f64>,
        excluded: &[bool],
        fixed: &DVector<f64>,
        options: &EquilibriumOptions,
    ) -> SolverResult<Self> {
        let formula = system.formula_matrix();
        let ne = system.num_elements();
        let ns = system.num_species();
        if b_full.len() != ne || excluded.len() != ns || fixed.len() != ns {
            return Err(SolverError::InfeasibleConstraints {
                what: format!(
                    "expected {ne} element amounts and {ns} species flags and amounts, got {}, {} and {}",
                    b_full.len(),
                    excluded.len(),
                    fixed.len()
                ),
            });
        }

        // Only excluded species may hold a fixed amount.
        let fixed = DVector::from_iterator(
            ns,
            fixed
                .iter()
                .zip(excluded)
                .map(|(&n, &out)| if out { n } else { 0.0 }),
        );
        if let Some(j) = fixed.iter().position(|n| !n.is_finite() || *n < 0.0) {
            return Err(SolverError::InfeasibleConstraints {
                what: format!(
                    "fixed species {} has amount {}",
                    system.species()[j].name(),
                    fixed[j]
                ),
            });
        }
        let removed = formula * &fixed;
        let removed_scale = formula.abs() * &fixed;
        let mut b_free = b_full - &removed;
        for (e, value) in b_free.iter_mut().enumerate() {
            if value.abs() <= CANCELLATION_TOLERANCE * removed_scale[e] {
                *value = 0.0;
            }
        }

        let mut excluded = excluded.to_vec();
        let mut candidate_rows = Vec::with_capacity(ne);
        for (e, symbol) in system.elements().iter().enumerate() {
            let total = b_free[e];
            if !total.is_finite() {
                return Err(SolverError::InfeasibleConstraints {
                    what: format!("element {symbol} has non-finite amount {}", b_full[e]),
                });
            }
            if symbol == CHARGE_SYMBOL {
                candidate_rows.push(e);
                continue;
            }
            if total < 0.0 {
                let what = if removed[e] > 0.0 {
                    format!(
                        "fixed species hold {} mol of element {symbol}, only {} available",
                        removed[e], b_full[e]
                    )
                } else {
                    format!("element {symbol} has negative amount {total}")
                };
                return Err(SolverError::InfeasibleConstraints { what });
            }
            if total == 0.0 {
                for (j, flag) in excluded.iter_mut().enumerate() {
                    if formula[(e, j)] != 0.0 {
                        *flag = true;
                    }
                }
            } else {
                candidate_rows.push(e);
            }
        }

        let active: Vec<usize> = (0..ns).filter(|&j| !excluded[j]).collect();
        let b_scale = b_full.amax().max(f64::MIN_POSITIVE);

        let mut basis: Vec<DVector<f64>> = Vec::new();
        let mut rows = Vec::new();
        for &e in &candidate_rows {
            let row = DVector::from_iterator(active.len(), active.iter().map(|&j| formula[(e, j)]));
            let norm = row.norm();
            if norm == 0.0 {
                if b_free[e].abs() > options.tolerance * b_scale {
                    return Err(SolverError::InfeasibleConstraints {
                        what: format!(
                            "no available species carries element {} (amount {})",
                            system.elements()[e],
                            b_free[e]
                        ),
                    });
                }
                continue;
            }
            let mut residual = row.clone();
            for q in &basis {
                let proj = q.dot(&residual);
                residual.axpy(-proj, q, 1.0);
            }
            let rnorm = residual.norm();
            if rnorm > RANK_TOLERANCE * norm {
                basis.push(residual / rnorm);
                rows.push(e);
            }
        }

        let a = DMatrix::from_fn(rows.len(), active.len(), |i, j| formula[(rows[i], active[j])]);
        let b = DVector::from_iterator(rows.len(), rows.iter().map(|&e| b_free[e]));

        Ok(Self {
            system,
            model,
            t,
            p,
            active,
            rows,
            a,
            b,
            b_full: b_full.clone(),
            fixed,
            hessian: options.hessian,
        })
    }

    /// System indices of the species taking part.
    pub fn active_species(&self) -> &[usize] {
        &self.active
    }

    /// System indices of the retained element rows.
    pub fn element_rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn constraint_matrix(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn constraint_vector(&self) -> &DVector<f64> {
        &self.b
    }

    /// Amounts of the active species, taken from system-ordered `n_full`.
    pub fn restrict_species(&self, n_full: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.active.len(), self.active.iter().map(|&j| n_full[j]))
    }

    /// System-ordered amounts; inactive species keep their fixed amounts.
    pub fn expand_species(&self, n: &DVector<f64>) -> DVector<f64> {
        let mut full = self.fixed.clone();
        for (k, &j) in self.active.iter().enumerate() {
            full[j] = n[k];
        }
        full
    }

    /// Optimum over the full system: fixed amounts and zero multipliers for
    /// inactive species, zero potentials for dropped rows.
    pub fn expand(&self, x: &OptimumState) -> OptimumState {
        let mut y = DVector::zeros(self.system.num_elements());
        for (k, &e) in self.rows.iter().enumerate() {
            y[e] = x.y[k];
        }
        let mut z = DVector::zeros(self.system.num_species());
        for (k, &j) in self.active.iter().enumerate() {
            z[j] = x.z[k];
        }
        OptimumState {
            n: self.expand_species(&x.n),
            y,
            z,
        }
    }

    /// Starting point: amounts from `n_full`, multipliers from `warm` when it
    /// matches the system dimensions.
    pub fn initial_point(
        &self,
        n_full: &DVector<f64>,
        warm: Option<&OptimumState>,
        options: &EquilibriumOptions,
    ) -> OptimumState {
        let mut x = OptimumState::initial(
            &self.restrict_species(n_full),
            self.rows.len(),
            options.amount_floor,
            options.barrier,
        );
        let Some(warm) = warm else {
            return x;
        };
        if !warm.fits(self.system.num_species(), self.system.num_elements()) {
            return x;
        }
        for (k, &e) in self.rows.iter().enumerate() {
            x.y[k] = warm.y[e];
        }
        for (k, &j) in self.active.iter().enumerate() {
            let z = warm.z[j];
            if z.is_finite() && z > 0.0 {
                x.z[k] = z;
            }
        }
        x
    }

    /// μ/RT of the active species and its Hessian.
    pub fn evaluate(&self, n: &DVector<f64>) -> SolverResult<(DVector<f64>, DMatrix<f64>)> {
        let pack = self
            .model
            .evaluate(self.system, self.t, self.p, &self.expand_species(n))?;
        let mu = self.restrict_species(&pack.mu);
        let hessian = match self.hessian {
            HessianMode::Analytic => DMatrix::from_fn(self.active.len(), self.active.len(), |i, j| {
                pack.hessian[(self.active[i], self.active[j])]
            }),
            HessianMode::FiniteDifference { epsilon } => {
                let potentials = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
                    let mu = self
                        .model
                        .chemical_potentials(self.system, self.t, self.p, &self.expand_species(x))?;
                    Ok(self.restrict_species(&mu))
                };
                let h = finite_difference_jacobian(n, potentials, epsilon, f64::MIN_POSITIVE)?;
                // Symmetrize
                (&h + h.transpose()) * 0.5
            }
        };
        Ok((mu, hessian))
    }

    /// Largest violation of the full mass balance, relative to the largest
    /// element amount.
    pub fn mass_balance_violation(&self, n_full: &DVector<f64>) -> f64 {
        let scale = self.b_full.amax().max(f64::MIN_POSITIVE);
        let residual = self.system.formula_matrix() * n_full - &self.b_full;
        if residual.is_empty() {
            0.0
        } else {
            residual.amax() / scale
        }
    }
}

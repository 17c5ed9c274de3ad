//! Equilibrium solver service.

use crate::error::{SolverError, SolverResult};
use crate::newton::ip_newton_solve;
use crate::optimum::OptimumState;
use crate::options::EquilibriumOptions;
use crate::problem::GibbsProblem;
use crate::restrictions::EquilibriumRestrictions;
use eq_chem::{ChemicalState, ChemicalSystem, GibbsModel, IdealSolutionModel, StateSnapshot, Universe};
use eq_core::units::{Pressure, Temperature};
use nalgebra::DVector;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

/// Relative mass balance violation above which a converged result is
/// rejected (dropped dependent rows with inconsistent totals).
const MASS_BALANCE_CHECK: f64 = 1e-6;

/// Outcome of one equilibrium calculation.
#[derive(Debug, Clone)]
pub struct EquilibriumResult {
    /// Equilibrated state (same T, P and species order as the input)
    pub state: ChemicalState,
    /// Primal-dual solution in system species/element order
    pub optimum: OptimumState,
    pub iterations: usize,
    pub residual_norm: f64,
    /// Total Gibbs energy of the equilibrated state [J]
    pub gibbs_energy: f64,
}

/// Computes equilibrium states of one chemical system.
///
/// The system and model are shared read-only, so clones of a solver are
/// cheap and can run on other threads.
#[derive(Clone)]
pub struct EquilibriumSolver {
    system: Arc<ChemicalSystem>,
    model: Arc<dyn GibbsModel>,
    options: EquilibriumOptions,
}

impl std::fmt::Debug for EquilibriumSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquilibriumSolver")
            .field("model", &self.model.name())
            .field("species", &self.system.num_species())
            .field("options", &self.options)
            .finish()
    }
}

impl EquilibriumSolver {
    /// Solver with the ideal-solution model and default options.
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        Self::with_model(system, Arc::new(IdealSolutionModel::new()))
    }

    pub fn with_model(system: Arc<ChemicalSystem>, model: Arc<dyn GibbsModel>) -> Self {
        Self {
            system,
            model,
            options: EquilibriumOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EquilibriumOptions) -> SolverResult<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    pub fn system(&self) -> &ChemicalSystem {
        &self.system
    }

    pub fn model(&self) -> &dyn GibbsModel {
        self.model.as_ref()
    }

    pub fn options(&self) -> &EquilibriumOptions {
        &self.options
    }

    /// Equilibrate `state` at its temperature and pressure.
    ///
    /// Element amounts (charge included) of the input are conserved. The
    /// input is only read; the result holds a new state whose table keeps
    /// the input's species order, with system species missing from an open
    /// table appended.
    pub fn equilibrate(&self, state: &ChemicalState) -> SolverResult<EquilibriumResult> {
        self.equilibrate_warm(state, &EquilibriumRestrictions::new(), None)
    }

    /// Equilibrate starting from the multipliers of a previous result.
    pub fn equilibrate_from(
        &self,
        state: &ChemicalState,
        warm: &OptimumState,
    ) -> SolverResult<EquilibriumResult> {
        self.equilibrate_warm(state, &EquilibriumRestrictions::new(), Some(warm))
    }

    /// Equilibrate while the inert species of `restrictions` keep their
    /// input amounts.
    ///
    /// Inert species stay in the result with unchanged amounts; only the
    /// element amounts they do not hold are redistributed.
    pub fn equilibrate_with_restrictions(
        &self,
        state: &ChemicalState,
        restrictions: &EquilibriumRestrictions,
    ) -> SolverResult<EquilibriumResult> {
        self.equilibrate_warm(state, restrictions, None)
    }

    pub fn equilibrate_snapshot(&self, snapshot: &StateSnapshot) -> SolverResult<EquilibriumResult> {
        self.equilibrate(&snapshot.to_state()?)
    }

    /// Equilibrate states independently in parallel; results keep input order.
    pub fn equilibrate_many(&self, states: &[ChemicalState]) -> Vec<SolverResult<EquilibriumResult>> {
        states.par_iter().map(|s| self.equilibrate(s)).collect()
    }

    /// Equilibrium state for prescribed element amounts `b` (system element
    /// order, charge included) at `t`, `p`.
    ///
    /// `template` supplies the species table layout of the result; its
    /// amounts are replaced. Without `warm`, every species starts from the
    /// same amount.
    pub fn equilibrate_with_element_amounts(
        &self,
        template: &ChemicalState,
        t: Temperature,
        p: Pressure,
        b: &DVector<f64>,
        warm: Option<&OptimumState>,
    ) -> SolverResult<EquilibriumResult> {
        self.options.validate()?;
        let excluded = self.excluded_species(template)?;
        let n0 = match warm {
            Some(w) if w.n.len() == self.system.num_species() => w.n.clone(),
            _ => {
                let guess = b.amax().max(self.options.amount_floor)
                    / self.system.num_species().max(1) as f64;
                DVector::from_element(self.system.num_species(), guess)
            }
        };
        let mut layout = template.clone();
        layout.set_temperature(t)?;
        layout.set_pressure(p)?;
        let inert = vec![false; self.system.num_species()];
        self.solve(&layout, b, &n0, &excluded, &inert, warm)
    }

    fn equilibrate_warm(
        &self,
        state: &ChemicalState,
        restrictions: &EquilibriumRestrictions,
        warm: Option<&OptimumState>,
    ) -> SolverResult<EquilibriumResult> {
        self.options.validate()?;
        for (name, amount) in state.species().iter() {
            self.system.index_species_with_error(name)?;
            if !amount.is_finite() || amount < 0.0 {
                return Err(SolverError::InfeasibleConstraints {
                    what: format!("species {name} has amount {amount}"),
                });
            }
        }
        let n0 = self.system.species_amounts(state)?;
        let b = self.system.formula_matrix() * &n0;
        let excluded = self.excluded_species(state)?;
        let inert = restrictions.inert_flags(&self.system)?;
        self.solve(state, &b, &n0, &excluded, &inert, warm)
    }

    /// Species a closed table cannot hold are kept out of the calculation.
    fn excluded_species(&self, state: &ChemicalState) -> SolverResult<Vec<bool>> {
        let table = state.species();
        for name in table.names() {
            self.system.index_species_with_error(name)?;
        }
        Ok(self
            .system
            .species()
            .iter()
            .map(|s| table.universe() == Universe::Closed && !table.contains(s.name()))
            .collect())
    }

    /// `excluded` species are left out of the result table; `inert` ones
    /// stay at their `n0` amounts.
    fn solve(
        &self,
        layout: &ChemicalState,
        b: &DVector<f64>,
        n0: &DVector<f64>,
        excluded: &[bool],
        inert: &[bool],
        warm: Option<&OptimumState>,
    ) -> SolverResult<EquilibriumResult> {
        let t = layout.temperature();
        let p = layout.pressure();
        let held: Vec<bool> = excluded.iter().zip(inert).map(|(&x, &i)| x || i).collect();
        let fixed = DVector::from_iterator(
            n0.len(),
            n0.iter().zip(inert).map(|(&n, &i)| if i { n } else { 0.0 }),
        );
        let problem = GibbsProblem::with_fixed_amounts(
            &self.system,
            self.model.as_ref(),
            t,
            p,
            b,
            &held,
            &fixed,
            &self.options,
        )?;

        let (optimum, iterations, residual_norm) = if problem.active_species().is_empty() {
            // Nothing can react: the only feasible point is the fixed amounts
            let empty = OptimumState::initial(&DVector::zeros(0), 0, 1.0, self.options.barrier);
            (problem.expand(&empty), 0, 0.0)
        } else {
            let x0 = problem.initial_point(n0, warm, &self.options);
            let result = ip_newton_solve(
                x0,
                problem.constraint_matrix(),
                problem.constraint_vector(),
                |n| problem.evaluate(n),
                &self.options,
            )
            .inspect_err(|e| {
                warn!(target: "equilibria::solver", error = %e, "equilibration failed");
            })?;
            (
                problem.expand(&result.optimum),
                result.iterations,
                result.residual_norm,
            )
        };

        let violation = problem.mass_balance_violation(&optimum.n);
        if violation > MASS_BALANCE_CHECK {
            warn!(target: "equilibria::solver", violation, "mass balance not satisfiable");
            return Err(SolverError::InfeasibleConstraints {
                what: format!("element amounts are inconsistent (relative violation {violation:e})"),
            });
        }

        let gibbs_energy = self.model.gibbs_energy(&self.system, t, p, &optimum.n)?;

        let mut state = layout.clone();
        for (j, species) in self.system.species().iter().enumerate() {
            let name = species.name();
            if excluded[j] || (inert[j] && !layout.species().contains(name)) {
                continue;
            }
            // Barrier iterates are strictly positive; clamp guards round-off.
            state.set_species_amount(name, optimum.n[j].max(0.0))?;
        }

        info!(
            target: "equilibria::solver",
            model = self.model.name(),
            iterations,
            residual_norm,
            gibbs_energy,
            "equilibrium converged"
        );

        Ok(EquilibriumResult {
            state,
            optimum,
            iterations,
            residual_norm,
            gibbs_energy,
        })
    }
}

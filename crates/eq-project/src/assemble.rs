//! Runtime objects from scenario definitions.

use crate::schema::{
    AmountDef, HessianDef, PhaseKindDef, RestrictionsDef, Scenario, SolverDef, StateDef, SystemDef,
};
use eq_chem::{
    ChemResult, ChemicalState, ChemicalSystem, Formula, PhaseKind, ReportFormat, Species,
    SpeciesAmountTable, SystemBuilder,
};
use eq_core::units::{j_per_mol, k, pa};
use eq_solver::{EquilibriumOptions, EquilibriumRestrictions, HessianMode};

pub fn build_system(def: &SystemDef) -> ChemResult<ChemicalSystem> {
    let mut builder = SystemBuilder::new();
    for phase in &def.phases {
        let species = phase
            .species
            .iter()
            .map(|s| -> ChemResult<Species> {
                let formula = Formula::parse(s.formula.as_deref().unwrap_or(&s.name))?;
                Ok(Species::new(&s.name, formula)
                    .with_standard_gibbs(j_per_mol(s.gibbs_j_per_mol))
                    .with_standard_entropy(s.entropy_j_per_mol_k))
            })
            .collect::<ChemResult<Vec<_>>>()?;
        builder.add_phase(&phase.name, phase_kind(phase.kind), species);
    }
    builder.build()
}

fn phase_kind(def: PhaseKindDef) -> PhaseKind {
    match def {
        PhaseKindDef::Aqueous => PhaseKind::Aqueous,
        PhaseKindDef::Gaseous => PhaseKind::Gaseous,
        PhaseKindDef::Pure => PhaseKind::Pure,
    }
}

/// State with the listed amounts, in listed order (open table).
pub fn build_state(def: &StateDef) -> ChemResult<ChemicalState> {
    let table =
        SpeciesAmountTable::from_amounts(def.amounts.iter().map(|a| (a.species.as_str(), a.mol)))?;
    ChemicalState::new(k(def.temperature_k), pa(def.pressure_pa), table)
}

/// Apply amount overrides in order.
pub fn apply_perturbations(state: &mut ChemicalState, perturbations: &[AmountDef]) -> ChemResult<()> {
    for p in perturbations {
        state.set_species_amount(&p.species, p.mol)?;
    }
    Ok(())
}

pub fn solver_options(def: &SolverDef) -> EquilibriumOptions {
    let defaults = EquilibriumOptions::default();
    EquilibriumOptions {
        max_iterations: def.max_iterations.unwrap_or(defaults.max_iterations),
        tolerance: def.tolerance.unwrap_or(defaults.tolerance),
        barrier: def.barrier.unwrap_or(defaults.barrier),
        step_fraction: def.step_fraction.unwrap_or(defaults.step_fraction),
        amount_floor: def.amount_floor.unwrap_or(defaults.amount_floor),
        hessian: match def.hessian {
            HessianDef::Analytic => HessianMode::Analytic,
            HessianDef::FiniteDifference { epsilon } => HessianMode::FiniteDifference { epsilon },
        },
    }
}

pub fn restrictions(def: &RestrictionsDef) -> EquilibriumRestrictions {
    def.inert.iter().cloned().collect()
}

/// Definition of `state` suitable for saving back into a scenario.
pub fn state_def(state: &ChemicalState) -> StateDef {
    StateDef {
        temperature_k: state.temperature().value,
        pressure_pa: state.pressure().value,
        amounts: state
            .species()
            .iter()
            .map(|(name, mol)| AmountDef {
                species: name.to_string(),
                mol,
            })
            .collect(),
    }
}

impl Scenario {
    pub fn build_system(&self) -> ChemResult<ChemicalSystem> {
        build_system(&self.system)
    }

    /// Initial state before perturbations.
    pub fn initial_state(&self) -> ChemResult<ChemicalState> {
        build_state(&self.state)
    }

    /// Initial state with the scenario perturbations applied.
    pub fn perturbed_state(&self) -> ChemResult<ChemicalState> {
        let mut state = self.initial_state()?;
        apply_perturbations(&mut state, &self.perturbations)?;
        Ok(state)
    }

    pub fn solver_options(&self) -> EquilibriumOptions {
        self.solver.as_ref().map(solver_options).unwrap_or_default()
    }

    pub fn restrictions(&self) -> EquilibriumRestrictions {
        restrictions(&self.restrictions)
    }

    pub fn report_format(&self) -> ReportFormat {
        ReportFormat {
            precision: self.report.precision,
        }
    }
}

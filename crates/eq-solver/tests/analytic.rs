//! Ideal-gas equilibria with closed-form solutions.

use eq_chem::{ChemicalState, ChemicalSystem, Formula, PhaseKind, Species, SpeciesAmountTable, SystemBuilder};
use eq_core::units::constants::R_J_PER_MOL_K;
use eq_core::units::{j_per_mol, k, pa};
use eq_solver::{EquilibriumOptions, EquilibriumSolver, HessianMode, SolverError};
use nalgebra::DVector;
use std::sync::Arc;

const G_NO2: f64 = 51_310.0;
const G_N2O4: f64 = 97_890.0;

fn isomer_system(delta_g: f64) -> Arc<ChemicalSystem> {
    let mut builder = SystemBuilder::new();
    builder.add_phase(
        "gas",
        PhaseKind::Gaseous,
        vec![
            Species::new("butane", Formula::parse("C4H10").unwrap()),
            Species::new("isobutane", Formula::parse("C4H10").unwrap())
                .with_standard_gibbs(j_per_mol(delta_g)),
        ],
    );
    Arc::new(builder.build().unwrap())
}

fn dimer_system() -> Arc<ChemicalSystem> {
    let mut builder = SystemBuilder::new();
    builder.add_phase(
        "gas",
        PhaseKind::Gaseous,
        vec![
            Species::from_formula("NO2").unwrap().with_standard_gibbs(j_per_mol(G_NO2)),
            Species::from_formula("N2O4").unwrap().with_standard_gibbs(j_per_mol(G_N2O4)),
        ],
    );
    Arc::new(builder.build().unwrap())
}

fn state(t: f64, p: f64, amounts: &[(&str, f64)]) -> ChemicalState {
    let table = SpeciesAmountTable::from_amounts(amounts.iter().copied()).unwrap();
    ChemicalState::new(k(t), pa(p), table).unwrap()
}

/// x(N2O4) / x(NO2)² at equilibrium.
fn dimer_ratio(result: &ChemicalState) -> f64 {
    let n1 = result.species_amount("NO2").unwrap();
    let n2 = result.species_amount("N2O4").unwrap();
    let total = n1 + n2;
    (n2 / total) / (n1 / total).powi(2)
}

#[test]
fn isomerization_matches_equilibrium_constant() {
    let delta_g = -2000.0;
    let solver = EquilibriumSolver::new(isomer_system(delta_g));
    let input = state(298.15, 1e5, &[("butane", 1.0), ("isobutane", 0.0)]);

    let result = solver.equilibrate(&input).unwrap();

    let ratio = result.state.species_amount("isobutane").unwrap()
        / result.state.species_amount("butane").unwrap();
    let expected = (-delta_g / (R_J_PER_MOL_K * 298.15)).exp();
    assert!((ratio - expected).abs() < 1e-6 * expected, "{ratio} vs {expected}");
    assert!((result.state.species().total() - 1.0).abs() < 1e-9);
}

#[test]
fn dimerization_follows_pressure() {
    let solver = EquilibriumSolver::new(dimer_system());
    let k_eq = (-(G_N2O4 - 2.0 * G_NO2) / (R_J_PER_MOL_K * 298.15)).exp();

    for p in [1e5, 5e5] {
        let input = state(298.15, p, &[("NO2", 1.0), ("N2O4", 0.0)]);
        let result = solver.equilibrate(&input).unwrap();
        let expected = k_eq * p / 1e5;
        let ratio = dimer_ratio(&result.state);
        assert!((ratio - expected).abs() < 1e-6 * expected, "P = {p}: {ratio} vs {expected}");

        let nitrogen = result.state.species_amount("NO2").unwrap()
            + 2.0 * result.state.species_amount("N2O4").unwrap();
        assert!((nitrogen - 1.0).abs() < 1e-9);
    }
}

#[test]
fn finite_difference_hessian_reaches_same_equilibrium() {
    let input = state(298.15, 1e5, &[("NO2", 1.0), ("N2O4", 0.0)]);
    let analytic = EquilibriumSolver::new(dimer_system()).equilibrate(&input).unwrap();
    let fd = EquilibriumSolver::new(dimer_system())
        .with_options(EquilibriumOptions {
            hessian: HessianMode::FiniteDifference { epsilon: 1e-7 },
            ..EquilibriumOptions::default()
        })
        .unwrap()
        .equilibrate(&input)
        .unwrap();

    let a = analytic.state.species_amount("N2O4").unwrap();
    let b = fd.state.species_amount("N2O4").unwrap();
    assert!((a - b).abs() < 1e-8 * a);
}

#[test]
fn iteration_budget_is_enforced() {
    let solver = EquilibriumSolver::new(dimer_system())
        .with_options(EquilibriumOptions {
            max_iterations: 1,
            ..EquilibriumOptions::default()
        })
        .unwrap();
    let input = state(298.15, 1e5, &[("NO2", 1.0), ("N2O4", 0.0)]);

    match solver.equilibrate(&input) {
        Err(SolverError::ConvergenceFailure { iterations, residual }) => {
            assert_eq!(iterations, 1);
            assert!(residual.is_finite());
        }
        other => panic!("expected convergence failure, got {other:?}"),
    }
}

#[test]
fn inconsistent_element_amounts_are_infeasible() {
    // Both isomers are C4H10, so carbon and hydrogen must stay in ratio 4:10.
    let solver = EquilibriumSolver::new(isomer_system(-2000.0));
    let template = state(298.15, 1e5, &[("butane", 1.0), ("isobutane", 0.0)]);
    let b = DVector::from_vec(vec![4.0, 9.0]);

    let err = solver
        .equilibrate_with_element_amounts(&template, k(298.15), pa(1e5), &b, None)
        .unwrap_err();
    assert!(matches!(err, SolverError::InfeasibleConstraints { .. }), "{err}");
}

#[test]
fn empty_state_stays_empty() {
    let solver = EquilibriumSolver::new(dimer_system());
    let input = state(298.15, 1e5, &[("NO2", 0.0), ("N2O4", 0.0)]);
    let result = solver.equilibrate(&input).unwrap();
    assert_eq!(result.state.species().total(), 0.0);
    assert_eq!(result.iterations, 0);
}

//! Background and parallel equilibration.

use eq_chem::{ChemicalState, ChemicalSystem, PhaseKind, Species, SpeciesAmountTable, SystemBuilder};
use eq_core::units::{j_per_mol, k, pa};
use eq_solver::{EquilibriumPath, EquilibriumRestrictions, EquilibriumSolver, SolverError};
use std::sync::Arc;
use std::time::Duration;

fn dimer_system() -> Arc<ChemicalSystem> {
    let mut builder = SystemBuilder::new();
    builder.add_phase(
        "gas",
        PhaseKind::Gaseous,
        vec![
            Species::from_formula("NO2").unwrap().with_standard_gibbs(j_per_mol(51_310.0)),
            Species::from_formula("N2O4").unwrap().with_standard_gibbs(j_per_mol(97_890.0)),
        ],
    );
    Arc::new(builder.build().unwrap())
}

fn state(t: f64, no2: f64) -> ChemicalState {
    let table = SpeciesAmountTable::from_amounts([("NO2", no2), ("N2O4", 0.0)]).unwrap();
    ChemicalState::new(k(t), pa(1e5), table).unwrap()
}

#[test]
fn spawned_task_matches_direct_call() {
    let solver = EquilibriumSolver::new(dimer_system());
    let direct = solver.equilibrate(&state(298.15, 1.0)).unwrap();

    let task = solver.spawn(state(298.15, 1.0));
    let background = task.wait().unwrap();

    assert_eq!(direct.state, background.state);
    assert_eq!(direct.iterations, background.iterations);
}

#[test]
fn snapshot_equilibrates_like_its_state() {
    let solver = EquilibriumSolver::new(dimer_system());
    let mut original = state(310.0, 1.5);
    let snapshot = original.snapshot();
    original.set_species_amount("NO2", 9.0).unwrap();

    let from_snapshot = solver.equilibrate_snapshot(&snapshot).unwrap();
    let direct = solver.equilibrate(&snapshot.to_state().unwrap()).unwrap();
    assert_eq!(from_snapshot.state, direct.state);
}

#[test]
fn try_result_eventually_delivers() {
    let solver = EquilibriumSolver::new(dimer_system());
    let mut task = solver.spawn(state(298.15, 2.0));

    let mut outcome = None;
    for _ in 0..1000 {
        if let Some(result) = task.try_result() {
            outcome = Some(result);
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    let result = outcome.expect("worker did not finish").unwrap();
    let n = result.state.species_amount("NO2").unwrap()
        + 2.0 * result.state.species_amount("N2O4").unwrap();
    assert!((n - 2.0).abs() < 1e-9);
}

#[test]
fn spawned_failure_is_delivered_as_error() {
    let solver = EquilibriumSolver::new(dimer_system());
    let mut bad = state(298.15, 1.0);
    bad.set_species_amount_unchecked("NO2", -1.0).unwrap();

    let err = solver.spawn(bad).wait().unwrap_err();
    assert!(matches!(err, SolverError::InfeasibleConstraints { .. }));
}

#[test]
fn spawned_task_honours_restrictions() {
    let solver = EquilibriumSolver::new(dimer_system());
    let mut input = state(298.15, 1.0);
    input.set_species_amount("N2O4", 0.5).unwrap();
    let restrictions: EquilibriumRestrictions = ["N2O4"].into_iter().collect();

    let result = solver.spawn_with_restrictions(input, restrictions).wait().unwrap();

    assert_eq!(result.state.species_amount("N2O4").unwrap(), 0.5);
    assert!((result.state.species_amount("NO2").unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn parallel_batch_keeps_order() {
    let solver = EquilibriumSolver::new(dimer_system());
    let states: Vec<ChemicalState> = (1..=8).map(|i| state(280.0 + 5.0 * i as f64, i as f64)).collect();

    let results = solver.equilibrate_many(&states);

    assert_eq!(results.len(), states.len());
    for (input, result) in states.iter().zip(&results) {
        let result = result.as_ref().unwrap();
        assert_eq!(result.state.temperature(), input.temperature());
        let expected = solver.equilibrate(input).unwrap();
        assert_eq!(result.state, expected.state);
    }
}

#[test]
fn path_interpolates_conditions_and_element_amounts() {
    let system = dimer_system();
    let solver = EquilibriumSolver::new(system.clone());
    let start = state(298.15, 1.0);
    let end = state(348.15, 3.0);

    let points = EquilibriumPath::new(solver.clone()).solve(&start, &end, 4).unwrap();

    assert_eq!(points.len(), 5);
    let first = solver.equilibrate(&start).unwrap();
    assert_eq!(points[0].result.state, first.state);
    for (i, point) in points.iter().enumerate() {
        let s = i as f64 / 4.0;
        assert!((point.t - s).abs() < 1e-15);
        let t = point.result.state.temperature().value;
        assert!((t - (298.15 + 50.0 * s)).abs() < 1e-9);
        let nitrogen = system.element_amount(&point.result.state, "N").unwrap();
        assert!((nitrogen - (1.0 + 2.0 * s)).abs() < 1e-8);
    }
    // The last point is already at equilibrium for its own conditions
    let x_dimer = |st: &ChemicalState| {
        st.species_amount("N2O4").unwrap() / st.species().total()
    };
    let last = &points[4].result.state;
    let end_iso = solver.equilibrate(last).unwrap();
    assert!((x_dimer(last) - x_dimer(&end_iso.state)).abs() < 1e-6);
}

#[test]
fn path_needs_steps() {
    let solver = EquilibriumSolver::new(dimer_system());
    let err = EquilibriumPath::new(solver)
        .solve(&state(298.15, 1.0), &state(298.15, 1.0), 0)
        .unwrap_err();
    assert!(matches!(err, SolverError::InvalidOptions { .. }));
}

mod error;

use clap::{Parser, Subcommand};
use eq_chem::{ChemicalState, Quantity, ReportFormat, StateReporter};
use eq_core::units::{k, pa};
use eq_project::Scenario;
use eq_solver::{EquilibriumPath, EquilibriumResult, EquilibriumSolver};
use error::{CliError, CliResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eq-cli")]
#[command(about = "Equilibria CLI - chemical equilibrium of perturbed states", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario YAML/JSON file
        scenario_path: PathBuf,
    },
    /// Print the report of the scenario's initial state
    Report {
        /// Path to the scenario YAML/JSON file
        scenario_path: PathBuf,
        /// Apply the scenario perturbations first
        #[arg(long)]
        perturbed: bool,
        /// Output file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Perturb the initial state, equilibrate and report
    Equilibrate {
        /// Path to the scenario YAML/JSON file
        scenario_path: PathBuf,
        /// Extra perturbation NAME=AMOUNT [mol], applied after the scenario's own
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, f64)>,
        /// Keep this species at its amount (repeatable), in addition to the
        /// scenario's inert species
        #[arg(long = "inert")]
        inert: Vec<String>,
        /// Write the perturbed (pre-equilibrium) state report here
        #[arg(long)]
        before: Option<PathBuf>,
        /// Write the equilibrium state report here (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Solve on a worker thread
        #[arg(long)]
        background: bool,
    },
    /// Equilibrate along a line from the perturbed state to modified conditions
    Path {
        /// Path to the scenario YAML/JSON file
        scenario_path: PathBuf,
        /// Final temperature [K] (defaults to the initial one)
        #[arg(long)]
        to_temperature: Option<f64>,
        /// Final pressure [Pa] (defaults to the initial one)
        #[arg(long)]
        to_pressure: Option<f64>,
        /// Final amount NAME=AMOUNT [mol]
        #[arg(long = "to-set", value_parser = parse_assignment)]
        to_set: Vec<(String, f64)>,
        /// Number of steps
        #[arg(long, default_value_t = 10)]
        steps: usize,
        /// Tabulate this quantity instead of species amounts (repeatable),
        /// e.g. pH or speciesMolality(HCO3-)
        #[arg(long = "quantity", value_parser = parse_quantity)]
        quantities: Vec<Quantity>,
        /// Output table file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Report {
            scenario_path,
            perturbed,
            output,
        } => cmd_report(&scenario_path, perturbed, output.as_deref()),
        Commands::Equilibrate {
            scenario_path,
            set,
            inert,
            before,
            output,
            background,
        } => cmd_equilibrate(
            &scenario_path,
            &set,
            &inert,
            before.as_deref(),
            output.as_deref(),
            background,
        ),
        Commands::Path {
            scenario_path,
            to_temperature,
            to_pressure,
            to_set,
            steps,
            quantities,
            output,
        } => cmd_path(
            &scenario_path,
            to_temperature,
            to_pressure,
            &to_set,
            steps,
            &quantities,
            output.as_deref(),
        ),
    }
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got '{s}'"))?;
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount '{amount}': {e}"))?;
    Ok((name.trim().to_string(), amount))
}

fn parse_quantity(s: &str) -> Result<Quantity, String> {
    s.parse().map_err(|e: eq_chem::ChemError| e.to_string())
}

fn cmd_validate(scenario_path: &Path) -> CliResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = eq_project::load_scenario(scenario_path)?;
    // Building the system also checks the stoichiometry.
    let system = scenario.build_system()?;
    println!("✓ Scenario is valid");
    println!("  Elements: {}", system.elements().join(" "));
    for phase in system.phases() {
        let names: Vec<&str> = phase
            .species_indices()
            .iter()
            .map(|&j| system.species()[j].name())
            .collect();
        println!("  {} ({}): {}", phase.name(), phase.kind().key(), names.join(", "));
    }
    Ok(())
}

fn cmd_report(scenario_path: &Path, perturbed: bool, output: Option<&Path>) -> CliResult<()> {
    let scenario = eq_project::load_scenario(scenario_path)?;
    let state = if perturbed {
        scenario.perturbed_state()?
    } else {
        scenario.initial_state()?
    };
    emit_report(&state, &scenario.report_format(), output)
}

fn cmd_equilibrate(
    scenario_path: &Path,
    set: &[(String, f64)],
    inert: &[String],
    before: Option<&Path>,
    output: Option<&Path>,
    background: bool,
) -> CliResult<()> {
    let scenario = eq_project::load_scenario(scenario_path)?;
    let solver = build_solver(&scenario)?;
    let format = scenario.report_format();

    let mut state = scenario.perturbed_state()?;
    for (name, amount) in set {
        state.set_species_amount(name, *amount)?;
    }
    if let Some(path) = before {
        state.output(path, &format)?;
        println!("✓ Perturbed state written to {}", path.display());
    }

    let mut restrictions = scenario.restrictions();
    for name in inert {
        restrictions.cannot_react(name.as_str());
    }

    let result = if background {
        solver.spawn_with_restrictions(state.clone(), restrictions).wait()?
    } else {
        solver.equilibrate_with_restrictions(&state, &restrictions)?
    };
    print_summary(&result);
    emit_report(&result.state, &format, output)
}

fn cmd_path(
    scenario_path: &Path,
    to_temperature: Option<f64>,
    to_pressure: Option<f64>,
    to_set: &[(String, f64)],
    steps: usize,
    quantities: &[Quantity],
    output: Option<&Path>,
) -> CliResult<()> {
    let scenario = eq_project::load_scenario(scenario_path)?;
    let solver = build_solver(&scenario)?;

    let start = scenario.perturbed_state()?;
    let mut end = start.clone();
    if let Some(t) = to_temperature {
        end.set_temperature(k(t))?;
    }
    if let Some(p) = to_pressure {
        end.set_pressure(pa(p))?;
    }
    for (name, amount) in to_set {
        end.set_species_amount(name, *amount)?;
    }

    let points = EquilibriumPath::new(solver.clone()).solve(&start, &end, steps)?;
    let rows: Vec<(f64, &ChemicalState)> = points.iter().map(|p| (p.t, &p.result.state)).collect();
    let reporter = StateReporter::new(scenario.report_format());
    let table = if quantities.is_empty() {
        reporter.format_series(&rows)?
    } else {
        reporter.format_quantities(solver.system(), quantities, &rows)?
    };

    match output {
        Some(path) => {
            eq_chem::write_atomic(path, &table)?;
            println!("✓ Path with {} points written to {}", points.len(), path.display());
        }
        None => print!("{table}"),
    }
    Ok(())
}

fn build_solver(scenario: &Scenario) -> CliResult<EquilibriumSolver> {
    let system = Arc::new(scenario.build_system()?);
    Ok(EquilibriumSolver::new(system).with_options(scenario.solver_options())?)
}

fn print_summary(result: &EquilibriumResult) {
    eprintln!("✓ Equilibrium reached");
    eprintln!("  Iterations: {}", result.iterations);
    eprintln!("  Residual norm: {:.3e}", result.residual_norm);
    eprintln!("  Gibbs energy: {:.6e} J", result.gibbs_energy);
}

fn emit_report(state: &ChemicalState, format: &ReportFormat, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            state.output(path, format)?;
            println!("✓ Report written to {}", path.display());
        }
        None => print!("{}", StateReporter::new(*format).format(state)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_parsing() {
        assert_eq!(parse_assignment("CO2@=0.1").unwrap(), ("CO2@".to_string(), 0.1));
        assert_eq!(parse_assignment(" Ca+2 = 1e-2").unwrap(), ("Ca+2".to_string(), 0.01));
        assert!(parse_assignment("CO2@").is_err());
        assert!(parse_assignment("CO2@=abc").is_err());
    }

    #[test]
    fn cli_parses_path_quantities() {
        let cli = Cli::try_parse_from([
            "eq-cli",
            "path",
            "scenario.yaml",
            "--quantity",
            "pH",
            "--quantity",
            "speciesMolality(HCO3-)",
        ])
        .unwrap();
        match cli.command {
            Commands::Path { quantities, steps, .. } => {
                assert_eq!(steps, 10);
                assert_eq!(
                    quantities,
                    vec![Quantity::Ph, Quantity::SpeciesMolality("HCO3-".to_string())]
                );
            }
            _ => panic!("wrong subcommand"),
        }
        assert!(
            Cli::try_parse_from(["eq-cli", "path", "scenario.yaml", "--quantity", "density"]).is_err()
        );
    }

    #[test]
    fn cli_parses_repeated_set() {
        let cli = Cli::try_parse_from([
            "eq-cli",
            "equilibrate",
            "scenario.yaml",
            "--set",
            "CO2@=0.1",
            "--set",
            "Calcite=2",
            "--inert",
            "Calcite",
            "--before",
            "before.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Equilibrate {
                set, inert, before, ..
            } => {
                assert_eq!(set.len(), 2);
                assert_eq!(inert, ["Calcite"]);
                assert_eq!(set[1], ("Calcite".to_string(), 2.0));
                assert_eq!(before, Some(PathBuf::from("before.txt")));
            }
            _ => panic!("wrong subcommand"),
        }
    }
}

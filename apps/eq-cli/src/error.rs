#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Scenario error: {0}")]
    Project(String),

    #[error("Chemistry error: {0}")]
    Chem(String),

    #[error("Solver error: {0}")]
    Solver(String),
}

pub type CliResult<T> = Result<T, CliError>;

impl From<eq_project::ProjectError> for CliError {
    fn from(err: eq_project::ProjectError) -> Self {
        CliError::Project(err.to_string())
    }
}

impl From<eq_chem::ChemError> for CliError {
    fn from(err: eq_chem::ChemError) -> Self {
        CliError::Chem(err.to_string())
    }
}

impl From<eq_solver::SolverError> for CliError {
    fn from(err: eq_solver::SolverError) -> Self {
        CliError::Solver(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_comes_from_a_library_error() {
        let chem = eq_chem::ChemError::UnknownSpecies {
            name: "X".to_string(),
        };
        assert!(matches!(CliError::from(chem), CliError::Chem(_)));

        let solver = eq_solver::SolverError::InvalidOptions {
            what: "steps".to_string(),
        };
        assert!(matches!(CliError::from(solver), CliError::Solver(_)));

        let project = eq_project::ProjectError::UnknownFormat {
            path: "scenario.toml".into(),
        };
        assert!(matches!(CliError::from(project), CliError::Project(_)));
    }
}

//! Chemical equilibrium solver.
//!
//! Minimises the Gibbs energy of a [`ChemicalSystem`](eq_chem::ChemicalSystem)
//! at fixed temperature and pressure subject to element (and charge) mass
//! balance, using a primal-dual interior-point Newton method. States are
//! never modified in place: every equilibration returns a new state.

pub mod equilibrium;
pub mod error;
pub mod jacobian;
pub mod newton;
pub mod optimum;
pub mod options;
pub mod path;
pub mod problem;
pub mod restrictions;
pub mod task;

pub use equilibrium::{EquilibriumResult, EquilibriumSolver};
pub use error::{SolverError, SolverResult};
pub use newton::{NewtonResult, ip_newton_solve};
pub use optimum::OptimumState;
pub use options::{EquilibriumOptions, HessianMode};
pub use path::{EquilibriumPath, PathPoint};
pub use problem::GibbsProblem;
pub use restrictions::EquilibriumRestrictions;
pub use task::EquilibriumTask;

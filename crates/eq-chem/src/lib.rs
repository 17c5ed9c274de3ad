//! eq-chem: chemical systems and states for equilibria.
//!
//! Provides:
//! - Elements, formula parsing and species definitions
//! - Phases and the `ChemicalSystem` (formula matrix, element amounts)
//! - `SpeciesAmountTable` and `ChemicalState`
//! - `GibbsModel` trait with an ideal-solution implementation
//! - Named state quantities (pH, molalities, element and phase amounts)
//! - Deterministic text reports with atomic file replacement
//!
//! # Example
//!
//! ```no_run
//! use eq_chem::{ChemicalState, ReportFormat, SpeciesAmountTable};
//! use eq_core::units::{k, pa};
//!
//! let table = SpeciesAmountTable::from_amounts([("CO2@", 0.01), ("Ca+2", 0.01)]).unwrap();
//! let mut state = ChemicalState::new(k(298.15), pa(1e5), table).unwrap();
//! state.set_species_amount("CO2@", 0.1).unwrap();
//! state
//!     .output(std::path::Path::new("state.txt"), &ReportFormat::default())
//!     .unwrap();
//! ```

pub mod amounts;
pub mod element;
pub mod error;
pub mod formula;
pub mod model;
pub mod phase;
pub mod quantity;
pub mod report;
pub mod species;
pub mod state;
pub mod system;

// Re-exports for ergonomics
pub use amounts::{AmountSnapshot, SpeciesAmountTable, Universe};
pub use element::{CHARGE_SYMBOL, Element};
pub use error::{ChemError, ChemResult};
pub use formula::Formula;
pub use model::{GibbsModel, IdealSolutionModel, PotentialPack};
pub use phase::{Phase, PhaseKind};
pub use quantity::Quantity;
pub use report::{ReportFormat, StateReporter, write_atomic};
pub use species::Species;
pub use state::{ChemicalState, StateSnapshot};
pub use system::{ChemicalSystem, SystemBuilder};

//! Chemical species definitions.

use crate::error::ChemResult;
use crate::formula::Formula;
use eq_core::units::constants::T_REF_K;
use eq_core::units::{MolarEnergy, Temperature, j_per_mol};

/// A chemically distinct substance tracked by amount.
///
/// The standard Gibbs energy is given at the reference temperature
/// (298.15 K) and extrapolated linearly with the standard entropy:
/// `g°(T) = g°(T_ref) - s° (T - T_ref)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    name: String,
    formula: Formula,
    standard_gibbs: MolarEnergy,
    /// Standard molar entropy [J/(mol·K)]
    standard_entropy: f64,
}

impl Species {
    /// Create a species with an explicit formula and zero standard Gibbs energy.
    pub fn new(name: impl Into<String>, formula: Formula) -> Self {
        Self {
            name: name.into(),
            formula,
            standard_gibbs: j_per_mol(0.0),
            standard_entropy: 0.0,
        }
    }

    /// Create a species whose name is also its formula (e.g. `"HCO3-"`, `"CO2@"`).
    pub fn from_formula(name: &str) -> ChemResult<Self> {
        Ok(Self::new(name, Formula::parse(name)?))
    }

    pub fn with_standard_gibbs(mut self, g: MolarEnergy) -> Self {
        self.standard_gibbs = g;
        self
    }

    pub fn with_standard_entropy(mut self, s_j_per_mol_k: f64) -> Self {
        self.standard_entropy = s_j_per_mol_k;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn charge(&self) -> f64 {
        self.formula.charge()
    }

    /// Molar mass [g/mol].
    pub fn molar_mass(&self) -> f64 {
        self.formula.molar_mass()
    }

    /// Standard Gibbs energy at 298.15 K.
    pub fn standard_gibbs_energy(&self) -> MolarEnergy {
        self.standard_gibbs
    }

    /// Standard molar entropy [J/(mol·K)].
    pub fn standard_entropy(&self) -> f64 {
        self.standard_entropy
    }

    /// Standard Gibbs energy at temperature `t`.
    pub fn standard_gibbs_at(&self, t: Temperature) -> MolarEnergy {
        j_per_mol(self.standard_gibbs.value - self.standard_entropy * (t.value - T_REF_K))
    }
}

//! Scenario file schema.

use serde::{Deserialize, Serialize};

/// A chemical system, an initial state and what to do with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    pub system: SystemDef,
    pub state: StateDef,
    /// Amount overrides applied to `state` before equilibrating
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub perturbations: Vec<AmountDef>,
    /// Species held out of the reaction
    #[serde(default, skip_serializing_if = "RestrictionsDef::is_empty")]
    pub restrictions: RestrictionsDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverDef>,
    #[serde(default)]
    pub report: ReportDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemDef {
    pub phases: Vec<PhaseDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseDef {
    pub name: String,
    pub kind: PhaseKindDef,
    pub species: Vec<SpeciesDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKindDef {
    Aqueous,
    Gaseous,
    Pure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeciesDef {
    pub name: String,
    /// Elemental formula; defaults to `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Standard Gibbs energy of formation at 298.15 K
    pub gibbs_j_per_mol: f64,
    #[serde(default)]
    pub entropy_j_per_mol_k: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateDef {
    pub temperature_k: f64,
    pub pressure_pa: f64,
    /// Listed in report order.
    #[serde(default)]
    pub amounts: Vec<AmountDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmountDef {
    pub species: String,
    pub mol: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestrictionsDef {
    /// Species kept at their state amounts while the rest equilibrates
    #[serde(default)]
    pub inert: Vec<String>,
}

impl RestrictionsDef {
    pub fn is_empty(&self) -> bool {
        self.inert.is_empty()
    }
}

/// Solver settings; absent fields keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barrier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_floor: Option<f64>,
    #[serde(default)]
    pub hessian: HessianDef,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HessianDef {
    #[default]
    Analytic,
    FiniteDifference {
        epsilon: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportDef {
    pub precision: usize,
}

impl Default for ReportDef {
    fn default() -> Self {
        Self { precision: 6 }
    }
}

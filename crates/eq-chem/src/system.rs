//! Chemical system: elements, species, phases and the formula matrix.

use crate::amounts::SpeciesAmountTable;
use crate::element::CHARGE_SYMBOL;
use crate::error::{ChemError, ChemResult};
use crate::phase::{Phase, PhaseKind};
use crate::species::Species;
use crate::state::ChemicalState;
use eq_core::numeric::ensure_finite;
use eq_core::units::{Pressure, Temperature};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;

/// Builder for [`ChemicalSystem`].
#[derive(Debug, Default)]
pub struct SystemBuilder {
    phases: Vec<(String, PhaseKind, Vec<Species>)>,
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phase and return its index.
    pub fn add_phase(
        &mut self,
        name: impl Into<String>,
        kind: PhaseKind,
        species: Vec<Species>,
    ) -> usize {
        self.phases.push((name.into(), kind, species));
        self.phases.len() - 1
    }

    /// Validate and assemble the system.
    pub fn build(self) -> ChemResult<ChemicalSystem> {
        let mut phase_names = HashMap::new();
        let mut species_index = HashMap::new();
        let mut species = Vec::new();
        let mut species_phase = Vec::new();
        let mut phases = Vec::new();

        for (phase_idx, (name, kind, members)) in self.phases.into_iter().enumerate() {
            if phase_names.insert(name.clone(), phase_idx).is_some() {
                return Err(ChemError::DuplicatePhase { name });
            }
            if members.is_empty() {
                return Err(ChemError::InvalidArg {
                    what: format!("phase {name} has no species"),
                });
            }
            if kind == PhaseKind::Pure && members.len() != 1 {
                return Err(ChemError::InvalidArg {
                    what: format!("pure phase {name} must hold exactly one species"),
                });
            }

            let mut indices = Vec::with_capacity(members.len());
            for s in members {
                if species_index.contains_key(s.name()) {
                    return Err(ChemError::DuplicateSpecies {
                        name: s.name().to_string(),
                    });
                }
                if s.formula().elements().is_empty() {
                    return Err(ChemError::InvalidArg {
                        what: format!("species {} has no elements", s.name()),
                    });
                }
                ensure_finite(s.standard_gibbs_energy().value, "standard Gibbs energy")?;
                ensure_finite(s.standard_entropy(), "standard entropy")?;

                let idx = species.len();
                species_index.insert(s.name().to_string(), idx);
                species_phase.push(phase_idx);
                indices.push(idx);
                species.push(s);
            }
            phases.push(Phase {
                name,
                kind,
                species: indices,
            });
        }

        let mut elements: Vec<String> = Vec::new();
        for s in &species {
            for (symbol, _) in s.formula().elements() {
                if !elements.contains(symbol) {
                    elements.push(symbol.clone());
                }
            }
        }
        if species.iter().any(|s| s.charge() != 0.0) {
            elements.push(CHARGE_SYMBOL.to_string());
        }

        let formula_matrix = DMatrix::from_fn(elements.len(), species.len(), |i, j| {
            species[j].formula().coefficient(&elements[i])
        });

        Ok(ChemicalSystem {
            elements,
            species,
            phases,
            species_phase,
            formula_matrix,
            species_index,
        })
    }
}

/// Immutable description of a chemical system.
///
/// Charge is tracked as the pseudo-element `Z` (last row of the formula
/// matrix) whenever at least one species is charged.
#[derive(Debug, Clone)]
pub struct ChemicalSystem {
    elements: Vec<String>,
    species: Vec<Species>,
    phases: Vec<Phase>,
    species_phase: Vec<usize>,
    /// elements × species
    formula_matrix: DMatrix<f64>,
    species_index: HashMap<String, usize>,
}

impl ChemicalSystem {
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn formula_matrix(&self) -> &DMatrix<f64> {
        &self.formula_matrix
    }

    pub fn index_species(&self, name: &str) -> Option<usize> {
        self.species_index.get(name).copied()
    }

    pub fn index_species_with_error(&self, name: &str) -> ChemResult<usize> {
        self.index_species(name)
            .ok_or_else(|| ChemError::UnknownSpecies {
                name: name.to_string(),
            })
    }

    pub fn index_element(&self, symbol: &str) -> Option<usize> {
        self.elements.iter().position(|e| e == symbol)
    }

    pub fn index_element_with_error(&self, symbol: &str) -> ChemResult<usize> {
        self.index_element(symbol)
            .ok_or_else(|| ChemError::UnknownElement {
                symbol: symbol.to_string(),
            })
    }

    pub fn index_phase(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name == name)
    }

    /// Phase that holds species `species_idx`.
    pub fn phase_of_species(&self, species_idx: usize) -> &Phase {
        &self.phases[self.species_phase[species_idx]]
    }

    pub fn phase_index_of_species(&self, species_idx: usize) -> usize {
        self.species_phase[species_idx]
    }

    /// A state over every species of the system (closed universe, zero amounts).
    pub fn state(&self, t: Temperature, p: Pressure) -> ChemResult<ChemicalState> {
        let table = SpeciesAmountTable::closed(self.species.iter().map(|s| s.name()))?;
        ChemicalState::new(t, p, table)
    }

    /// Species amounts of `state` in system order.
    ///
    /// Species of the system missing from the state count as zero; species
    /// of the state unknown to the system are an error.
    pub fn species_amounts(&self, state: &ChemicalState) -> ChemResult<DVector<f64>> {
        let mut n = DVector::zeros(self.species.len());
        for (name, amount) in state.species().iter() {
            n[self.index_species_with_error(name)?] = amount;
        }
        Ok(n)
    }

    /// Total amount of every element [mol], charge included.
    pub fn element_amounts(&self, state: &ChemicalState) -> ChemResult<DVector<f64>> {
        Ok(&self.formula_matrix * self.species_amounts(state)?)
    }

    pub fn element_amount(&self, state: &ChemicalState, symbol: &str) -> ChemResult<f64> {
        let idx = self.index_element_with_error(symbol)?;
        Ok(self.element_amounts(state)?[idx])
    }

    /// Element amounts restricted to the species of one phase.
    pub fn element_amounts_in_phase(
        &self,
        state: &ChemicalState,
        phase: &str,
    ) -> ChemResult<DVector<f64>> {
        let phase_idx = self.phase_with_error(phase)?;
        let mut n = self.species_amounts(state)?;
        for (j, amount) in n.iter_mut().enumerate() {
            if self.species_phase[j] != phase_idx {
                *amount = 0.0;
            }
        }
        Ok(&self.formula_matrix * n)
    }

    /// Total amount of species in one phase [mol].
    pub fn phase_amount(&self, state: &ChemicalState, phase: &str) -> ChemResult<f64> {
        let phase_idx = self.phase_with_error(phase)?;
        let n = self.species_amounts(state)?;
        Ok(self.phases[phase_idx].species.iter().map(|&j| n[j]).sum())
    }

    fn phase_with_error(&self, phase: &str) -> ChemResult<usize> {
        self.index_phase(phase).ok_or_else(|| ChemError::InvalidArg {
            what: format!("unknown phase {phase}"),
        })
    }
}

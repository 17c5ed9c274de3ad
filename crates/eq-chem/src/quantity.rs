//! Scalar quantities of a chemical state, selected by name.
//!
//! Names follow a `function(argument)` form:
//!
//! ```text
//! temperature
//! pressure
//! pH
//! speciesAmount(Calcite)
//! speciesMolality(HCO3-)
//! elementAmount(C)
//! phaseAmount(aqueous)
//! ```
//!
//! Molalities are per kilogram of the water species (`H2O`) of the aqueous
//! phase holding the species; pH is `-log10` of the `H+` molality.

use crate::error::{ChemError, ChemResult};
use crate::phase::PhaseKind;
use crate::state::ChemicalState;
use crate::system::ChemicalSystem;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quantity {
    /// [K]
    Temperature,
    /// [Pa]
    Pressure,
    Ph,
    /// [mol]
    SpeciesAmount(String),
    /// [mol/kg water]
    SpeciesMolality(String),
    /// [mol], charge included as `Z`
    ElementAmount(String),
    /// [mol]
    PhaseAmount(String),
}

impl Quantity {
    /// Value of the quantity for `state`.
    pub fn evaluate(&self, system: &ChemicalSystem, state: &ChemicalState) -> ChemResult<f64> {
        match self {
            Quantity::Temperature => Ok(state.temperature().value),
            Quantity::Pressure => Ok(state.pressure().value),
            Quantity::Ph => {
                let proton = proton_index(system)?;
                let m = molality(system, state, proton)?;
                if m <= 0.0 {
                    return Err(ChemError::NonPhysical {
                        what: "pH of a solution without H+",
                    });
                }
                Ok(-m.log10())
            }
            Quantity::SpeciesAmount(name) => {
                let j = system.index_species_with_error(name)?;
                Ok(system.species_amounts(state)?[j])
            }
            Quantity::SpeciesMolality(name) => {
                let j = system.index_species_with_error(name)?;
                molality(system, state, j)
            }
            Quantity::ElementAmount(symbol) => system.element_amount(state, symbol),
            Quantity::PhaseAmount(phase) => system.phase_amount(state, phase),
        }
    }
}

fn molality(system: &ChemicalSystem, state: &ChemicalState, species: usize) -> ChemResult<f64> {
    let phase = system.phase_of_species(species);
    if phase.kind() != PhaseKind::Aqueous {
        return Err(ChemError::InvalidArg {
            what: format!(
                "molality of {} outside an aqueous phase",
                system.species()[species].name()
            ),
        });
    }
    let water = phase
        .species_indices()
        .iter()
        .copied()
        .find(|&j| is_water(system, j))
        .ok_or_else(|| ChemError::InvalidArg {
            what: format!("phase {} has no water species", phase.name()),
        })?;
    let n = system.species_amounts(state)?;
    let kg_water = n[water] * system.species()[water].molar_mass() / 1000.0;
    if kg_water <= 0.0 {
        return Err(ChemError::NonPhysical {
            what: "molality without water",
        });
    }
    Ok(n[species] / kg_water)
}

fn is_water(system: &ChemicalSystem, j: usize) -> bool {
    let f = system.species()[j].formula();
    f.charge() == 0.0
        && f.elements().len() == 2
        && f.coefficient("H") == 2.0
        && f.coefficient("O") == 1.0
}

fn proton_index(system: &ChemicalSystem) -> ChemResult<usize> {
    (0..system.num_species())
        .find(|&j| {
            let f = system.species()[j].formula();
            system.phase_of_species(j).kind() == PhaseKind::Aqueous
                && f.charge() == 1.0
                && f.elements().len() == 1
                && f.coefficient("H") == 1.0
        })
        .ok_or_else(|| ChemError::InvalidArg {
            what: "pH needs an aqueous H+ species".to_string(),
        })
}

impl FromStr for Quantity {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "temperature" => return Ok(Quantity::Temperature),
            "pressure" => return Ok(Quantity::Pressure),
            "pH" => return Ok(Quantity::Ph),
            _ => {}
        }
        let unknown = || ChemError::InvalidArg {
            what: format!("unknown quantity {s:?}"),
        };
        // The argument may itself contain parentheses, e.g. `CO2(aq)`.
        let (function, rest) = s.split_once('(').ok_or_else(unknown)?;
        let argument = rest.strip_suffix(')').ok_or_else(unknown)?.trim();
        if argument.is_empty() {
            return Err(unknown());
        }
        let argument = argument.to_string();
        match function.trim() {
            "speciesAmount" => Ok(Quantity::SpeciesAmount(argument)),
            "speciesMolality" => Ok(Quantity::SpeciesMolality(argument)),
            "elementAmount" => Ok(Quantity::ElementAmount(argument)),
            "phaseAmount" => Ok(Quantity::PhaseAmount(argument)),
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Temperature => write!(f, "temperature"),
            Quantity::Pressure => write!(f, "pressure"),
            Quantity::Ph => write!(f, "pH"),
            Quantity::SpeciesAmount(name) => write!(f, "speciesAmount({name})"),
            Quantity::SpeciesMolality(name) => write!(f, "speciesMolality({name})"),
            Quantity::ElementAmount(symbol) => write!(f, "elementAmount({symbol})"),
            Quantity::PhaseAmount(phase) => write!(f, "phaseAmount({phase})"),
        }
    }
}

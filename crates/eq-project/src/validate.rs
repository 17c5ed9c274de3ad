//! Scenario validation logic.

use crate::assemble::solver_options;
use crate::schema::{AmountDef, PhaseKindDef, RestrictionsDef, Scenario, StateDef, SystemDef};
use eq_chem::Formula;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    let species = validate_system(&scenario.system)?;
    validate_state(&scenario.state, &species)?;
    validate_amounts(&scenario.perturbations, &species, "perturbations")?;
    validate_restrictions(&scenario.restrictions, &species)?;

    if let Some(def) = &scenario.solver {
        solver_options(def)
            .validate()
            .map_err(|e| ValidationError::InvalidValue {
                field: "solver".to_string(),
                value: format!("{def:?}"),
                reason: e.to_string(),
            })?;
    }
    if scenario.report.precision > 17 {
        return Err(ValidationError::InvalidValue {
            field: "report.precision".to_string(),
            value: scenario.report.precision.to_string(),
            reason: "at most 17 digits".to_string(),
        });
    }
    Ok(())
}

/// Returns the species names of the system.
fn validate_system(system: &SystemDef) -> Result<HashSet<&str>, ValidationError> {
    let mut phase_names = HashSet::new();
    let mut species_names = HashSet::new();

    for phase in &system.phases {
        if !phase_names.insert(phase.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: phase.name.clone(),
                context: "phases".to_string(),
            });
        }
        if phase.species.is_empty() {
            return Err(invalid(&format!("phase '{}'.species", phase.name), "[]", "phase has no species"));
        }
        if phase.kind == PhaseKindDef::Pure && phase.species.len() != 1 {
            return Err(invalid(
                &format!("phase '{}'.species", phase.name),
                &phase.species.len().to_string(),
                "pure phase holds exactly one species",
            ));
        }

        for species in &phase.species {
            if !species_names.insert(species.name.as_str()) {
                return Err(ValidationError::DuplicateId {
                    id: species.name.clone(),
                    context: format!("phase '{}' species", phase.name),
                });
            }
            let formula = species.formula.as_deref().unwrap_or(&species.name);
            if let Err(e) = Formula::parse(formula) {
                return Err(invalid(
                    &format!("species '{}'.formula", species.name),
                    formula,
                    &e.to_string(),
                ));
            }
            if !species.gibbs_j_per_mol.is_finite() {
                return Err(invalid(
                    &format!("species '{}'.gibbs_j_per_mol", species.name),
                    &species.gibbs_j_per_mol.to_string(),
                    "must be finite",
                ));
            }
            if !species.entropy_j_per_mol_k.is_finite() {
                return Err(invalid(
                    &format!("species '{}'.entropy_j_per_mol_k", species.name),
                    &species.entropy_j_per_mol_k.to_string(),
                    "must be finite",
                ));
            }
        }
    }

    Ok(species_names)
}

fn validate_state(state: &StateDef, species: &HashSet<&str>) -> Result<(), ValidationError> {
    if !(state.temperature_k.is_finite() && state.temperature_k > 0.0) {
        return Err(invalid(
            "state.temperature_k",
            &state.temperature_k.to_string(),
            "must be positive",
        ));
    }
    if !(state.pressure_pa.is_finite() && state.pressure_pa > 0.0) {
        return Err(invalid(
            "state.pressure_pa",
            &state.pressure_pa.to_string(),
            "must be positive",
        ));
    }

    let mut seen = HashSet::new();
    for amount in &state.amounts {
        if !seen.insert(amount.species.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: amount.species.clone(),
                context: "state amounts".to_string(),
            });
        }
    }
    validate_amounts(&state.amounts, species, "state amounts")
}

fn validate_amounts(
    amounts: &[AmountDef],
    species: &HashSet<&str>,
    context: &str,
) -> Result<(), ValidationError> {
    for amount in amounts {
        if !species.contains(amount.species.as_str()) {
            return Err(ValidationError::MissingReference {
                id: amount.species.clone(),
                context: context.to_string(),
            });
        }
        if !(amount.mol.is_finite() && amount.mol >= 0.0) {
            return Err(invalid(
                &format!("{context} '{}'", amount.species),
                &amount.mol.to_string(),
                "amount must be finite and non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_restrictions(
    restrictions: &RestrictionsDef,
    species: &HashSet<&str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in &restrictions.inert {
        if !species.contains(name.as_str()) {
            return Err(ValidationError::MissingReference {
                id: name.clone(),
                context: "restrictions.inert".to_string(),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: name.clone(),
                context: "restrictions.inert".to_string(),
            });
        }
    }
    Ok(())
}

fn invalid(field: &str, value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

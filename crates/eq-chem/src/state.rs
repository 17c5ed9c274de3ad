//! Chemical state: temperature, pressure and species amounts.

use crate::amounts::{AmountSnapshot, SpeciesAmountTable};
use crate::error::{ChemError, ChemResult};
use crate::report::{ReportFormat, StateReporter};
use eq_core::numeric::{Tolerances, all_nearly_equal, nearly_equal};
use eq_core::units::{Pressure, Temperature};
use std::path::Path;

/// Temperature, pressure and one exclusively owned species amount table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalState {
    t: Temperature,
    p: Pressure,
    amounts: SpeciesAmountTable,
}

impl ChemicalState {
    /// Create a state from temperature, pressure and amounts.
    ///
    /// Validates that temperature and pressure are positive and finite.
    pub fn new(t: Temperature, p: Pressure, amounts: SpeciesAmountTable) -> ChemResult<Self> {
        validate_temperature(t)?;
        validate_pressure(p)?;
        Ok(Self { t, p, amounts })
    }

    pub fn temperature(&self) -> Temperature {
        self.t
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    pub fn set_temperature(&mut self, t: Temperature) -> ChemResult<()> {
        validate_temperature(t)?;
        self.t = t;
        Ok(())
    }

    pub fn set_pressure(&mut self, p: Pressure) -> ChemResult<()> {
        validate_pressure(p)?;
        self.p = p;
        Ok(())
    }

    /// Species amount table, read-only.
    pub fn species(&self) -> &SpeciesAmountTable {
        &self.amounts
    }

    /// Amount of one species [mol].
    pub fn species_amount(&self, name: &str) -> ChemResult<f64> {
        self.amounts.get(name)
    }

    /// Overwrite the amount of one species; same failure modes as
    /// [`SpeciesAmountTable::set`].
    pub fn set_species_amount(&mut self, name: &str, amount: f64) -> ChemResult<()> {
        self.amounts.set(name, amount)
    }

    /// Overwrite an amount without validation (see [`SpeciesAmountTable::set_unchecked`]).
    pub fn set_species_amount_unchecked(&mut self, name: &str, amount: f64) -> ChemResult<()> {
        self.amounts.set_unchecked(name, amount)
    }

    /// Same conditions and species order, amounts equal within `tol`.
    pub fn approx_eq(&self, other: &ChemicalState, tol: Tolerances) -> bool {
        if !self.amounts.names().eq(other.amounts.names()) {
            return false;
        }
        let a: Vec<f64> = self.amounts.iter().map(|(_, v)| v).collect();
        let b: Vec<f64> = other.amounts.iter().map(|(_, v)| v).collect();
        nearly_equal(self.t.value, other.t.value, tol)
            && nearly_equal(self.p.value, other.p.value, tol)
            && all_nearly_equal(&a, &b, tol)
    }

    /// Immutable copy suitable for handing to another thread.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            t: self.t,
            p: self.p,
            amounts: self.amounts.snapshot(),
        }
    }

    /// Write the text report of this state to `path`, replacing any existing file.
    pub fn output(&self, path: &Path, format: &ReportFormat) -> ChemResult<()> {
        StateReporter::new(*format).write(self, path)
    }
}

fn validate_temperature(t: Temperature) -> ChemResult<()> {
    if !t.value.is_finite() || t.value <= 0.0 {
        return Err(ChemError::NonPhysical {
            what: "temperature must be positive and finite",
        });
    }
    Ok(())
}

fn validate_pressure(p: Pressure) -> ChemResult<()> {
    if !p.value.is_finite() || p.value <= 0.0 {
        return Err(ChemError::NonPhysical {
            what: "pressure must be positive and finite",
        });
    }
    Ok(())
}

/// Frozen copy of a [`ChemicalState`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    t: Temperature,
    p: Pressure,
    amounts: AmountSnapshot,
}

impl StateSnapshot {
    pub fn temperature(&self) -> Temperature {
        self.t
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    pub fn amounts(&self) -> &AmountSnapshot {
        &self.amounts
    }

    pub fn to_state(&self) -> ChemResult<ChemicalState> {
        Ok(ChemicalState {
            t: self.t,
            p: self.p,
            amounts: self.amounts.to_table()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eq_core::units::{k, pa};

    fn table() -> SpeciesAmountTable {
        SpeciesAmountTable::from_amounts([("CO2@", 0.01), ("Ca+2", 0.01), ("Calcite", 1.0)])
            .unwrap()
    }

    #[test]
    fn create_valid_state() {
        let state = ChemicalState::new(k(298.15), pa(1e5), table()).unwrap();
        assert_eq!(state.temperature().value, 298.15);
        assert_eq!(state.pressure().value, 1e5);
        assert_eq!(state.species().len(), 3);
    }

    #[test]
    fn reject_non_positive_conditions() {
        assert!(ChemicalState::new(k(0.0), pa(1e5), table()).is_err());
        assert!(ChemicalState::new(k(298.15), pa(-1.0), table()).is_err());
        assert!(ChemicalState::new(k(f64::NAN), pa(1e5), table()).is_err());
    }

    #[test]
    fn perturb_one_species() {
        let mut state = ChemicalState::new(k(298.15), pa(1e5), table()).unwrap();
        state.set_species_amount("CO2@", 0.1).unwrap();
        assert_eq!(state.species_amount("CO2@").unwrap(), 0.1);
        assert_eq!(state.species_amount("Ca+2").unwrap(), 0.01);
        assert_eq!(state.species_amount("Calcite").unwrap(), 1.0);
    }

    #[test]
    fn setters_validate() {
        let mut state = ChemicalState::new(k(298.15), pa(1e5), table()).unwrap();
        assert!(state.set_temperature(k(-5.0)).is_err());
        assert!(state.set_pressure(pa(0.0)).is_err());
        state.set_temperature(k(350.0)).unwrap();
        assert_eq!(state.temperature().value, 350.0);
    }

    #[test]
    fn approx_eq_compares_order_and_amounts() {
        let state = ChemicalState::new(k(298.15), pa(1e5), table()).unwrap();
        let mut close = state.clone();
        close.set_species_amount("Calcite", 1.0 + 1e-12).unwrap();
        assert!(state.approx_eq(&close, Tolerances::AMOUNTS));

        close.set_species_amount("Calcite", 1.1).unwrap();
        assert!(!state.approx_eq(&close, Tolerances::AMOUNTS));

        let reordered = SpeciesAmountTable::from_amounts([("Ca+2", 0.01), ("CO2@", 0.01), ("Calcite", 1.0)])
            .unwrap();
        let reordered = ChemicalState::new(k(298.15), pa(1e5), reordered).unwrap();
        assert!(!state.approx_eq(&reordered, Tolerances::AMOUNTS));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut state = ChemicalState::new(k(298.15), pa(1e5), table()).unwrap();
        let snap = state.snapshot();
        state.set_species_amount("Calcite", 2.0).unwrap();
        let restored = snap.to_state().unwrap();
        assert_eq!(restored.species_amount("Calcite").unwrap(), 1.0);
        assert_eq!(restored.temperature(), state.temperature());
    }
}

//! Species held out of the reaction.

use eq_chem::{ChemResult, ChemicalSystem};

/// Species whose amounts stay fixed while the rest of the state
/// re-equilibrates.
///
/// Inert species keep contributing to phase totals and to the element
/// amounts of the result, but no reaction may produce or consume them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquilibriumRestrictions {
    inert: Vec<String>,
}

impl EquilibriumRestrictions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `species` at its input amount.
    pub fn cannot_react(&mut self, species: impl Into<String>) -> &mut Self {
        let species = species.into();
        if !self.inert.contains(&species) {
            self.inert.push(species);
        }
        self
    }

    /// Let `species` react again.
    pub fn can_react(&mut self, species: &str) -> &mut Self {
        self.inert.retain(|s| s != species);
        self
    }

    pub fn inert_species(&self) -> impl Iterator<Item = &str> + '_ {
        self.inert.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inert.is_empty()
    }

    /// Inert flags in system species order.
    pub(crate) fn inert_flags(&self, system: &ChemicalSystem) -> ChemResult<Vec<bool>> {
        let mut flags = vec![false; system.num_species()];
        for name in &self.inert {
            flags[system.index_species_with_error(name)?] = true;
        }
        Ok(flags)
    }
}

impl<S: Into<String>> FromIterator<S> for EquilibriumRestrictions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut restrictions = Self::new();
        for species in iter {
            restrictions.cannot_react(species);
        }
        restrictions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eq_chem::{ChemError, PhaseKind, Species, SystemBuilder};

    fn system() -> ChemicalSystem {
        let mut builder = SystemBuilder::new();
        builder.add_phase(
            "gas",
            PhaseKind::Gaseous,
            vec![
                Species::from_formula("NO2").unwrap(),
                Species::from_formula("N2O4").unwrap(),
            ],
        );
        builder.build().unwrap()
    }

    #[test]
    fn duplicates_collapse() {
        let mut r = EquilibriumRestrictions::new();
        r.cannot_react("NO2").cannot_react("NO2");
        assert_eq!(r.inert_species().collect::<Vec<_>>(), ["NO2"]);
        r.can_react("NO2");
        assert!(r.is_empty());
    }

    #[test]
    fn flags_follow_system_order() {
        let r: EquilibriumRestrictions = ["N2O4"].into_iter().collect();
        assert_eq!(r.inert_flags(&system()).unwrap(), vec![false, true]);
    }

    #[test]
    fn unknown_species_rejected() {
        let r: EquilibriumRestrictions = ["O3"].into_iter().collect();
        assert!(matches!(
            r.inert_flags(&system()),
            Err(ChemError::UnknownSpecies { .. })
        ));
    }
}

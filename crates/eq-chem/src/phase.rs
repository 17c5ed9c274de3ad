//! Phase definitions.

/// How the species of a phase mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Ideal aqueous solution (activity = mole fraction).
    Aqueous,
    /// Ideal gas mixture (activity = mole fraction × P/P°).
    Gaseous,
    /// Pure condensed phase with a single species (activity = 1).
    Pure,
}

impl PhaseKind {
    pub fn is_mixture(self) -> bool {
        !matches!(self, PhaseKind::Pure)
    }

    pub fn key(self) -> &'static str {
        match self {
            PhaseKind::Aqueous => "aqueous",
            PhaseKind::Gaseous => "gaseous",
            PhaseKind::Pure => "pure",
        }
    }
}

/// A phase of a [`ChemicalSystem`](crate::ChemicalSystem).
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub(crate) name: String,
    pub(crate) kind: PhaseKind,
    /// Indices into the system species list.
    pub(crate) species: Vec<usize>,
}

impl Phase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    pub fn species_indices(&self) -> &[usize] {
        &self.species
    }
}

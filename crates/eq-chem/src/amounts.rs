//! Species amount table: the ground data of a chemical state.

use crate::error::{ChemError, ChemResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Whether a table accepts species it was not created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Universe {
    /// `set` on an unknown name inserts it.
    Open,
    /// `set` on an unknown name fails with `UnknownSpecies`.
    Closed,
}

/// Ordered mapping from species name to amount [mol].
///
/// Names are unique and amounts are finite and non-negative for every
/// validated entry point. Insertion order is preserved and is the order
/// used by reports.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesAmountTable {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
    universe: Universe,
}

impl Default for SpeciesAmountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeciesAmountTable {
    /// Empty open-universe table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            universe: Universe::Open,
        }
    }

    /// Closed-universe table over `names`, all amounts zero.
    pub fn closed<I, S>(names: I) -> ChemResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for name in names {
            table.insert_new(name.into(), 0.0)?;
        }
        table.universe = Universe::Closed;
        Ok(table)
    }

    /// Open-universe table from `(name, amount)` pairs, in order.
    pub fn from_amounts<I, S>(amounts: I) -> ChemResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, amount) in amounts {
            let name = name.into();
            validate_amount(&name, amount)?;
            table.insert_new(name, amount)?;
        }
        Ok(table)
    }

    fn insert_new(&mut self, name: String, amount: f64) -> ChemResult<()> {
        if self.index.contains_key(&name) {
            return Err(ChemError::DuplicateSpecies { name });
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, amount));
        Ok(())
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    /// Amount of `name` [mol].
    pub fn get(&self, name: &str) -> ChemResult<f64> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].1)
            .ok_or_else(|| ChemError::UnknownSpecies {
                name: name.to_string(),
            })
    }

    /// Overwrite the amount of `name`.
    ///
    /// Fails with `InvalidAmount` for negative or non-finite amounts and with
    /// `UnknownSpecies` for unknown names in a closed table. On failure the
    /// table is left unchanged.
    pub fn set(&mut self, name: &str, amount: f64) -> ChemResult<()> {
        validate_amount(name, amount)?;
        self.set_unchecked(name, amount)
    }

    /// Like [`set`](Self::set) but without amount validation.
    ///
    /// Intended for loaders that import externally computed states; the
    /// solver rejects such states with `InfeasibleConstraints` if an amount
    /// turns out negative.
    pub fn set_unchecked(&mut self, name: &str, amount: f64) -> ChemResult<()> {
        match self.index.get(name) {
            Some(&i) => {
                self.entries[i].1 = amount;
                Ok(())
            }
            None if self.universe == Universe::Open => self.insert_new(name.to_string(), amount),
            None => Err(ChemError::UnknownSpecies {
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, amount)` in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(n, a)| (n.as_str(), *a))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Sum of all amounts [mol].
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, a)| a).sum()
    }

    /// Immutable copy of the current contents.
    pub fn snapshot(&self) -> AmountSnapshot {
        AmountSnapshot {
            entries: self.entries.clone().into(),
            universe: self.universe,
        }
    }
}

fn validate_amount(name: &str, amount: f64) -> ChemResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ChemError::InvalidAmount {
            name: name.to_string(),
            amount,
        });
    }
    Ok(())
}

/// Frozen copy of a [`SpeciesAmountTable`]; cheap to clone and `Send + Sync`.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountSnapshot {
    entries: Arc<[(String, f64)]>,
    universe: Universe,
}

impl AmountSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| *a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(n, a)| (n.as_str(), *a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    /// Rebuild a mutable table with the same order, amounts and universe.
    ///
    /// Amounts are copied verbatim, including invalid ones that were written
    /// through `set_unchecked`.
    pub fn to_table(&self) -> ChemResult<SpeciesAmountTable> {
        let mut table = SpeciesAmountTable::new();
        for (name, amount) in self.entries.iter() {
            table.insert_new(name.clone(), *amount)?;
        }
        table.universe = self.universe;
        Ok(table)
    }
}

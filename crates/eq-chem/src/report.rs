//! Deterministic text reports of chemical states.
//!
//! Layout:
//!
//! ```text
//! Temperature [K] 298.150000
//! Pressure [Pa] 100000.000000
//! CO2@ 1.000000e-1
//! Ca+2 1.000000e-2
//! ```
//!
//! Species appear in table order, never re-sorted.

use crate::error::{ChemError, ChemResult};
use crate::quantity::Quantity;
use crate::state::ChemicalState;
use crate::system::ChemicalSystem;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use tracing::debug;

/// Numeric formatting of reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFormat {
    /// Digits after the decimal point (temperature and pressure in fixed
    /// notation, amounts in scientific notation).
    pub precision: usize,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self { precision: 6 }
    }
}

/// Formats chemical states as text and writes them to disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateReporter {
    format: ReportFormat,
}

impl StateReporter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, state: &ChemicalState) -> String {
        let prec = self.format.precision;
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "Temperature [K] {:.prec$}", state.temperature().value);
        let _ = writeln!(out, "Pressure [Pa] {:.prec$}", state.pressure().value);
        for (name, amount) in state.species().iter() {
            let _ = writeln!(out, "{name} {amount:.prec$e}");
        }
        out
    }

    /// Tabulate a sequence of states, one row per `(parameter, state)`.
    ///
    /// Columns follow the species order of the first state; every later
    /// state must contain those species.
    pub fn format_series(&self, rows: &[(f64, &ChemicalState)]) -> ChemResult<String> {
        let prec = self.format.precision;
        let mut out = String::new();
        let Some((_, first)) = rows.first() else {
            return Ok(out);
        };
        let names: Vec<&str> = first.species().names().collect();

        out.push_str("t T[K] P[Pa]");
        for name in &names {
            out.push(' ');
            out.push_str(name);
        }
        out.push('\n');

        for (param, state) in rows {
            let _ = write!(
                out,
                "{param:.prec$} {:.prec$} {:.prec$}",
                state.temperature().value,
                state.pressure().value
            );
            for name in &names {
                let _ = write!(out, " {:.prec$e}", state.species_amount(name)?);
            }
            out.push('\n');
        }
        Ok(out)
    }

    /// Tabulate selected quantities of a sequence of states, one row per
    /// `(parameter, state)` and one column per quantity.
    pub fn format_quantities(
        &self,
        system: &ChemicalSystem,
        quantities: &[Quantity],
        rows: &[(f64, &ChemicalState)],
    ) -> ChemResult<String> {
        let prec = self.format.precision;
        let mut out = String::from("t");
        for q in quantities {
            let _ = write!(out, " {q}");
        }
        out.push('\n');
        for (param, state) in rows {
            let _ = write!(out, "{param:.prec$}");
            for q in quantities {
                let _ = write!(out, " {:.prec$e}", q.evaluate(system, state)?);
            }
            out.push('\n');
        }
        Ok(out)
    }

    /// Format `state` and atomically replace `path` with the result.
    pub fn write(&self, state: &ChemicalState, path: &Path) -> ChemResult<()> {
        write_atomic(path, &self.format(state))
    }
}

/// Write `contents` to a temporary file next to `path`, then rename it over
/// `path`. A failed write never leaves a truncated file at `path`.
pub fn write_atomic(path: &Path, contents: &str) -> ChemResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ChemError::io(path, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| ChemError::io(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| ChemError::io(path, e))?;
    tmp.persist(path).map_err(|e| ChemError::io(path, e.error))?;
    debug!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(())
}

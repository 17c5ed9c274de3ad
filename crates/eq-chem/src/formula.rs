//! Chemical formula parsing.
//!
//! Accepts the usual geochemical notations: `H2O`, `CaCO3`, `Fe(OH)2+`,
//! `Ca+2`, `Ca++`, `CO3--`, `HCO3-`, and strips aqueous/phase markers such as
//! `CO2@`, `CO2(aq)` or `CO2(g)`.

use crate::element;
use crate::error::{ChemError, ChemResult};

const PHASE_TAGS: [&str; 5] = ["(aq)", "(g)", "(l)", "(s)", "(cr)"];

/// Elemental composition and electrical charge of one species.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    elements: Vec<(String, f64)>,
    charge: f64,
}

impl Formula {
    /// Parse a formula string.
    pub fn parse(formula: &str) -> ChemResult<Self> {
        let invalid = |reason| ChemError::Formula {
            formula: formula.to_string(),
            reason,
        };

        let mut body = formula.trim();
        if let Some(stripped) = body.strip_suffix('@') {
            body = stripped;
        }
        for tag in PHASE_TAGS {
            if let Some(stripped) = body.strip_suffix(tag) {
                body = stripped;
                break;
            }
        }

        let (body, charge) = match body.find(['+', '-']) {
            Some(idx) => (
                &body[..idx],
                parse_charge(&body[idx..]).ok_or_else(|| invalid("malformed charge suffix"))?,
            ),
            None => (body, 0.0),
        };

        if body.is_empty() {
            return Err(invalid("empty formula"));
        }

        let chars: Vec<char> = body.chars().collect();
        let mut pos = 0;
        let mut elements = Vec::new();
        parse_group(&chars, &mut pos, 1.0, &mut elements).map_err(invalid)?;
        if pos != chars.len() {
            return Err(invalid("unbalanced parenthesis"));
        }

        Ok(Self { elements, charge })
    }

    /// Build a formula from an explicit element list.
    ///
    /// Repeated symbols are merged; zero coefficients are dropped.
    pub fn from_elements(
        elements: impl IntoIterator<Item = (String, f64)>,
        charge: f64,
    ) -> ChemResult<Self> {
        if !charge.is_finite() {
            return Err(ChemError::NonPhysical {
                what: "non-finite charge",
            });
        }
        let mut merged: Vec<(String, f64)> = Vec::new();
        for (symbol, coeff) in elements {
            if symbol.is_empty() || symbol == element::CHARGE_SYMBOL {
                return Err(ChemError::InvalidArg {
                    what: format!("invalid element symbol {symbol:?}"),
                });
            }
            if !coeff.is_finite() || coeff < 0.0 {
                return Err(ChemError::NonPhysical {
                    what: "element coefficient must be finite and non-negative",
                });
            }
            accumulate(&mut merged, &symbol, coeff);
        }
        merged.retain(|(_, c)| *c > 0.0);
        Ok(Self {
            elements: merged,
            charge,
        })
    }

    /// Elements and their coefficients, in order of first appearance.
    pub fn elements(&self) -> &[(String, f64)] {
        &self.elements
    }

    /// Electrical charge (elementary charges per formula unit).
    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// Coefficient of an element (0.0 if absent).
    pub fn coefficient(&self, symbol: &str) -> f64 {
        if symbol == element::CHARGE_SYMBOL {
            return self.charge;
        }
        self.elements
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }

    /// Molar mass [g/mol]; symbols outside the element table count as zero.
    pub fn molar_mass(&self) -> f64 {
        self.elements
            .iter()
            .map(|(symbol, coeff)| element::atomic_mass(symbol).unwrap_or(0.0) * coeff)
            .sum()
    }
}

fn accumulate(elements: &mut Vec<(String, f64)>, symbol: &str, coeff: f64) {
    match elements.iter_mut().find(|(s, _)| s == symbol) {
        Some((_, c)) => *c += coeff,
        None => elements.push((symbol.to_string(), coeff)),
    }
}

/// `+`, `++`, `-2`, `+3` ...
fn parse_charge(tail: &str) -> Option<f64> {
    let mut chars = tail.chars();
    let first = chars.next()?;
    let sign = match first {
        '+' => 1.0,
        '-' => -1.0,
        _ => return None,
    };
    let rest = chars.as_str();
    if rest.is_empty() {
        return Some(sign);
    }
    if rest.chars().all(|c| c.is_ascii_digit()) {
        return rest.parse::<u32>().ok().map(|z| sign * f64::from(z));
    }
    if rest.chars().all(|c| c == first) {
        return Some(sign * (rest.len() + 1) as f64);
    }
    None
}

fn parse_count(chars: &[char], pos: &mut usize) -> Result<f64, &'static str> {
    let start = *pos;
    while *pos < chars.len() && chars[*pos].is_ascii_digit() {
        *pos += 1;
    }
    if *pos == start {
        return Ok(1.0);
    }
    chars[start..*pos]
        .iter()
        .collect::<String>()
        .parse::<u32>()
        .map(f64::from)
        .map_err(|_| "element count out of range")
}

fn parse_group(
    chars: &[char],
    pos: &mut usize,
    multiplier: f64,
    out: &mut Vec<(String, f64)>,
) -> Result<(), &'static str> {
    while *pos < chars.len() {
        let c = chars[*pos];
        if c == '(' {
            *pos += 1;
            let mut inner = Vec::new();
            parse_group(chars, pos, 1.0, &mut inner)?;
            if *pos >= chars.len() || chars[*pos] != ')' {
                return Err("unbalanced parenthesis");
            }
            *pos += 1;
            let count = parse_count(chars, pos)?;
            for (symbol, coeff) in inner {
                accumulate(out, &symbol, coeff * count * multiplier);
            }
        } else if c == ')' {
            return Ok(());
        } else if c.is_ascii_uppercase() {
            let start = *pos;
            *pos += 1;
            while *pos < chars.len() && chars[*pos].is_ascii_lowercase() {
                *pos += 1;
            }
            let symbol: String = chars[start..*pos].iter().collect();
            if element::lookup(&symbol).is_none() {
                return Err("unknown element symbol");
            }
            let count = parse_count(chars, pos)?;
            accumulate(out, &symbol, count * multiplier);
        } else {
            return Err("unexpected character");
        }
    }
    Ok(())
}

//! Chemical elements and atomic masses.

/// Symbol of the pseudo-element that carries electrical charge.
pub const CHARGE_SYMBOL: &str = "Z";

/// A chemical element known to the formula parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    /// Atomic mass [g/mol]
    pub atomic_mass: f64,
}

impl Element {
    const fn new(symbol: &'static str, atomic_mass: f64) -> Self {
        Self {
            symbol,
            atomic_mass,
        }
    }
}

const ELEMENTS: &[Element] = &[
    Element::new("H", 1.008),
    Element::new("He", 4.0026),
    Element::new("Li", 6.94),
    Element::new("B", 10.81),
    Element::new("C", 12.011),
    Element::new("N", 14.007),
    Element::new("O", 15.999),
    Element::new("F", 18.998),
    Element::new("Ne", 20.18),
    Element::new("Na", 22.99),
    Element::new("Mg", 24.305),
    Element::new("Al", 26.982),
    Element::new("Si", 28.085),
    Element::new("P", 30.974),
    Element::new("S", 32.06),
    Element::new("Cl", 35.45),
    Element::new("Ar", 39.948),
    Element::new("K", 39.098),
    Element::new("Ca", 40.078),
    Element::new("Ti", 47.867),
    Element::new("Cr", 51.996),
    Element::new("Mn", 54.938),
    Element::new("Fe", 55.845),
    Element::new("Co", 58.933),
    Element::new("Ni", 58.693),
    Element::new("Cu", 63.546),
    Element::new("Zn", 65.38),
    Element::new("Br", 79.904),
    Element::new("Sr", 87.62),
    Element::new("Ag", 107.87),
    Element::new("Cd", 112.41),
    Element::new("I", 126.9),
    Element::new("Ba", 137.33),
    Element::new("Hg", 200.59),
    Element::new("Pb", 207.2),
    Element::new("U", 238.03),
];

/// Look up an element by symbol (case-sensitive).
pub fn lookup(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Atomic mass [g/mol], `None` for unknown symbols and for the charge pseudo-element.
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    lookup(symbol).map(|e| e.atomic_mass)
}

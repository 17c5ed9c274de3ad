// eq-core/src/units.rs

use uom::si::f64::{
    AmountOfSubstance as UomAmountOfSubstance, MolarEnergy as UomMolarEnergy,
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Amount = UomAmountOfSubstance;
pub type MolarEnergy = UomMolarEnergy;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn mol(v: f64) -> Amount {
    use uom::si::amount_of_substance::mole;
    Amount::new::<mole>(v)
}

#[inline]
pub fn j_per_mol(v: f64) -> MolarEnergy {
    use uom::si::molar_energy::joule_per_mole;
    MolarEnergy::new::<joule_per_mole>(v)
}

pub mod constants {
    use super::*;

    /// Universal gas constant [J/(mol·K)].
    pub const R_J_PER_MOL_K: f64 = 8.314_462_618;

    /// Standard-state reference temperature [K].
    pub const T_REF_K: f64 = 298.15;

    /// Standard-state pressure [Pa].
    pub const P_STD_PA: f64 = 100_000.0;

    #[inline]
    pub fn t_ref() -> Temperature {
        k(T_REF_K)
    }

    #[inline]
    pub fn p_std() -> Pressure {
        pa(P_STD_PA)
    }
}

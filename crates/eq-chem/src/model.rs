//! Gibbs energy model trait and the ideal-solution implementation.

use crate::error::{ChemError, ChemResult};
use crate::phase::PhaseKind;
use crate::system::ChemicalSystem;
use eq_core::units::constants::{P_STD_PA, R_J_PER_MOL_K};
use eq_core::units::{Pressure, Temperature};
use nalgebra::{DMatrix, DVector};

/// Amounts below this are clamped before taking logarithms.
const LN_FLOOR: f64 = 1e-300;

/// Normalized chemical potentials and their derivatives at one composition.
///
/// Evaluating both in one call lets models share intermediate terms
/// (phase totals, activity coefficients).
#[derive(Clone, Debug)]
pub struct PotentialPack {
    /// μᵢ / RT for every species of the system
    pub mu: DVector<f64>,
    /// ∂(μᵢ/RT)/∂nⱼ
    pub hessian: DMatrix<f64>,
}

/// Trait for Gibbs energy models.
///
/// Implementations must be thread-safe (Send + Sync) so one model can serve
/// concurrent equilibrations. Amount vectors are in system species order.
pub trait GibbsModel: Send + Sync {
    /// Get the model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Chemical potentials and their Hessian at amounts `n`.
    fn evaluate(
        &self,
        system: &ChemicalSystem,
        t: Temperature,
        p: Pressure,
        n: &DVector<f64>,
    ) -> ChemResult<PotentialPack>;

    /// μᵢ / RT only.
    fn chemical_potentials(
        &self,
        system: &ChemicalSystem,
        t: Temperature,
        p: Pressure,
        n: &DVector<f64>,
    ) -> ChemResult<DVector<f64>> {
        Ok(self.evaluate(system, t, p, n)?.mu)
    }

    /// Total Gibbs energy G = Σ nᵢ μᵢ [J].
    ///
    /// Species with zero amount contribute nothing.
    fn gibbs_energy(
        &self,
        system: &ChemicalSystem,
        t: Temperature,
        p: Pressure,
        n: &DVector<f64>,
    ) -> ChemResult<f64> {
        let mu = self.chemical_potentials(system, t, p, n)?;
        let g_rt: f64 = n
            .iter()
            .zip(mu.iter())
            .filter(|(ni, _)| **ni > 0.0)
            .map(|(ni, mi)| ni * mi)
            .sum();
        Ok(g_rt * R_J_PER_MOL_K * t.value)
    }
}

/// Ideal mixing in every multi-species phase.
///
/// - aqueous: μᵢ/RT = gᵢ°/RT + ln xᵢ
/// - gaseous: μᵢ/RT = gᵢ°/RT + ln xᵢ + ln(P/P°)
/// - pure:    μᵢ/RT = gᵢ°/RT
#[derive(Debug, Clone, Copy, Default)]
pub struct IdealSolutionModel;

impl IdealSolutionModel {
    pub fn new() -> Self {
        Self
    }
}

impl GibbsModel for IdealSolutionModel {
    fn name(&self) -> &str {
        "ideal-solution"
    }

    fn evaluate(
        &self,
        system: &ChemicalSystem,
        t: Temperature,
        p: Pressure,
        n: &DVector<f64>,
    ) -> ChemResult<PotentialPack> {
        let ns = system.num_species();
        if n.len() != ns {
            return Err(ChemError::InvalidArg {
                what: format!("amount vector has {} entries, system has {ns}", n.len()),
            });
        }
        if !(t.value > 0.0 && p.value > 0.0) {
            return Err(ChemError::NonPhysical {
                what: "temperature and pressure must be positive",
            });
        }

        let rt = R_J_PER_MOL_K * t.value;
        let ln_p = (p.value / P_STD_PA).ln();
        let mut mu = DVector::zeros(ns);
        let mut hessian = DMatrix::zeros(ns, ns);

        for phase in system.phases() {
            let members = phase.species_indices();
            let total: f64 = members.iter().map(|&j| n[j].max(0.0)).sum::<f64>().max(LN_FLOOR);

            for &i in members {
                let g0 = system.species()[i].standard_gibbs_at(t).value / rt;
                mu[i] = match phase.kind() {
                    PhaseKind::Pure => g0,
                    PhaseKind::Aqueous => g0 + (n[i].max(LN_FLOOR) / total).ln(),
                    PhaseKind::Gaseous => g0 + (n[i].max(LN_FLOOR) / total).ln() + ln_p,
                };
            }

            if phase.kind().is_mixture() {
                for &i in members {
                    for &j in members {
                        hessian[(i, j)] = -1.0 / total;
                    }
                    hessian[(i, i)] += 1.0 / n[i].max(LN_FLOOR);
                }
            }
        }

        Ok(PotentialPack { mu, hessian })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseKind;
    use crate::species::Species;
    use crate::system::SystemBuilder;
    use eq_core::units::{j_per_mol, k, pa};

    fn gas_system() -> ChemicalSystem {
        let mut b = SystemBuilder::new();
        b.add_phase(
            "gas",
            PhaseKind::Gaseous,
            vec![
                Species::from_formula("NO2").unwrap().with_standard_gibbs(j_per_mol(51_300.0)),
                Species::from_formula("N2O4").unwrap().with_standard_gibbs(j_per_mol(97_900.0)),
            ],
        );
        b.build().unwrap()
    }

    #[test]
    fn ideal_gas_potentials() {
        let system = gas_system();
        let t = k(298.15);
        let n = DVector::from_vec(vec![1.0, 3.0]);
        let pack = IdealSolutionModel.evaluate(&system, t, pa(2e5), &n).unwrap();
        let rt = R_J_PER_MOL_K * 298.15;
        let expected = 51_300.0 / rt + (0.25_f64).ln() + 2.0_f64.ln();
        assert!((pack.mu[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn hessian_is_symmetric_and_singular_along_n() {
        let system = gas_system();
        let n = DVector::from_vec(vec![0.4, 1.7]);
        let pack = IdealSolutionModel
            .evaluate(&system, k(350.0), pa(1e5), &n)
            .unwrap();
        assert!((pack.hessian[(0, 1)] - pack.hessian[(1, 0)]).abs() < 1e-15);
        // Gibbs-Duhem: H n = 0 for an ideal mixture
        let hn = &pack.hessian * &n;
        assert!(hn.amax() < 1e-12);
    }

    #[test]
    fn hessian_matches_finite_difference() {
        let system = gas_system();
        let t = k(320.0);
        let p = pa(1e5);
        let n = DVector::from_vec(vec![0.3, 0.9]);
        let pack = IdealSolutionModel.evaluate(&system, t, p, &n).unwrap();
        let h = 1e-7;
        for j in 0..2 {
            let mut np = n.clone();
            np[j] += h;
            let mu_p = IdealSolutionModel.chemical_potentials(&system, t, p, &np).unwrap();
            for i in 0..2 {
                let fd = (mu_p[i] - pack.mu[i]) / h;
                assert!((fd - pack.hessian[(i, j)]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn gibbs_energy_skips_zero_amounts() {
        let system = gas_system();
        let n = DVector::from_vec(vec![1.0, 0.0]);
        let g = IdealSolutionModel
            .gibbs_energy(&system, k(298.15), pa(1e5), &n)
            .unwrap();
        assert!((g - 51_300.0).abs() < 1e-6);
    }

    #[test]
    fn wrong_length_rejected() {
        let system = gas_system();
        let n = DVector::from_vec(vec![1.0]);
        assert!(IdealSolutionModel
            .evaluate(&system, k(298.15), pa(1e5), &n)
            .is_err());
    }
}

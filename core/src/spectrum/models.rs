use serde::{Deserialize, Serialize};

use crate::map::{MapError, MapResult};

/// Steps per decade for numeric integration in log energy.
const INTEGRAL_STEPS_PER_DECADE: f64 = 100.0;

/// Differential spectrum in energy (TeV).
pub trait SpectralModel {
    fn evaluate(&self, energy_tev: f64) -> f64;

    /// Integral between `emin` and `emax`. The default integrates numerically
    /// with the trapezoid rule on a log grid.
    fn integral(&self, emin_tev: f64, emax_tev: f64) -> f64 {
        if !(emax_tev > emin_tev) || emin_tev <= 0.0 {
            return 0.0;
        }
        let log_min = emin_tev.ln();
        let log_max = emax_tev.ln();
        let decades = (emax_tev / emin_tev).log10();
        let steps = (decades * INTEGRAL_STEPS_PER_DECADE).ceil().max(1.0) as usize;
        let step = (log_max - log_min) / steps as f64;

        // f(E) dE = f(E) E dlnE
        let integrand = |log_energy: f64| {
            let energy = log_energy.exp();
            self.evaluate(energy) * energy
        };
        let interior: f64 = (1..steps)
            .map(|i| integrand(log_min + step * i as f64))
            .sum();
        step * (0.5 * (integrand(log_min) + integrand(log_max)) + interior)
    }
}

/// `amplitude * (E / reference)^-index`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLaw {
    pub index: f64,
    pub amplitude: f64,
    pub reference_tev: f64,
}

impl Default for PowerLaw {
    fn default() -> Self {
        Self {
            index: 2.0,
            amplitude: 1e-12,
            reference_tev: 1.0,
        }
    }
}

impl PowerLaw {
    pub fn with_index(index: f64) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }
}

impl SpectralModel for PowerLaw {
    fn evaluate(&self, energy_tev: f64) -> f64 {
        self.amplitude * (energy_tev / self.reference_tev).powf(-self.index)
    }

    fn integral(&self, emin_tev: f64, emax_tev: f64) -> f64 {
        let prefactor = self.amplitude * self.reference_tev;
        let lo = emin_tev / self.reference_tev;
        let hi = emax_tev / self.reference_tev;
        if (self.index - 1.0).abs() < 1e-10 {
            prefactor * (hi / lo).ln()
        } else {
            let exponent = 1.0 - self.index;
            prefactor * (hi.powf(exponent) - lo.powf(exponent)) / exponent
        }
    }
}

/// Piecewise power law through fixed energy nodes, interpolated log-log and
/// extrapolated along the outer segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseBrokenPowerLawNorm {
    energies_tev: Vec<f64>,
    norms: Vec<f64>,
}

impl PiecewiseBrokenPowerLawNorm {
    pub fn new(energies_tev: Vec<f64>, norms: Vec<f64>) -> MapResult<Self> {
        if energies_tev.len() != norms.len() || energies_tev.len() < 2 {
            return Err(MapError::InvalidParameter(format!(
                "need matching energy and norm nodes (at least two), got {} and {}",
                energies_tev.len(),
                norms.len()
            )));
        }
        if energies_tev[0] <= 0.0 || energies_tev.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(MapError::InvalidParameter(
                "energy nodes must be positive and strictly increasing".into(),
            ));
        }
        if norms.iter().any(|&norm| !(norm > 0.0)) {
            return Err(MapError::InvalidParameter("norms must be positive".into()));
        }
        Ok(Self {
            energies_tev,
            norms,
        })
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies_tev
    }

    pub fn norms(&self) -> &[f64] {
        &self.norms
    }
}

impl SpectralModel for PiecewiseBrokenPowerLawNorm {
    fn evaluate(&self, energy_tev: f64) -> f64 {
        let last_segment = self.energies_tev.len() - 2;
        let segment = self
            .energies_tev
            .partition_point(|&node| node <= energy_tev)
            .saturating_sub(1)
            .min(last_segment);

        let (e0, e1) = (self.energies_tev[segment], self.energies_tev[segment + 1]);
        let (n0, n1) = (self.norms[segment], self.norms[segment + 1]);
        let slope = (n1 / n0).ln() / (e1 / e0).ln();
        n0 * (energy_tev / e0).powf(slope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn power_law_integral_matches_closed_form() {
        let pwl = PowerLaw::default();
        assert_relative_eq!(pwl.integral(1.0, 10.0), 1e-12 * 0.9, max_relative = 1e-12);

        let flat = PowerLaw::with_index(1.0);
        assert_relative_eq!(
            flat.integral(1.0, 10.0),
            1e-12 * 10f64.ln(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn numeric_integral_agrees_with_analytic() {
        struct Numeric(PowerLaw);
        impl SpectralModel for Numeric {
            fn evaluate(&self, energy_tev: f64) -> f64 {
                self.0.evaluate(energy_tev)
            }
        }
        let pwl = PowerLaw::with_index(2.7);
        let numeric = Numeric(pwl).integral(0.5, 50.0);
        assert_relative_eq!(numeric, pwl.integral(0.5, 50.0), max_relative = 1e-3);
    }

    #[test]
    fn piecewise_passes_through_nodes() {
        let model = PiecewiseBrokenPowerLawNorm::new(
            vec![0.1, 1.0, 10.0, 100.0],
            vec![1.0, 3.0, 5.0, 2.0],
        )
        .unwrap();
        assert_relative_eq!(model.evaluate(0.1), 1.0, max_relative = 1e-12);
        assert_relative_eq!(model.evaluate(1.0), 3.0, max_relative = 1e-12);
        assert_relative_eq!(model.evaluate(100.0), 2.0, max_relative = 1e-12);
        assert_relative_eq!(model.evaluate(10f64.sqrt()), 15f64.sqrt(), max_relative = 1e-12);
        // extrapolation follows the outer segments
        assert!(model.evaluate(0.01) < 1.0);
    }

    #[test]
    fn piecewise_rejects_bad_nodes() {
        assert!(PiecewiseBrokenPowerLawNorm::new(vec![1.0], vec![1.0]).is_err());
        assert!(PiecewiseBrokenPowerLawNorm::new(vec![1.0, 0.5], vec![1.0, 1.0]).is_err());
        assert!(PiecewiseBrokenPowerLawNorm::new(vec![1.0, 2.0], vec![1.0, 0.0]).is_err());
    }
}

use anyhow::Context;
use gammacube::geom::MapAxis;
use gammacube::irf::{Background2D, EffectiveAreaTable2D, EnergyDispersion, Instrument};
use serde::{Deserialize, Serialize};

/// Analytic instrument response used for synthetic observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrfTemplate {
    pub instrument: Instrument,
    pub emin_tev: f64,
    pub emax_tev: f64,
    pub nbin: usize,
    pub offset_max_deg: f64,
    /// Relative energy resolution (log-normal width).
    pub energy_resolution: f64,
    pub energy_bias: f64,
    /// Background rate at 1 TeV in s^-1 sr^-1 TeV^-1.
    pub background_norm: f64,
    pub background_index: f64,
}

impl Default for IrfTemplate {
    fn default() -> Self {
        Self {
            instrument: Instrument::Hess,
            emin_tev: 0.1,
            emax_tev: 100.0,
            nbin: 24,
            offset_max_deg: 3.0,
            energy_resolution: 0.15,
            energy_bias: 0.0,
            background_norm: 5e-3,
            background_index: 2.7,
        }
    }
}

pub struct IrfSet {
    pub aeff: EffectiveAreaTable2D,
    pub edisp: EnergyDispersion,
    pub bkg: Background2D,
}

impl IrfTemplate {
    pub fn energy_axis(&self) -> anyhow::Result<MapAxis> {
        MapAxis::energy_from_bounds(self.emin_tev, self.emax_tev, self.nbin)
            .context("building IRF energy axis")
    }

    pub fn build(&self) -> anyhow::Result<IrfSet> {
        let axis = self.energy_axis()?;
        let aeff =
            EffectiveAreaTable2D::from_parametrization(axis.clone(), self.offset_max_deg, self.instrument)
                .context("building effective area")?;
        let edisp = EnergyDispersion::gaussian(
            axis.clone(),
            axis.clone(),
            self.energy_resolution,
            self.energy_bias,
        )
        .context("building energy dispersion")?;
        let bkg = Background2D::power_law(
            axis,
            self.offset_max_deg,
            self.background_norm,
            self.background_index,
        )
        .context("building background model")?;
        Ok(IrfSet { aeff, edisp, bkg })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_builds_consistent_irfs() {
        let template = IrfTemplate::default();
        let irfs = template.build().unwrap();
        assert_eq!(irfs.aeff.energy_axis().nbin(), template.nbin);
        assert_eq!(irfs.edisp.e_reco().nbin(), template.nbin);
        assert!(irfs.aeff.evaluate(1.0, 0.5) > 0.0);
        assert_eq!(irfs.aeff.evaluate(1.0, template.offset_max_deg + 0.1), 0.0);
        assert!(irfs.bkg.evaluate(1.0, 0.5) > irfs.bkg.evaluate(10.0, 0.5));
    }

    #[test]
    fn invalid_resolution_is_reported() {
        let template = IrfTemplate {
            energy_resolution: 0.0,
            ..Default::default()
        };
        let err = template.build().err().unwrap();
        assert!(err.to_string().contains("energy dispersion"));
    }
}

use std::f64::consts::PI;

use anyhow::{anyhow, ensure, Context};
use gammacube::events::{Event, EventList};
use gammacube::geom::SkyCoord;
use gammacube::irf::EnergyDispersion;
use gammacube::observation::Observation;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};

use crate::generator::template::IrfTemplate;

/// Configuration for generating a synthetic wobble campaign on one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub target: SkyCoord,
    pub observations: usize,
    /// Pointings sit on a circle of this radius around the target.
    pub wobble_offset_deg: f64,
    pub livetime_s: f64,
    pub dead_time_fraction: f64,
    /// Expected source events per observation.
    pub source_counts: f64,
    pub source_sigma_deg: f64,
    pub source_index: f64,
    /// Expected background events per observation, uniform over the field of view.
    pub background_counts: f64,
    pub background_index: f64,
    pub fov_radius_deg: f64,
    pub emin_tev: f64,
    pub emax_tev: f64,
    pub seed: u64,
    pub irf: IrfTemplate,
    pub description: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target: SkyCoord::new(83.63, 22.01),
            observations: 4,
            wobble_offset_deg: 0.5,
            livetime_s: 1800.0,
            dead_time_fraction: 0.05,
            source_counts: 300.0,
            source_sigma_deg: 0.08,
            source_index: 2.5,
            background_counts: 3000.0,
            background_index: 2.7,
            fov_radius_deg: 1.5,
            emin_tev: 0.5,
            emax_tev: 50.0,
            seed: 0,
            irf: IrfTemplate::default(),
            description: None,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.livetime_s > 0.0, "livetime must be positive");
        ensure!(
            (0.0..1.0).contains(&self.dead_time_fraction),
            "dead time fraction must lie in [0, 1)"
        );
        ensure!(self.fov_radius_deg > 0.0, "field-of-view radius must be positive");
        ensure!(
            0.0 < self.emin_tev && self.emin_tev < self.emax_tev,
            "event energy range must be positive and increasing"
        );
        ensure!(
            self.source_counts >= 0.0 && self.background_counts >= 0.0,
            "expected counts must not be negative"
        );
        Ok(())
    }

    fn ontime_s(&self) -> f64 {
        self.livetime_s / (1.0 - self.dead_time_fraction)
    }
}

/// Pointings evenly spaced on the wobble circle, starting north of the target.
pub fn wobble_pointings(config: &GeneratorConfig) -> Vec<SkyCoord> {
    let n = config.observations;
    (0..n)
        .map(|index| {
            let angle = 2.0 * PI * index as f64 / n as f64;
            config.target.offset_by(
                config.wobble_offset_deg * angle.sin(),
                config.wobble_offset_deg * angle.cos(),
            )
        })
        .collect()
}

pub fn build_observations(config: &GeneratorConfig) -> anyhow::Result<Vec<Observation>> {
    config.validate().context("validating generator config")?;
    let irfs = config.irf.build()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    wobble_pointings(config)
        .into_iter()
        .enumerate()
        .map(|(index, pointing)| {
            let obs_id = index as u64 + 1;
            let events = sample_events(&mut rng, config, &pointing, &irfs.edisp)
                .with_context(|| format!("sampling events for observation {obs_id}"))?;
            debug!("observation {obs_id}: {} events", events.len());
            Ok(Observation {
                obs_id,
                pointing,
                livetime_s: config.livetime_s,
                ontime_s: config.ontime_s(),
                events,
                aeff: irfs.aeff.clone(),
                edisp: irfs.edisp.clone(),
                bkg: irfs.bkg.clone(),
            })
        })
        .collect()
}

fn poisson_count<R: Rng>(rng: &mut R, mean: f64) -> anyhow::Result<usize> {
    if mean <= 0.0 {
        return Ok(0);
    }
    let poisson = Poisson::new(mean).map_err(|err| anyhow!("poisson mean {mean}: {err}"))?;
    Ok(poisson.sample(rng) as usize)
}

fn sample_events<R: Rng>(
    rng: &mut R,
    config: &GeneratorConfig,
    pointing: &SkyCoord,
    edisp: &EnergyDispersion,
) -> anyhow::Result<EventList> {
    let mut events = EventList::default();

    let n_source = poisson_count(rng, config.source_counts)?;
    let psf = Normal::new(0.0, config.source_sigma_deg)
        .map_err(|err| anyhow!("source width {}: {err}", config.source_sigma_deg))?;
    for _ in 0..n_source {
        let position = config.target.offset_by(psf.sample(rng), psf.sample(rng));
        let energy_true = sample_power_law(rng, config.emin_tev, config.emax_tev, config.source_index);
        if let Some(energy_tev) = smear_energy(rng, edisp, energy_true) {
            events.push(Event {
                lon_deg: position.lon_deg,
                lat_deg: position.lat_deg,
                energy_tev,
            });
        }
    }

    let n_background = poisson_count(rng, config.background_counts)?;
    for _ in 0..n_background {
        let radius = config.fov_radius_deg * rng.gen::<f64>().sqrt();
        let angle = rng.gen_range(0.0..2.0 * PI);
        let position = pointing.offset_by(radius * angle.cos(), radius * angle.sin());
        let energy_true =
            sample_power_law(rng, config.emin_tev, config.emax_tev, config.background_index);
        if let Some(energy_tev) = smear_energy(rng, edisp, energy_true) {
            events.push(Event {
                lon_deg: position.lon_deg,
                lat_deg: position.lat_deg,
                energy_tev,
            });
        }
    }

    Ok(events)
}

/// Draws from `E^-index` between `emin` and `emax` by inverting the CDF.
pub fn sample_power_law<R: Rng>(rng: &mut R, emin: f64, emax: f64, index: f64) -> f64 {
    let u: f64 = rng.gen();
    if (index - 1.0).abs() < 1e-9 {
        return emin * (emax / emin).powf(u);
    }
    let exponent = 1.0 - index;
    let low = emin.powf(exponent);
    let high = emax.powf(exponent);
    (low + u * (high - low)).powf(1.0 / exponent)
}

/// Reconstructed energy for `energy_true`: a reco bin drawn from the
/// migration row, then a log-uniform value inside it.
pub fn smear_energy<R: Rng>(
    rng: &mut R,
    edisp: &EnergyDispersion,
    energy_true: f64,
) -> Option<f64> {
    let row = edisp.reco_pdf(energy_true)?;
    let total: f64 = row.sum();
    if !(total > 0.0) {
        return None;
    }
    let target = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    let mut chosen = row.len() - 1;
    for (index, &probability) in row.iter().enumerate() {
        cumulative += probability;
        if target < cumulative {
            chosen = index;
            break;
        }
    }
    let edges = edisp.e_reco().edges();
    let (low, high) = (edges[chosen], edges[chosen + 1]);
    Some(low * (high / low).powf(rng.gen::<f64>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gammacube::geom::MapAxis;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            observations: 3,
            source_counts: 50.0,
            background_counts: 200.0,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn generator_builds_one_observation_per_pointing() {
        let config = small_config();
        let observations = build_observations(&config).unwrap();
        assert_eq!(observations.len(), 3);
        for (index, obs) in observations.iter().enumerate() {
            assert_eq!(obs.obs_id, index as u64 + 1);
            assert!(!obs.events.is_empty());
            assert!(obs.ontime_s > obs.livetime_s);
            let offset = obs.pointing.separation_deg(&config.target);
            assert!((offset - config.wobble_offset_deg).abs() < 1e-3);
        }
    }

    #[test]
    fn same_seed_gives_same_events() {
        let config = small_config();
        let a = build_observations(&config).unwrap();
        let b = build_observations(&config).unwrap();
        assert_eq!(a[0].events, b[0].events);

        let other = GeneratorConfig {
            seed: 8,
            ..small_config()
        };
        let c = build_observations(&other).unwrap();
        assert_ne!(a[0].events, c[0].events);
    }

    #[test]
    fn power_law_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for index in [1.0, 2.0, 3.5] {
            for _ in 0..200 {
                let energy = sample_power_law(&mut rng, 1.0, 10.0, index);
                assert!((1.0..=10.0).contains(&energy));
            }
        }
    }

    #[test]
    fn diagonal_dispersion_keeps_the_bin() {
        let axis = MapAxis::energy_from_bounds(1.0, 100.0, 4).unwrap();
        let edisp = EnergyDispersion::diagonal(axis.clone()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for energy in [1.5, 7.0, 40.0] {
            let reco = smear_energy(&mut rng, &edisp, energy).unwrap();
            assert_eq!(axis.coord_to_idx(reco), axis.coord_to_idx(energy));
        }
        assert!(smear_energy(&mut rng, &edisp, 500.0).is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GeneratorConfig {
            dead_time_fraction: 1.0,
            ..Default::default()
        };
        assert!(build_observations(&config).is_err());
    }
}

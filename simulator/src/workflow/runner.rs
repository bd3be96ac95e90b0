use crate::workflow::config::{Mode, WorkflowConfig};
use anyhow::Context;
use gammacube::cube::RingImages;
use gammacube::map::{MapKey, MapSet};
use gammacube::observation::Observation;
use gammacube::telemetry::MetricsSnapshot;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub mode: Mode,
    pub images: bool,
    pub observations: usize,
    pub metrics: MetricsSnapshot,
    /// Sum of every stacked map, in the map's own unit.
    pub totals: BTreeMap<MapKey, f64>,
    /// Highest Li & Ma significance of the stacked on/off maps (ring mode).
    pub peak_significance: Option<f64>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, observations: &[Observation]) -> anyhow::Result<WorkflowResult> {
        let (maps, metrics) = match self.config.mode {
            Mode::Stack => self.run_stack(observations)?,
            Mode::Ring => self.run_ring(observations)?,
        };

        let peak_significance = match self.config.mode {
            Mode::Stack => None,
            Mode::Ring => RingImages::from_maps(&maps)
                .context("computing ring significance")?
                .peak_significance()
                .map(|(value, _)| value),
        };
        let totals = maps.iter().map(|(&key, map)| (key, map.sum())).collect();

        info!(
            "workflow finished: {} processed, {} skipped",
            metrics.processed,
            metrics.skipped()
        );
        Ok(WorkflowResult {
            mode: self.config.mode,
            images: self.config.images,
            observations: observations.len(),
            metrics,
            totals,
            peak_significance,
        })
    }

    fn run_stack(&self, observations: &[Observation]) -> anyhow::Result<(MapSet, MetricsSnapshot)> {
        let mut maker = self
            .config
            .maker
            .map_maker()
            .context("building map maker")?;
        let selection = self.config.maker.selection.as_ref();
        let mut maps = maker
            .run(observations, selection)
            .context("stacking observations")?;
        if self.config.images {
            maps = maker
                .run_images(None, None, false)
                .context("collapsing stacked maps")?;
        }
        Ok((maps, maker.metrics()))
    }

    fn run_ring(&self, observations: &[Observation]) -> anyhow::Result<(MapSet, MetricsSnapshot)> {
        let maker = self
            .config
            .maker
            .ring_maker()
            .context("building ring map maker")?;
        let maps = if self.config.images {
            maker.run_images(observations, None, false)
        } else {
            maker.run(observations)
        }
        .context("stacking on/off maps")?;
        Ok((maps, maker.metrics()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_observations;
    use gammacube::config::{EnergyAxisConfig, GeomConfig};

    fn small_config(mode: Mode, images: bool) -> WorkflowConfig {
        let mut cfg = WorkflowConfig::from_args(mode, images, 2, 21);
        cfg.generator.fov_radius_deg = 1.0;
        cfg.generator.wobble_offset_deg = 0.3;
        cfg.generator.source_counts = 400.0;
        cfg.generator.background_counts = 400.0;
        cfg.maker.offset_max_deg = 1.0;
        cfg.maker.geom = GeomConfig {
            center: cfg.generator.target,
            binsz_deg: 0.1,
            width_deg: (3.0, 3.0),
            energy: EnergyAxisConfig {
                emin_tev: 0.5,
                emax_tev: 50.0,
                nbin: 2,
            },
            energy_true: None,
        };
        cfg
    }

    #[test]
    fn runner_stacks_generated_observations() {
        let cfg = small_config(Mode::Stack, false);
        let observations = build_observations(&cfg.generator).unwrap();
        let result = Runner::new(cfg).execute(&observations).unwrap();
        assert_eq!(result.observations, 2);
        assert_eq!(result.metrics.processed, 2);
        assert_eq!(result.totals.len(), 3);
        assert!(result.totals[&MapKey::Counts] > 0.0);
        assert!(result.totals[&MapKey::Exposure] > 0.0);
        assert!(result.peak_significance.is_none());
    }

    #[test]
    fn runner_reports_ring_significance() {
        let cfg = small_config(Mode::Ring, true);
        let observations = build_observations(&cfg.generator).unwrap();
        let result = Runner::new(cfg).execute(&observations).unwrap();
        assert_eq!(result.metrics.processed, 2);
        assert!(result.totals.contains_key(&MapKey::Off));
        assert!(result.peak_significance.unwrap() > 0.0);

        let line = serde_json::to_string(&result).unwrap();
        assert!(line.contains("\"mode\":\"ring\""));
        assert!(line.contains("\"exposure_off\""));
    }
}

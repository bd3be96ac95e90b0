use anyhow::Context;
use clap::ValueEnum;
use gammacube::config::{EnergyAxisConfig, ExclusionRegion, GeomConfig, MapMakerConfig};
use gammacube::background::RingBackgroundEstimator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::generator::profile::GeneratorConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Counts, exposure and background cubes
    #[default]
    Stack,
    /// On/off ring-background maps
    Ring,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub images: bool,
    pub maker: MapMakerConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Default campaign on the generator target: a 5°×5° grid at 0.05° with
    /// the target masked out of the background estimate.
    pub fn from_args(mode: Mode, images: bool, observations: usize, seed: u64) -> Self {
        let generator = GeneratorConfig {
            observations,
            seed,
            ..Default::default()
        };
        let maker = MapMakerConfig {
            geom: GeomConfig {
                center: generator.target,
                binsz_deg: 0.05,
                width_deg: (5.0, 5.0),
                energy: EnergyAxisConfig {
                    emin_tev: 0.5,
                    emax_tev: 50.0,
                    nbin: 4,
                },
                energy_true: None,
            },
            offset_max_deg: generator.fov_radius_deg,
            selection: None,
            ring: RingBackgroundEstimator::default(),
            exclusion: vec![ExclusionRegion {
                center: generator.target,
                radius_deg: 0.3,
            }],
        };
        Self {
            mode,
            images,
            maker,
            generator,
        }
    }

    /// Command-line flags take precedence over the loaded file.
    pub fn apply_overrides(
        &mut self,
        mode: Option<Mode>,
        images: bool,
        observations: Option<usize>,
        seed: Option<u64>,
    ) {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        self.images |= images;
        if let Some(observations) = observations {
            self.generator.observations = observations;
        }
        if let Some(seed) = seed {
            self.generator.seed = seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gammacube::cube::{MapMakerError, Product};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const WORKFLOW: &str = "\
mode: ring
maker:
  geom:
    center: {lon_deg: 83.63, lat_deg: 22.01}
    binsz_deg: 0.1
    width_deg: [4.0, 4.0]
    energy: {emin_tev: 1.0, emax_tev: 10.0, nbin: 2}
  offset_max_deg: 1.5
  selection: [counts, background]
  ring: {r_in_deg: 0.4, width_deg: 0.2}
generator:
  observations: 2
  seed: 11
";

    #[test]
    fn config_from_args_builds_valid_makers() {
        let cfg = WorkflowConfig::from_args(Mode::Ring, true, 3, 5);
        assert_eq!(cfg.generator.observations, 3);
        assert!(cfg.maker.map_maker().is_ok());
        let ring = cfg.maker.ring_maker().unwrap();
        assert_eq!(ring.geom().data_shape(), (4, 100, 100));
        assert!(ring.exclusion_mask().is_some());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(WORKFLOW.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.mode, Mode::Ring);
        assert!(!cfg.images);
        assert_eq!(cfg.generator.seed, 11);
        assert_eq!(
            cfg.maker.selection.as_ref().unwrap().products(),
            &[Product::Counts, Product::Background]
        );
        assert!(cfg.maker.exclusion.is_empty());
    }

    #[test]
    fn bare_string_selection_is_rejected() {
        let yaml = WORKFLOW.replace("[counts, background]", "counts");
        let err = serde_yaml::from_str::<WorkflowConfig>(&yaml).unwrap_err();
        assert!(err
            .to_string()
            .contains(&MapMakerError::SelectionType("\"counts\"".into()).to_string()));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut cfg = serde_yaml::from_str::<WorkflowConfig>(WORKFLOW).unwrap();
        cfg.apply_overrides(Some(Mode::Stack), true, Some(6), None);
        assert_eq!(cfg.mode, Mode::Stack);
        assert!(cfg.images);
        assert_eq!(cfg.generator.observations, 6);
        assert_eq!(cfg.generator.seed, 11);
    }
}

use crate::background::BackgroundEstimator;
use crate::cube::error::{MapMakerError, MapMakerResult};
use crate::cube::obs::MapMakerObs;
use crate::cube::stacker::{EnergyCollapse, Stacker, StackingStrategy};
use crate::geom::{CutoutMode, WcsGeom};
use crate::map::{Map, MapError, MapKey, MapSet, Unit};
use crate::observation::Observation;
use crate::spectrum::SpectralModel;
use crate::telemetry::MetricsSnapshot;

const RING_KEYS: [MapKey; 4] = [
    MapKey::On,
    MapKey::ExposureOn,
    MapKey::Off,
    MapKey::ExposureOff,
];

/// On/off maps through a background estimator. Observations must fit
/// entirely inside the output grid so that every ring is complete.
#[derive(Debug, Clone)]
pub struct RingStrategy<E> {
    pub estimator: E,
}

impl<E: BackgroundEstimator> StackingStrategy for RingStrategy<E> {
    fn name(&self) -> &'static str {
        "map-maker-ring"
    }

    fn cutout_mode(&self) -> CutoutMode {
        CutoutMode::Strict
    }

    fn output_keys(&self) -> Vec<MapKey> {
        RING_KEYS.to_vec()
    }

    fn contribute(
        &self,
        obs_maker: &MapMakerObs<'_>,
        collapse: Option<&EnergyCollapse<'_>>,
    ) -> MapMakerResult<MapSet> {
        let mut maps = obs_maker.run(None)?;
        let exclusion = match obs_maker.exclusion_mask() {
            Some(mask) => mask.clone(),
            None => Map::filled(obs_maker.geom().clone(), Unit::Dimensionless, 1.0),
        };
        maps.insert(MapKey::Exclusion, exclusion);

        if let Some(collapse) = collapse {
            maps = collapse.apply(&maps)?;
        }

        let estimated = self.estimator.run(&maps)?;
        maps.extend(estimated);

        if let Some(background) = maps.remove(&MapKey::Background) {
            maps.insert(MapKey::ExposureOn, background);
        }
        if let Some(counts) = maps.remove(&MapKey::Counts) {
            maps.insert(MapKey::On, counts);
        }

        RING_KEYS
            .into_iter()
            .map(|key| {
                maps.remove(&key)
                    .map(|map| (key, map))
                    .ok_or(MapMakerError::Map(MapError::MissingKey(key)))
            })
            .collect()
    }
}

/// On/off ring-background map maker.
///
/// Produces `on`, `exposure_on`, `off` and `exposure_off` per energy bin with
/// [`run`](Self::run), or collapsed over energy with
/// [`run_images`](Self::run_images). Observations that only partially overlap
/// the output geometry are skipped.
#[derive(Debug)]
pub struct MapMakerRing<E> {
    stacker: Stacker<RingStrategy<E>>,
}

impl<E: BackgroundEstimator> MapMakerRing<E> {
    pub fn new(
        geom: WcsGeom,
        offset_max_deg: f64,
        exclusion_mask: Option<Map>,
        background_estimator: E,
    ) -> MapMakerResult<Self> {
        let strategy = RingStrategy {
            estimator: background_estimator,
        };
        let stacker = Stacker::new(geom, offset_max_deg, None, exclusion_mask, strategy)?;
        Ok(Self { stacker })
    }

    pub fn geom(&self) -> &WcsGeom {
        self.stacker.geom()
    }

    pub fn offset_max_deg(&self) -> f64 {
        self.stacker.offset_max_deg()
    }

    pub fn exclusion_mask(&self) -> Option<&Map> {
        self.stacker.exclusion_mask()
    }

    pub fn background_estimator(&self) -> &E {
        &self.stacker.strategy().estimator
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.stacker.metrics()
    }

    pub fn run(&self, observations: &[Observation]) -> MapMakerResult<MapSet> {
        self.stacker.stack(observations, None)
    }

    /// Like [`run`](Self::run), but each observation is collapsed over energy
    /// before the background estimate.
    pub fn run_images(
        &self,
        observations: &[Observation],
        spectrum: Option<&dyn SpectralModel>,
        keepdims: bool,
    ) -> MapMakerResult<MapSet> {
        let collapse = EnergyCollapse::new(spectrum, keepdims);
        self.stacker.stack(observations, Some(&collapse))
    }
}

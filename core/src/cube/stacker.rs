//! Observation loop shared by the map makers.
//!
//! A [`Stacker`] owns the output geometries, cuts each observation out of them
//! and folds the per-observation contributions onto the output maps. What is
//! computed per observation, and how strictly the cutout must fit, is decided
//! by a [`StackingStrategy`].

use log::info;
use ndarray::Axis;

use crate::cube::error::{MapMakerError, MapMakerResult};
use crate::cube::obs::MapMakerObs;
use crate::geom::{CutoutError, CutoutMode, WcsGeom};
use crate::map::{Map, MapError, MapKey, MapSet};
use crate::observation::Observation;
use crate::spectrum::{map_spectrum_weight, SpectralModel};
use crate::telemetry::{LogManager, MetricsSnapshot, StackMetrics};

pub trait StackingStrategy {
    /// Component name used in log messages.
    fn name(&self) -> &'static str;

    fn cutout_mode(&self) -> CutoutMode;

    /// Keys of the stacked output, in allocation order.
    fn output_keys(&self) -> Vec<MapKey>;

    /// Maps contributed by one observation. Must contain every output key.
    fn contribute(
        &self,
        obs_maker: &MapMakerObs<'_>,
        collapse: Option<&EnergyCollapse<'_>>,
    ) -> MapMakerResult<MapSet>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoOverlap,
    PartialOverlap,
}

impl From<CutoutError> for SkipReason {
    fn from(err: CutoutError) -> Self {
        match err {
            CutoutError::NoOverlap => SkipReason::NoOverlap,
            CutoutError::PartialOverlap => SkipReason::PartialOverlap,
        }
    }
}

#[derive(Debug)]
pub enum ObsOutcome {
    Contribution(MapSet),
    Skipped(SkipReason),
}

/// Energy-axis collapse applied to a map set.
///
/// Exposure is weighted by the normalised bin integrals of `spectrum` before
/// summing, exclusion keeps its first energy plane, everything else is summed.
#[derive(Clone, Copy, Default)]
pub struct EnergyCollapse<'s> {
    pub spectrum: Option<&'s dyn SpectralModel>,
    pub keepdims: bool,
}

impl<'s> EnergyCollapse<'s> {
    pub fn new(spectrum: Option<&'s dyn SpectralModel>, keepdims: bool) -> Self {
        Self { spectrum, keepdims }
    }

    pub fn apply(&self, maps: &MapSet) -> MapMakerResult<MapSet> {
        maps.iter()
            .map(|(&key, map)| Ok((key, self.collapse(key, map)?)))
            .collect()
    }

    fn collapse(&self, key: MapKey, map: &Map) -> MapMakerResult<Map> {
        let collapsed = match key {
            MapKey::Exposure => map_spectrum_weight(map, self.spectrum)?.sum_over_energy(self.keepdims)?,
            MapKey::Exclusion => {
                let geom = if self.keepdims {
                    map.geom().squash_energy()
                } else {
                    map.geom().to_image()
                };
                let first = map.slice_by_energy_idx(0)?;
                Map::from_data(geom, first.data().clone(), map.unit())?
            }
            _ => map.sum_over_energy(self.keepdims)?,
        };
        Ok(collapsed)
    }
}

impl std::fmt::Debug for EnergyCollapse<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnergyCollapse")
            .field("custom_spectrum", &self.spectrum.is_some())
            .field("keepdims", &self.keepdims)
            .finish()
    }
}

/// Shared observation loop of [`MapMaker`](crate::cube::MapMaker) and
/// [`MapMakerRing`](crate::cube::MapMakerRing).
#[derive(Debug)]
pub struct Stacker<S> {
    geom: WcsGeom,
    geom_true: WcsGeom,
    offset_max_deg: f64,
    exclusion_mask: Option<Map>,
    strategy: S,
    metrics: StackMetrics,
    logger: LogManager,
}

impl<S: StackingStrategy> Stacker<S> {
    pub fn new(
        geom: WcsGeom,
        offset_max_deg: f64,
        geom_true: Option<WcsGeom>,
        exclusion_mask: Option<Map>,
        strategy: S,
    ) -> MapMakerResult<Self> {
        if geom.is_image() {
            return Err(MapMakerError::Configuration(
                "map making requires a geometry with an energy axis".to_string(),
            ));
        }
        let geom_true = geom_true.unwrap_or_else(|| geom.clone());
        if geom_true.is_image() {
            return Err(MapMakerError::Configuration(
                "true-energy geometry requires an energy axis".to_string(),
            ));
        }
        if !(offset_max_deg > 0.0) || !offset_max_deg.is_finite() {
            return Err(MapMakerError::Configuration(format!(
                "offset_max must be a positive angle, got {offset_max_deg}"
            )));
        }
        let exclusion_mask = exclusion_mask
            .map(|mask| broadcast_exclusion(&geom, mask))
            .transpose()?;
        let logger = LogManager::new(strategy.name());

        Ok(Self {
            geom,
            geom_true,
            offset_max_deg,
            exclusion_mask,
            strategy,
            metrics: StackMetrics::new(),
            logger,
        })
    }

    pub fn geom(&self) -> &WcsGeom {
        &self.geom
    }

    pub fn geom_true(&self) -> &WcsGeom {
        &self.geom_true
    }

    pub fn offset_max_deg(&self) -> f64 {
        self.offset_max_deg
    }

    pub fn exclusion_mask(&self) -> Option<&Map> {
        self.exclusion_mask.as_ref()
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Zero-filled output maps, on the true-energy geometry where the key
    /// asks for it.
    pub fn empty_maps(&self) -> MapSet {
        self.strategy
            .output_keys()
            .into_iter()
            .map(|key| {
                let geom = if key.uses_true_energy() {
                    &self.geom_true
                } else {
                    &self.geom
                };
                (key, Map::from_geom(geom.clone(), key.unit()))
            })
            .collect()
    }

    /// Cuts both geometries and the exclusion mask around the pointing, with
    /// full width twice the maximum offset.
    pub fn obs_maker<'a>(
        &self,
        observation: &'a Observation,
    ) -> Result<MapMakerObs<'a>, CutoutError> {
        let width = 2.0 * self.offset_max_deg;
        let mode = self.strategy.cutout_mode();
        let position = &observation.pointing;

        let geom = self.geom.cutout(position, width, mode)?;
        let geom_true = self.geom_true.cutout(position, width, mode)?;
        let exclusion_mask = self
            .exclusion_mask
            .as_ref()
            .map(|mask| mask.cutout(position, width, mode))
            .transpose()?;

        Ok(MapMakerObs::new(
            observation,
            geom,
            Some(geom_true),
            self.offset_max_deg,
            exclusion_mask,
        ))
    }

    pub fn process(
        &self,
        observation: &Observation,
        collapse: Option<&EnergyCollapse<'_>>,
    ) -> MapMakerResult<ObsOutcome> {
        match self.obs_maker(observation) {
            Ok(obs_maker) => Ok(ObsOutcome::Contribution(
                self.strategy.contribute(&obs_maker, collapse)?,
            )),
            Err(err) => Ok(ObsOutcome::Skipped(err.into())),
        }
    }

    /// Folds every observation, in order, onto freshly allocated output
    /// maps. With `collapse` the output maps are collapsed before stacking.
    /// Metrics restart from zero on every call.
    pub fn stack(
        &self,
        observations: &[Observation],
        collapse: Option<&EnergyCollapse<'_>>,
    ) -> MapMakerResult<MapSet> {
        self.metrics.reset();
        let empty = self.empty_maps();
        let initial = match collapse {
            Some(collapse) => collapse.apply(&empty)?,
            None => empty,
        };

        observations.iter().try_fold(initial, |mut maps, observation| {
            match self.process(observation, collapse)? {
                ObsOutcome::Contribution(contribution) => {
                    for (key, map) in maps.iter_mut() {
                        let part = contribution
                            .get(key)
                            .ok_or(MapError::MissingKey(*key))?;
                        map.stack(part)?;
                    }
                    self.metrics.record_processed();
                    self.logger
                        .record(&format!("stacked observation {}", observation.obs_id));
                }
                ObsOutcome::Skipped(reason) => {
                    match reason {
                        SkipReason::NoOverlap => self.metrics.record_no_overlap(),
                        SkipReason::PartialOverlap => self.metrics.record_partial_overlap(),
                    }
                    info!(
                        "[{}] skipping observation {}: {:?}",
                        self.logger.component(),
                        observation.obs_id,
                        reason
                    );
                }
            }
            Ok::<_, MapMakerError>(maps)
        })
    }
}

/// Exclusion mask on the full reco geometry. A single-plane mask with the
/// right spatial shape is repeated over every energy plane.
fn broadcast_exclusion(geom: &WcsGeom, mask: Map) -> MapMakerResult<Map> {
    let (n_energy, ny, nx) = geom.data_shape();
    let actual = mask.data().dim();
    if actual == (n_energy, ny, nx) {
        return Ok(mask);
    }
    if actual.0 != 1 || (actual.1, actual.2) != (ny, nx) {
        return Err(MapMakerError::Configuration(format!(
            "exclusion mask shape {actual:?} does not match geometry {:?}",
            (n_energy, ny, nx)
        )));
    }
    let plane = mask.data().index_axis(Axis(0), 0).mapv(|value| value > 0.0);
    Ok(Map::from_image_mask(geom.clone(), &plane)?)
}

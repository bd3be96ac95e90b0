use crate::cube::error::{MapMakerError, MapMakerResult};
use crate::cube::obs::MapMakerObs;
use crate::cube::selection::Selection;
use crate::cube::stacker::{EnergyCollapse, Stacker, StackingStrategy};
use crate::geom::{CutoutMode, WcsGeom};
use crate::map::{Map, MapKey, MapSet};
use crate::observation::Observation;
use crate::spectrum::SpectralModel;
use crate::telemetry::MetricsSnapshot;

/// Counts, exposure and background for the selected products, with
/// partially overlapping observations clipped to the output grid.
#[derive(Debug, Clone, Default)]
pub struct StandardStrategy {
    pub selection: Selection,
}

impl StackingStrategy for StandardStrategy {
    fn name(&self) -> &'static str {
        "map-maker"
    }

    fn cutout_mode(&self) -> CutoutMode {
        CutoutMode::Trim
    }

    fn output_keys(&self) -> Vec<MapKey> {
        self.selection.keys()
    }

    fn contribute(
        &self,
        obs_maker: &MapMakerObs<'_>,
        collapse: Option<&EnergyCollapse<'_>>,
    ) -> MapMakerResult<MapSet> {
        let maps = obs_maker.run(Some(&self.selection))?;
        match collapse {
            Some(collapse) => collapse.apply(&maps),
            None => Ok(maps),
        }
    }
}

/// Stacks counts, exposure and background of many observations onto one
/// output geometry.
///
/// The maps of the last [`run`](Self::run) are kept so that
/// [`run_images`](Self::run_images) can collapse them without recomputing.
#[derive(Debug)]
pub struct MapMaker {
    stacker: Stacker<StandardStrategy>,
    maps: Option<MapSet>,
}

impl MapMaker {
    /// Fails when `geom` (or `geom_true`, which defaults to `geom`) has no
    /// energy axis.
    pub fn new(
        geom: WcsGeom,
        offset_max_deg: f64,
        geom_true: Option<WcsGeom>,
        exclusion_mask: Option<Map>,
    ) -> MapMakerResult<Self> {
        let stacker = Stacker::new(
            geom,
            offset_max_deg,
            geom_true,
            exclusion_mask,
            StandardStrategy::default(),
        )?;
        Ok(Self {
            stacker,
            maps: None,
        })
    }

    pub fn geom(&self) -> &WcsGeom {
        self.stacker.geom()
    }

    pub fn geom_true(&self) -> &WcsGeom {
        self.stacker.geom_true()
    }

    pub fn offset_max_deg(&self) -> f64 {
        self.stacker.offset_max_deg()
    }

    pub fn exclusion_mask(&self) -> Option<&Map> {
        self.stacker.exclusion_mask()
    }

    /// Maps of the last successful run.
    pub fn maps(&self) -> Option<&MapSet> {
        self.maps.as_ref()
    }

    /// Counters of the most recent stacking pass.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.stacker.metrics()
    }

    /// Stacks `observations` for `selection` (every product when `None`).
    /// The result replaces the maps of any previous run.
    pub fn run(
        &mut self,
        observations: &[Observation],
        selection: Option<&Selection>,
    ) -> MapMakerResult<MapSet> {
        self.stacker.strategy_mut().selection = Selection::resolve(selection);
        let maps = self.stacker.stack(observations, None)?;
        self.maps = Some(maps.clone());
        Ok(maps)
    }

    /// Energy-collapsed images of the stacked maps.
    ///
    /// The maps of a previous run are reused when present; otherwise
    /// `observations` are stacked first.
    pub fn run_images(
        &mut self,
        observations: Option<&[Observation]>,
        spectrum: Option<&dyn SpectralModel>,
        keepdims: bool,
    ) -> MapMakerResult<MapSet> {
        if self.maps.is_none() {
            let observations = observations.ok_or(MapMakerError::MissingPriorState)?;
            self.run(observations, None)?;
        }
        let maps = self.maps.as_ref().ok_or(MapMakerError::MissingPriorState)?;
        EnergyCollapse::new(spectrum, keepdims).apply(maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::selection::Product;
    use crate::cube::testing;
    use crate::geom::{MapAxis, SkyCoord};
    use crate::map::Unit;
    use crate::spectrum::PowerLaw;
    use approx::assert_relative_eq;

    fn geom() -> WcsGeom {
        let axis = MapAxis::energy_from_bounds(1.0, 10.0, 2).unwrap();
        WcsGeom::create(SkyCoord::new(0.0, 0.0), 0.5, (3.0, 3.0), Some(axis)).unwrap()
    }

    #[test]
    fn empty_run_returns_zero_maps_for_every_selection() {
        let mut maker = MapMaker::new(geom(), 1.0, None, None).unwrap();
        for products in [
            vec![Product::Counts],
            vec![Product::Exposure, Product::Background],
            Product::ALL.to_vec(),
        ] {
            let selection = Selection::new(products.clone());
            let maps = maker.run(&[], Some(&selection)).unwrap();
            assert_eq!(maps.keys().copied().collect::<Vec<_>>(), selection.keys());
            for (key, map) in &maps {
                assert_eq!(map.sum(), 0.0);
                assert_eq!(map.geom(), maker.geom());
                assert_eq!(map.unit(), key.unit());
            }
        }
    }

    #[test]
    fn exposure_is_stacked_in_square_meter_seconds() {
        let mut maker = MapMaker::new(geom(), 1.0, None, None).unwrap();
        let observation = testing::observation(1, SkyCoord::new(0.0, 0.0));
        let maps = maker
            .run(std::slice::from_ref(&observation), Some(&Selection::new([Product::Exposure])))
            .unwrap();
        let exposure = &maps[&MapKey::Exposure];
        assert_eq!(exposure.unit(), Unit::SquareMeterSecond);

        let obs_maker = MapMakerObs::new(&observation, geom(), None, 1.0, None);
        let direct = obs_maker.make(Product::Exposure).unwrap();
        assert_relative_eq!(
            exposure.data()[[0, 3, 3]],
            direct.data()[[0, 3, 3]] * 1e-4,
            max_relative = 1e-12
        );
    }

    #[test]
    fn run_images_without_anything_to_collapse_fails() {
        let mut maker = MapMaker::new(geom(), 1.0, None, None).unwrap();
        assert_eq!(
            maker.run_images(None, None, false).unwrap_err(),
            MapMakerError::MissingPriorState
        );
    }

    #[test]
    fn run_images_reuses_the_previous_run() {
        let mut maker = MapMaker::new(geom(), 1.0, None, None).unwrap();
        let observations = vec![testing::observation(1, SkyCoord::new(0.0, 0.0))];
        let maps = maker.run(&observations, None).unwrap();

        let images = maker.run_images(None, None, false).unwrap();
        assert!(images.values().all(|map| map.geom().is_image()));
        assert_relative_eq!(
            images[&MapKey::Counts].sum(),
            maps[&MapKey::Counts].sum(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            images[&MapKey::Background].sum(),
            maps[&MapKey::Background].sum(),
            max_relative = 1e-12
        );

        let hard = PowerLaw::with_index(1.5);
        let cube = maker.run_images(None, Some(&hard), true).unwrap();
        assert_eq!(cube[&MapKey::Exposure].data().dim(), (1, 6, 6));
    }

    #[test]
    fn run_images_runs_first_when_needed() {
        let mut maker = MapMaker::new(geom(), 1.0, None, None).unwrap();
        let observations = vec![testing::observation(1, SkyCoord::new(0.0, 0.0))];
        let images = maker.run_images(Some(&observations), None, true).unwrap();
        assert!(maker.maps().is_some());
        assert_eq!(images.len(), 3);
        assert_eq!(images[&MapKey::Counts].data().dim(), (1, 6, 6));
    }
}

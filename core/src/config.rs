//! Serializable configuration of the map makers.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::background::RingBackgroundEstimator;
use crate::cube::{MapMaker, MapMakerError, MapMakerResult, MapMakerRing, Selection};
use crate::geom::{MapAxis, SkyCoord, WcsGeom};
use crate::map::{Map, MapError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyAxisConfig {
    pub emin_tev: f64,
    pub emax_tev: f64,
    pub nbin: usize,
}

impl EnergyAxisConfig {
    pub fn build(&self) -> MapMakerResult<MapAxis> {
        MapAxis::energy_from_bounds(self.emin_tev, self.emax_tev, self.nbin)
            .map_err(|err| MapError::from(err).into())
    }
}

/// Output grid: a square-pixel map centered on `center`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeomConfig {
    pub center: SkyCoord,
    pub binsz_deg: f64,
    pub width_deg: (f64, f64),
    pub energy: EnergyAxisConfig,
    /// True-energy axis for exposure; the reco axis is used when absent.
    #[serde(default)]
    pub energy_true: Option<EnergyAxisConfig>,
}

impl GeomConfig {
    pub fn build(&self) -> MapMakerResult<WcsGeom> {
        let axis = self.energy.build()?;
        WcsGeom::create(self.center, self.binsz_deg, self.width_deg, Some(axis))
            .map_err(|err| MapError::from(err).into())
    }

    pub fn build_true(&self) -> MapMakerResult<Option<WcsGeom>> {
        match &self.energy_true {
            Some(axis) => Ok(Some(self.build()?.with_energy_axis(axis.build()?))),
            None => Ok(None),
        }
    }
}

/// Circular region excluded from the background estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRegion {
    pub center: SkyCoord,
    pub radius_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMakerConfig {
    pub geom: GeomConfig,
    pub offset_max_deg: f64,
    #[serde(default)]
    pub selection: Option<Selection>,
    #[serde(default)]
    pub ring: RingBackgroundEstimator,
    #[serde(default)]
    pub exclusion: Vec<ExclusionRegion>,
}

impl MapMakerConfig {
    /// Exclusion mask on `geom`: 1 outside every region, 0 inside any.
    /// `None` when no regions are configured.
    pub fn exclusion_mask(&self, geom: &WcsGeom) -> MapMakerResult<Option<Map>> {
        if self.exclusion.is_empty() {
            return Ok(None);
        }
        let mut usable = Array2::from_elem(geom.spatial_shape(), true);
        for region in &self.exclusion {
            if !(region.radius_deg > 0.0) {
                return Err(MapMakerError::Configuration(format!(
                    "exclusion radius must be positive, got {}",
                    region.radius_deg
                )));
            }
            let outside = geom.region_mask(&region.center, region.radius_deg, false);
            usable.zip_mut_with(&outside, |keep, &out| *keep &= out);
        }
        Ok(Some(Map::from_image_mask(geom.clone(), &usable)?))
    }

    pub fn map_maker(&self) -> MapMakerResult<MapMaker> {
        let geom = self.geom.build()?;
        let geom_true = self.geom.build_true()?;
        let exclusion = self.exclusion_mask(&geom)?;
        MapMaker::new(geom, self.offset_max_deg, geom_true, exclusion)
    }

    pub fn ring_maker(&self) -> MapMakerResult<MapMakerRing<RingBackgroundEstimator>> {
        self.ring
            .validate()
            .map_err(|err| MapMakerError::Configuration(err.to_string()))?;
        let geom = self.geom.build()?;
        let exclusion = self.exclusion_mask(&geom)?;
        MapMakerRing::new(geom, self.offset_max_deg, exclusion, self.ring.clone())
    }
}

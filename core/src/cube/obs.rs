use log::debug;
use ndarray::Array2;

use crate::cube::error::MapMakerResult;
use crate::cube::selection::{Product, Selection};
use crate::events::fill_map_counts;
use crate::geom::{MapCoord, WcsGeom};
use crate::irf::{make_map_background_irf, make_map_exposure_true_energy};
use crate::map::{Map, MapSet, Unit};
use crate::observation::Observation;

/// Computes counts, exposure and background for a single observation on its
/// cutout geometry.
///
/// Pixel coordinates and field-of-view masks are evaluated once here and
/// shared by every product.
#[derive(Debug, Clone)]
pub struct MapMakerObs<'a> {
    observation: &'a Observation,
    geom: WcsGeom,
    geom_true: WcsGeom,
    offset_max_deg: f64,
    exclusion_mask: Option<Map>,
    coords: MapCoord,
    coords_etrue: MapCoord,
    fov_mask: Array2<bool>,
    fov_mask_etrue: Array2<bool>,
}

impl<'a> MapMakerObs<'a> {
    /// `geom_true` defaults to `geom`.
    pub fn new(
        observation: &'a Observation,
        geom: WcsGeom,
        geom_true: Option<WcsGeom>,
        offset_max_deg: f64,
        exclusion_mask: Option<Map>,
    ) -> Self {
        let geom_true = geom_true.unwrap_or_else(|| geom.clone());
        let coords = geom.to_image().get_coord();
        let coords_etrue = geom_true.to_image().get_coord();
        let fov_mask = compute_fov_mask(observation, &geom, &coords, offset_max_deg);
        let fov_mask_etrue =
            compute_fov_mask(observation, &geom_true, &coords_etrue, offset_max_deg);
        debug!(
            "obs {}: cutout {:?}, true-energy cutout {:?}",
            observation.obs_id,
            geom.data_shape(),
            geom_true.data_shape()
        );

        Self {
            observation,
            geom,
            geom_true,
            offset_max_deg,
            exclusion_mask,
            coords,
            coords_etrue,
            fov_mask,
            fov_mask_etrue,
        }
    }

    pub fn observation(&self) -> &Observation {
        self.observation
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

    /// Spatial pixel coordinates of the reco geometry, row-major.
    pub fn coords(&self) -> &MapCoord {
        &self.coords
    }

    pub fn coords_etrue(&self) -> &MapCoord {
        &self.coords_etrue
    }

    /// `true` where a reco pixel lies at or beyond the maximum offset.
    pub fn fov_mask(&self) -> &Array2<bool> {
        &self.fov_mask
    }

    pub fn fov_mask_etrue(&self) -> &Array2<bool> {
        &self.fov_mask_etrue
    }

    /// Computes the selected products, all of them when `selection` is `None`.
    pub fn run(&self, selection: Option<&Selection>) -> MapMakerResult<MapSet> {
        let selection = Selection::resolve(selection);
        let mut maps = MapSet::new();
        for &product in selection.products() {
            maps.insert(product.key(), self.make(product)?);
        }
        Ok(maps)
    }

    pub fn make(&self, product: Product) -> MapMakerResult<Map> {
        match product {
            Product::Counts => self.make_counts(),
            Product::Exposure => self.make_exposure(),
            Product::Background => self.make_background(),
        }
    }

    fn make_counts(&self) -> MapMakerResult<Map> {
        let mut counts = Map::from_geom(self.geom.clone(), Unit::Dimensionless);
        fill_map_counts(&mut counts, &self.observation.events)?;
        counts.apply_fov_mask(&self.fov_mask)?;
        Ok(counts)
    }

    fn make_exposure(&self) -> MapMakerResult<Map> {
        let mut exposure = make_map_exposure_true_energy(
            &self.observation.pointing,
            self.observation.livetime_s,
            &self.observation.aeff,
            &self.geom_true,
        )?;
        exposure.apply_fov_mask(&self.fov_mask_etrue)?;
        Ok(exposure)
    }

    fn make_background(&self) -> MapMakerResult<Map> {
        let mut background = make_map_background_irf(
            &self.observation.fixed_pointing_info(),
            self.observation.ontime_s,
            &self.observation.bkg,
            &self.geom,
        )?;
        background.apply_fov_mask(&self.fov_mask)?;
        Ok(background)
    }
}

fn compute_fov_mask(
    observation: &Observation,
    geom: &WcsGeom,
    coords: &MapCoord,
    offset_max_deg: f64,
) -> Array2<bool> {
    let (_, nx) = geom.spatial_shape();
    Array2::from_shape_fn(geom.spatial_shape(), |(iy, ix)| {
        coords
            .skycoord(iy * nx + ix)
            .separation_deg(&observation.pointing)
            >= offset_max_deg
    })
}

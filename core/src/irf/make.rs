use crate::geom::{SkyCoord, WcsGeom};
use crate::irf::aeff::EffectiveAreaTable2D;
use crate::irf::bkg::Background2D;
use crate::irf::pointing::FixedPointingInfo;
use crate::map::{Map, MapError, MapResult, Unit};

/// Exposure (`cm2 s`) on a true-energy geometry: effective area at each
/// pixel's offset from `pointing`, times live time.
pub fn make_map_exposure_true_energy(
    pointing: &SkyCoord,
    livetime_s: f64,
    aeff: &EffectiveAreaTable2D,
    geom: &WcsGeom,
) -> MapResult<Map> {
    let axis = geom.energy_axis().ok_or(MapError::MissingEnergyAxis)?;
    let offsets = geom.separation(pointing);
    let mut exposure = Map::from_geom(geom.clone(), Unit::SquareCentimeterSecond);

    for (ie, mut plane) in exposure.data_mut().outer_iter_mut().enumerate() {
        let energy = axis.center(ie);
        for ((iy, ix), value) in plane.indexed_iter_mut() {
            *value = aeff.evaluate(energy, offsets[[iy, ix]]) * livetime_s;
        }
    }
    Ok(exposure)
}

/// Predicted background counts on a reco-energy geometry: rate at each
/// pixel's offset, integrated over on-time, pixel solid angle and energy bin.
pub fn make_map_background_irf(
    pointing: &FixedPointingInfo,
    ontime_s: f64,
    bkg: &Background2D,
    geom: &WcsGeom,
) -> MapResult<Map> {
    let axis = geom.energy_axis().ok_or(MapError::MissingEnergyAxis)?;
    let offsets = geom.separation(&pointing.radec);
    let solid_angle = geom.solid_angle();
    let mut background = Map::from_geom(geom.clone(), Unit::Dimensionless);

    for (ie, mut plane) in background.data_mut().outer_iter_mut().enumerate() {
        let energy = axis.center(ie);
        let width = axis.bin_width(ie);
        for ((iy, ix), value) in plane.indexed_iter_mut() {
            let rate = bkg.evaluate(energy, offsets[[iy, ix]]);
            *value = rate * ontime_s * solid_angle[[iy, ix]] * width;
        }
    }
    Ok(background)
}

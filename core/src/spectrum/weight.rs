use crate::map::{Map, MapError, MapResult};
use crate::spectrum::models::{PowerLaw, SpectralModel};

/// Weights each energy plane of `map` by the normalised integral of
/// `spectrum` over that bin (default: power law with index 2). Summing the
/// result over energy gives the spectrum-weighted mean.
pub fn map_spectrum_weight(map: &Map, spectrum: Option<&dyn SpectralModel>) -> MapResult<Map> {
    let default_spectrum = PowerLaw::default();
    let spectrum: &dyn SpectralModel = match spectrum {
        Some(spectrum) => spectrum,
        None => &default_spectrum,
    };
    let axis = map.geom().energy_axis().ok_or(MapError::MissingEnergyAxis)?;

    let mut weights: Vec<f64> = axis
        .edges()
        .windows(2)
        .map(|pair| spectrum.integral(pair[0], pair[1]))
        .collect();
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return Err(MapError::InvalidParameter(format!(
            "spectral weights must have a positive sum, got {total}"
        )));
    }
    weights.iter_mut().for_each(|weight| *weight /= total);

    map.scale_energy_planes(&weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{MapAxis, SkyCoord, WcsGeom};
    use crate::map::Unit;
    use approx::assert_relative_eq;

    #[test]
    fn default_weights_follow_index_two() {
        let axis = MapAxis::from_edges(vec![1.0, 10.0, 100.0], "energy", "TeV").unwrap();
        let geom = WcsGeom::create(SkyCoord::new(0.0, 0.0), 1.0, (1.0, 1.0), Some(axis)).unwrap();
        let map = Map::filled(geom, Unit::SquareMeterSecond, 1.0);

        let weighted = map_spectrum_weight(&map, None).unwrap();
        // bin integrals of E^-2: 0.9 and 0.09
        assert_relative_eq!(weighted.data()[[0, 0, 0]], 0.9 / 0.99, max_relative = 1e-12);
        assert_relative_eq!(weighted.data()[[1, 0, 0]], 0.09 / 0.99, max_relative = 1e-12);
        assert_relative_eq!(weighted.sum(), 1.0, max_relative = 1e-12);
        assert_eq!(weighted.unit(), Unit::SquareMeterSecond);
    }

    #[test]
    fn custom_spectrum_changes_weights() {
        let axis = MapAxis::from_edges(vec![1.0, 10.0, 100.0], "energy", "TeV").unwrap();
        let geom = WcsGeom::create(SkyCoord::new(0.0, 0.0), 1.0, (1.0, 1.0), Some(axis)).unwrap();
        let map = Map::filled(geom, Unit::SquareMeterSecond, 1.0);
        let flat = PowerLaw::with_index(1.0);

        let weighted = map_spectrum_weight(&map, Some(&flat)).unwrap();
        assert_relative_eq!(weighted.data()[[0, 0, 0]], 0.5, max_relative = 1e-12);
    }

    #[test]
    fn image_map_is_rejected() {
        let geom = WcsGeom::create(SkyCoord::new(0.0, 0.0), 1.0, (1.0, 1.0), None).unwrap();
        let map = Map::filled(geom, Unit::SquareMeterSecond, 1.0);
        assert_eq!(
            map_spectrum_weight(&map, None),
            Err(MapError::MissingEnergyAxis)
        );
    }
}

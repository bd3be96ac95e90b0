use ndarray::Zip;

use crate::map::{Map, MapError, MapKey, MapResult, MapSet, Unit};
use crate::math::StatsHelper;

/// Per-pixel on/off statistics of a stacked ring-background map set.
#[derive(Debug, Clone, PartialEq)]
pub struct RingImages {
    pub alpha: Map,
    pub background: Map,
    pub excess: Map,
    pub significance: Map,
}

impl RingImages {
    /// Derives alpha (`exposure_on / exposure_off`), background
    /// (`alpha * off`), excess and Li & Ma significance from `on`, `off`,
    /// `exposure_on` and `exposure_off`. Pixels without off exposure get zero.
    pub fn from_maps(maps: &MapSet) -> MapResult<Self> {
        let get = |key: MapKey| maps.get(&key).ok_or(MapError::MissingKey(key));
        let on = get(MapKey::On)?;
        let off = get(MapKey::Off)?;
        let exposure_on = get(MapKey::ExposureOn)?;
        let exposure_off = get(MapKey::ExposureOff)?;

        let shape = on.data().dim();
        for other in [off, exposure_on, exposure_off] {
            if other.data().dim() != shape {
                return Err(MapError::ShapeMismatch {
                    expected: shape,
                    actual: other.data().dim(),
                });
            }
        }

        let mut alpha = Map::from_geom(on.geom().clone(), Unit::Dimensionless);
        Zip::from(alpha.data_mut())
            .and(exposure_on.data())
            .and(exposure_off.data())
            .for_each(|alpha, &on, &off| {
                if off > 0.0 {
                    *alpha = on / off;
                }
            });

        let mut background = alpha.clone();
        let mut excess = alpha.clone();
        let mut significance = alpha.clone();
        Zip::from(background.data_mut())
            .and(excess.data_mut())
            .and(significance.data_mut())
            .and(on.data())
            .and(off.data())
            .and(alpha.data())
            .for_each(|background, excess, significance, &n_on, &n_off, &alpha| {
                *background = alpha * n_off;
                *excess = StatsHelper::excess(n_on, n_off, alpha);
                *significance = StatsHelper::lima_significance(n_on, n_off, alpha);
            });

        Ok(Self {
            alpha,
            background,
            excess,
            significance,
        })
    }

    /// Largest significance and the `(energy, lat, lon)` index it sits at.
    pub fn peak_significance(&self) -> Option<(f64, (usize, usize, usize))> {
        self.significance
            .data()
            .indexed_iter()
            .filter(|(_, value)| value.is_finite())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, value)| (*value, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{SkyCoord, WcsGeom};
    use approx::assert_abs_diff_eq;

    fn maps(on: f64, off: f64, exposure_on: f64, exposure_off: f64) -> MapSet {
        let geom = WcsGeom::create(SkyCoord::new(0.0, 0.0), 1.0, (2.0, 1.0), None).unwrap();
        [
            (MapKey::On, on),
            (MapKey::Off, off),
            (MapKey::ExposureOn, exposure_on),
            (MapKey::ExposureOff, exposure_off),
        ]
        .into_iter()
        .map(|(key, value)| (key, Map::filled(geom.clone(), Unit::Dimensionless, value)))
        .collect()
    }

    #[test]
    fn statistics_follow_li_ma() {
        let images = RingImages::from_maps(&maps(10.0, 20.0, 1.0, 10.0)).unwrap();
        assert_abs_diff_eq!(images.alpha.data()[[0, 0, 0]], 0.1, epsilon = 1e-15);
        assert_abs_diff_eq!(images.background.data()[[0, 0, 1]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(images.excess.data()[[0, 0, 0]], 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            images.significance.data()[[0, 0, 0]],
            StatsHelper::lima_significance(10.0, 20.0, 0.1),
            epsilon = 1e-12
        );
        let (peak, _) = images.peak_significance().unwrap();
        assert!(peak > 0.0);
    }

    #[test]
    fn zero_off_exposure_gives_zero_alpha() {
        let images = RingImages::from_maps(&maps(3.0, 0.0, 1.0, 0.0)).unwrap();
        assert_eq!(images.alpha.sum(), 0.0);
        assert_eq!(images.significance.sum(), 0.0);
    }

    #[test]
    fn missing_off_map_is_an_error() {
        let mut set = maps(1.0, 1.0, 1.0, 1.0);
        set.remove(&MapKey::Off);
        assert_eq!(
            RingImages::from_maps(&set),
            Err(MapError::MissingKey(MapKey::Off))
        );
    }
}

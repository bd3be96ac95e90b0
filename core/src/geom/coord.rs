use serde::{Deserialize, Serialize};

/// Sky position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl SkyCoord {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    /// Great-circle separation in degrees (Vincenty formula, stable at all
    /// separations).
    pub fn separation_deg(&self, other: &SkyCoord) -> f64 {
        let lat1 = self.lat_deg.to_radians();
        let lat2 = other.lat_deg.to_radians();
        let dlon = (other.lon_deg - self.lon_deg).to_radians();

        let (sin_dlon, cos_dlon) = dlon.sin_cos();
        let (sin_lat1, cos_lat1) = lat1.sin_cos();
        let (sin_lat2, cos_lat2) = lat2.sin_cos();

        let num1 = cos_lat2 * sin_dlon;
        let num2 = cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon;
        let denominator = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_dlon;

        num1.hypot(num2).atan2(denominator).to_degrees()
    }

    /// Position shifted by small offsets, longitude offset measured on the sky.
    pub fn offset_by(&self, dlon_deg: f64, dlat_deg: f64) -> Self {
        let cos_lat = self.lat_deg.to_radians().cos().max(1e-12);
        Self {
            lon_deg: self.lon_deg + dlon_deg / cos_lat,
            lat_deg: self.lat_deg + dlat_deg,
        }
    }
}

/// Wraps a longitude difference into `[-180, 180)`.
pub(crate) fn wrap_delta_lon(delta_deg: f64) -> f64 {
    (delta_deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Per-pixel coordinates of a geometry, flattened in data order
/// (energy, then latitude, then longitude).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapCoord {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub energy: Option<Vec<f64>>,
}

impl MapCoord {
    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }

    pub fn skycoord(&self, index: usize) -> SkyCoord {
        SkyCoord::new(self.lon[index], self.lat[index])
    }

    pub fn energy(&self, index: usize) -> Option<f64> {
        self.energy.as_ref().map(|energy| energy[index])
    }
}

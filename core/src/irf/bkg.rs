use ndarray::Array2;

use crate::geom::MapAxis;
use crate::irf::aeff::{offset_bin, validate_offset_edges};
use crate::map::{MapError, MapResult};

/// Background rate in s⁻¹ sr⁻¹ TeV⁻¹ binned in reconstructed energy and
/// field-of-view offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Background2D {
    energy: MapAxis,
    offset_edges_deg: Vec<f64>,
    data: Array2<f64>,
}

impl Background2D {
    pub fn new(energy: MapAxis, offset_edges_deg: Vec<f64>, data: Array2<f64>) -> MapResult<Self> {
        validate_offset_edges(&offset_edges_deg)?;
        let expected = (energy.nbin(), offset_edges_deg.len() - 1);
        if data.dim() != expected {
            return Err(MapError::ShapeMismatch {
                expected: (1, expected.0, expected.1),
                actual: (1, data.nrows(), data.ncols()),
            });
        }
        Ok(Self {
            energy,
            offset_edges_deg,
            data,
        })
    }

    /// Radially flat power-law rate `norm * E^-index`, evaluated at bin centers.
    pub fn power_law(
        energy: MapAxis,
        offset_max_deg: f64,
        norm: f64,
        index: f64,
    ) -> MapResult<Self> {
        let centers = energy.centers();
        let data = Array2::from_shape_fn((energy.nbin(), 1), |(ie, _)| {
            norm * centers[ie].powf(-index)
        });
        Self::new(energy, vec![0.0, offset_max_deg], data)
    }

    pub fn energy_axis(&self) -> &MapAxis {
        &self.energy
    }

    /// Rate at the given energy and offset; zero outside the table.
    pub fn evaluate(&self, energy_tev: f64, offset_deg: f64) -> f64 {
        let Some(ie) = self.energy.coord_to_idx(energy_tev) else {
            return 0.0;
        };
        match offset_bin(&self.offset_edges_deg, offset_deg) {
            Some(io) => self.data[[ie, io]],
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_law_rate_falls_with_energy() {
        let energy = MapAxis::from_edges(vec![1.0, 4.0, 16.0], "energy", "TeV").unwrap();
        let bkg = Background2D::power_law(energy, 3.0, 10.0, 2.0).unwrap();
        assert_eq!(bkg.evaluate(2.0, 0.0), 10.0 / 4.0);
        assert_eq!(bkg.evaluate(8.0, 1.0), 10.0 / 64.0);
        assert_eq!(bkg.evaluate(8.0, 3.0), 0.0);
    }
}

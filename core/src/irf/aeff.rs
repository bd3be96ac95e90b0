use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::geom::MapAxis;
use crate::map::{MapError, MapResult};

/// Instrument whose published effective-area curve is used by
/// [`EffectiveAreaTable2D::from_parametrization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instrument {
    Hess,
    Hess2,
    Cta,
}

impl Instrument {
    fn parameters(self) -> [f64; 3] {
        match self {
            Instrument::Hess => [6.85e9, 0.0891, 5e5],
            Instrument::Hess2 => [2.05e9, 0.0891, 1e5],
            Instrument::Cta => [1.71e11, 0.0891, 1e5],
        }
    }
}

/// Effective area in cm² binned in true energy (TeV) and field-of-view offset
/// (deg).
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveAreaTable2D {
    energy: MapAxis,
    offset_edges_deg: Vec<f64>,
    data: Array2<f64>,
}

impl EffectiveAreaTable2D {
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

    /// Offset-independent area following `g1 * E^-g2 * exp(-g3 / E)` with `E`
    /// in MeV, evaluated at the bin centers.
    pub fn from_parametrization(
        energy: MapAxis,
        offset_max_deg: f64,
        instrument: Instrument,
    ) -> MapResult<Self> {
        let [g1, g2, g3] = instrument.parameters();
        let values: Vec<f64> = energy
            .centers()
            .into_iter()
            .map(|energy_tev| {
                let energy_mev = energy_tev * 1e6;
                g1 * energy_mev.powf(-g2) * (-g3 / energy_mev).exp()
            })
            .collect();
        let data = Array2::from_shape_fn((energy.nbin(), 1), |(ie, _)| values[ie]);
        Self::new(energy, vec![0.0, offset_max_deg], data)
    }

    pub fn energy_axis(&self) -> &MapAxis {
        &self.energy
    }

    /// Area in cm²; zero outside the tabulated range.
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

pub(crate) fn validate_offset_edges(edges: &[f64]) -> MapResult<()> {
    if edges.len() < 2 || edges.windows(2).any(|pair| pair[1] <= pair[0]) || edges[0] < 0.0 {
        return Err(MapError::InvalidParameter(format!(
            "offset edges must be non-negative and strictly increasing, got {edges:?}"
        )));
    }
    Ok(())
}

pub(crate) fn offset_bin(edges: &[f64], offset_deg: f64) -> Option<usize> {
    let last = edges[edges.len() - 1];
    if !(offset_deg >= edges[0] && offset_deg < last) {
        return None;
    }
    Some(edges.partition_point(|&edge| edge <= offset_deg) - 1)
}

use ndarray::{Array2, ArrayView1};

use crate::geom::MapAxis;
use crate::map::{MapError, MapResult};

/// Migration probabilities from true to reconstructed energy.
///
/// Row `i` holds the reco-energy distribution for true-energy bin `i`; rows
/// with any support are normalised to one.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyDispersion {
    e_true: MapAxis,
    e_reco: MapAxis,
    pdf: Array2<f64>,
}

impl EnergyDispersion {
    pub fn new(e_true: MapAxis, e_reco: MapAxis, mut pdf: Array2<f64>) -> MapResult<Self> {
        let expected = (e_true.nbin(), e_reco.nbin());
        if pdf.dim() != expected {
            return Err(MapError::ShapeMismatch {
                expected: (1, expected.0, expected.1),
                actual: (1, pdf.nrows(), pdf.ncols()),
            });
        }
        if pdf.iter().any(|&value| value < 0.0 || !value.is_finite()) {
            return Err(MapError::InvalidParameter(
                "migration probabilities must be finite and non-negative".into(),
            ));
        }
        for mut row in pdf.rows_mut() {
            let total = row.sum();
            if total > 0.0 {
                row.mapv_inplace(|value| value / total);
            }
        }
        Ok(Self { e_true, e_reco, pdf })
    }

    /// Log-normal migration with relative resolution `sigma` and log bias
    /// `bias`.
    pub fn gaussian(e_true: MapAxis, e_reco: MapAxis, sigma: f64, bias: f64) -> MapResult<Self> {
        if !(sigma > 0.0) {
            return Err(MapError::InvalidParameter(format!(
                "energy resolution must be positive, got {sigma}"
            )));
        }
        let pdf = Array2::from_shape_fn((e_true.nbin(), e_reco.nbin()), |(it, ir)| {
            let migra = (e_reco.center(ir) / e_true.center(it)).ln() - bias;
            let log_width = (e_reco.edges()[ir + 1] / e_reco.edges()[ir]).ln();
            (-0.5 * (migra / sigma).powi(2)).exp() * log_width
        });
        Self::new(e_true, e_reco, pdf)
    }

    /// Identity migration between two identical axes.
    pub fn diagonal(axis: MapAxis) -> MapResult<Self> {
        let pdf = Array2::eye(axis.nbin());
        Self::new(axis.clone(), axis, pdf)
    }

    pub fn e_true(&self) -> &MapAxis {
        &self.e_true
    }

    pub fn e_reco(&self) -> &MapAxis {
        &self.e_reco
    }

    /// Reco-energy distribution for a true energy, if it lies on the axis.
    pub fn reco_pdf(&self, energy_true_tev: f64) -> Option<ArrayView1<'_, f64>> {
        let it = self.e_true.coord_to_idx(energy_true_tev)?;
        Some(self.pdf.row(it))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gaussian_rows_are_normalised_and_peak_on_diagonal() {
        let axis = MapAxis::energy_from_bounds(0.1, 100.0, 12).unwrap();
        let edisp = EnergyDispersion::gaussian(axis.clone(), axis.clone(), 0.1, 0.0).unwrap();
        for it in 0..axis.nbin() {
            let row = edisp.reco_pdf(axis.center(it)).unwrap();
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
            let peak = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(ir, _)| ir);
            assert_eq!(peak, Some(it));
        }
    }

    #[test]
    fn diagonal_is_identity() {
        let axis = MapAxis::energy_from_bounds(1.0, 10.0, 3).unwrap();
        let edisp = EnergyDispersion::diagonal(axis.clone()).unwrap();
        assert_eq!(edisp.reco_pdf(axis.center(1)).unwrap().to_vec(), vec![0.0, 1.0, 0.0]);
        assert!(edisp.reco_pdf(20.0).is_none());
    }
}

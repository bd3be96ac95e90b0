use std::sync::Arc;

use ndarray::{s, Array2, ArrayView2};
use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};

/// Helper that wraps `rustfft` plans for 2D transforms of a fixed shape.
pub struct FftHelper {
    shape: (usize, usize),
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl FftHelper {
    /// Plans transforms for arrays of `shape = (rows, cols)`.
    pub fn new(shape: (usize, usize)) -> Self {
        let (rows, cols) = (shape.0.max(1), shape.1.max(1));
        let mut planner = FftPlanner::new();
        Self {
            shape: (rows, cols),
            row_forward: planner.plan_fft_forward(cols),
            row_inverse: planner.plan_fft_inverse(cols),
            col_forward: planner.plan_fft_forward(rows),
            col_inverse: planner.plan_fft_inverse(rows),
            scratch: Vec::with_capacity(rows.max(cols)),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Forward transform of `input`, zero-padded to the planned shape. Input
    /// larger than the planned shape is cropped.
    pub fn forward(&mut self, input: ArrayView2<f64>) -> Array2<Complex64> {
        let mut buffer = Array2::from_elem(self.shape, Complex64::zero());
        let rows = input.nrows().min(self.shape.0);
        let cols = input.ncols().min(self.shape.1);
        buffer
            .slice_mut(s![..rows, ..cols])
            .zip_mut_with(&input.slice(s![..rows, ..cols]), |dst, &src| {
                *dst = Complex64::new(src, 0.0)
            });

        let (row_fft, col_fft) = (self.row_forward.clone(), self.col_forward.clone());
        self.transform(&mut buffer, row_fft.as_ref(), col_fft.as_ref());
        buffer
    }

    /// Normalised inverse transform, keeping the real part.
    pub fn inverse(&mut self, mut spectrum: Array2<Complex64>) -> Array2<f64> {
        let (row_fft, col_fft) = (self.row_inverse.clone(), self.col_inverse.clone());
        self.transform(&mut spectrum, row_fft.as_ref(), col_fft.as_ref());
        let norm = (self.shape.0 * self.shape.1) as f64;
        spectrum.mapv(|value| value.re / norm)
    }

    fn transform(&mut self, buffer: &mut Array2<Complex64>, rows: &dyn Fft<f64>, cols: &dyn Fft<f64>) {
        for mut row in buffer.rows_mut() {
            self.scratch.clear();
            self.scratch.extend(row.iter().copied());
            rows.process(&mut self.scratch);
            row.iter_mut()
                .zip(self.scratch.iter())
                .for_each(|(dst, src)| *dst = *src);
        }
        for mut column in buffer.columns_mut() {
            self.scratch.clear();
            self.scratch.extend(column.iter().copied());
            cols.process(&mut self.scratch);
            column
                .iter_mut()
                .zip(self.scratch.iter())
                .for_each(|(dst, src)| *dst = *src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn fft_helper_returns_planned_shape() {
        let mut helper = FftHelper::new((4, 8));
        let output = helper.forward(array![[1.0, 0.0], [-1.0, 0.0]].view());
        assert_eq!(output.dim(), (4, 8));
    }

    #[test]
    fn forward_then_inverse_restores_input() {
        let input = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let mut helper = FftHelper::new((2, 3));
        let spectrum = helper.forward(input.view());
        let restored = helper.inverse(spectrum);
        for (a, b) in restored.iter().zip(input.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn dc_component_is_sum() {
        let input = array![[1.0, 2.0], [3.0, 4.0]];
        let mut helper = FftHelper::new((2, 2));
        let spectrum = helper.forward(input.view());
        assert_abs_diff_eq!(spectrum[[0, 0]].re, 10.0, epsilon = 1e-12);
    }
}

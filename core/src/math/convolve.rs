use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use crate::math::fft::FftHelper;

/// Same-size linear convolution with zero padding. `kernel` must have odd
/// dimensions; its central element is the zero offset.
pub fn convolve_direct(image: ArrayView2<f64>, kernel: ArrayView2<f64>) -> Array2<f64> {
    let (ny, nx) = image.dim();
    let (ky, kx) = kernel.dim();
    let (cy, cx) = ((ky / 2) as isize, (kx / 2) as isize);

    let taps: Vec<(isize, isize, f64)> = kernel
        .indexed_iter()
        .filter(|(_, &weight)| weight != 0.0)
        .map(|((iy, ix), &weight)| (iy as isize - cy, ix as isize - cx, weight))
        .collect();

    Array2::from_shape_fn((ny, nx), |(y, x)| {
        taps.iter()
            .filter_map(|&(dy, dx, weight)| {
                let sy = y as isize - dy;
                let sx = x as isize - dx;
                if sy < 0 || sx < 0 || sy >= ny as isize || sx >= nx as isize {
                    None
                } else {
                    Some(weight * image[[sy as usize, sx as usize]])
                }
            })
            .sum()
    })
}

/// FFT-based equivalent of [`convolve_direct`]. Round-off residue well below
/// the input scale is flushed to zero.
pub fn convolve_fft(image: ArrayView2<f64>, kernel: ArrayView2<f64>) -> Array2<f64> {
    let (ny, nx) = image.dim();
    let (ky, kx) = kernel.dim();
    let (cy, cx) = (ky / 2, kx / 2);
    let shape = (ny + ky, nx + kx);

    // kernel centre moved to the origin, negative offsets wrapped to the end
    let mut wrapped = Array2::<f64>::zeros(shape);
    for ((iy, ix), &weight) in kernel.indexed_iter() {
        let wy = (iy + shape.0 - cy) % shape.0;
        let wx = (ix + shape.1 - cx) % shape.1;
        wrapped[[wy, wx]] = weight;
    }

    let mut helper = FftHelper::new(shape);
    let image_spectrum = helper.forward(image);
    let kernel_spectrum = helper.forward(wrapped.view());
    let product: Array2<Complex64> = &image_spectrum * &kernel_spectrum;
    let full = helper.inverse(product);

    let peak = image.iter().fold(0.0_f64, |peak, value| peak.max(value.abs()));
    let weight: f64 = kernel.iter().map(|value| value.abs()).sum();
    let tolerance = 1e-10 * peak * weight;
    Array2::from_shape_fn((ny, nx), |(y, x)| {
        let value = full[[y, x]];
        if value.abs() < tolerance {
            0.0
        } else {
            value
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn direct_convolution_spreads_point_source() {
        let mut image = Array2::<f64>::zeros((5, 5));
        image[[2, 2]] = 1.0;
        let kernel = array![[0.0, 1.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 0.0]];
        let out = convolve_direct(image.view(), kernel.view());
        assert_eq!(out[[1, 2]], 1.0);
        assert_eq!(out[[2, 1]], 1.0);
        assert_eq!(out[[2, 2]], 0.0);
        assert_eq!(out.sum(), 4.0);
    }

    #[test]
    fn direct_convolution_is_oriented() {
        let mut image = Array2::<f64>::zeros((3, 3));
        image[[1, 1]] = 1.0;
        let kernel = array![[0.0, 0.0, 0.0], [0.0, 0.0, 2.0], [0.0, 0.0, 0.0]];
        let out = convolve_direct(image.view(), kernel.view());
        assert_eq!(out[[1, 2]], 2.0);
        assert_eq!(out.sum(), 2.0);
    }

    #[test]
    fn fft_matches_direct() {
        let image = Array2::from_shape_fn((6, 7), |(y, x)| (y * 7 + x) as f64 % 5.0);
        let kernel = array![[1.0, 0.5, 0.0], [1.0, 0.0, 1.0], [0.0, 2.0, 1.0]];
        let direct = convolve_direct(image.view(), kernel.view());
        let fft = convolve_fft(image.view(), kernel.view());
        for (a, b) in direct.iter().zip(fft.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }
}

pub mod convolve;
pub mod fft;
pub mod stats;

pub use convolve::{convolve_direct, convolve_fft};
pub use fft::FftHelper;
pub use stats::StatsHelper;

//! Spectral models used to weight exposure when collapsing energy.

pub mod models;
pub mod weight;

pub use models::{PiecewiseBrokenPowerLawNorm, PowerLaw, SpectralModel};
pub use weight::map_spectrum_weight;

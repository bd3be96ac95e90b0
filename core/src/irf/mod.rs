//! Instrument response tables and the map functions built on them.

pub mod aeff;
pub mod bkg;
pub mod edisp;
pub mod make;
pub mod pointing;

pub use aeff::{EffectiveAreaTable2D, Instrument};
pub use bkg::Background2D;
pub use edisp::EnergyDispersion;
pub use make::{make_map_background_irf, make_map_exposure_true_energy};
pub use pointing::FixedPointingInfo;

//! Map making and data-cube stacking for IACT gamma-ray observations.
//!
//! Observations (event lists plus instrument response) are binned into
//! counts, exposure and background cubes on a common sky/energy grid, either
//! directly or through a ring-background on/off estimate.

pub mod background;
pub mod config;
pub mod cube;
pub mod events;
pub mod geom;
pub mod irf;
pub mod map;
pub mod math;
pub mod observation;
pub mod prelude;
pub mod spectrum;
pub mod telemetry;

pub use prelude::{MapMaker, MapMakerError, MapMakerResult, MapMakerRing, MapSet, Selection};

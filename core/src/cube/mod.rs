//! Map making and data-cube stacking.
//!
//! [`MapMakerObs`] computes the maps of a single observation on its cutout,
//! [`MapMaker`] and [`MapMakerRing`] stack many observations onto one output
//! geometry through the shared [`Stacker`] loop.

pub mod error;
pub mod maker;
pub mod obs;
pub mod ring;
pub mod selection;
pub mod significance;
pub mod stacker;

pub use error::{MapMakerError, MapMakerResult};
pub use maker::{MapMaker, StandardStrategy};
pub use obs::MapMakerObs;
pub use ring::{MapMakerRing, RingStrategy};
pub use selection::{Product, Selection};
pub use significance::RingImages;
pub use stacker::{EnergyCollapse, ObsOutcome, SkipReason, Stacker, StackingStrategy};

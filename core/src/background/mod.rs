//! Background estimators working on per-observation map sets.

pub mod ring;

pub use ring::{ConvolutionMethod, RingBackgroundEstimator};

use crate::map::{MapResult, MapSet};

/// Estimates off counts and off exposure from a map set.
///
/// Implementations receive at least `counts`, `background` and `exclusion`
/// (all on the same geometry) and return at least `off` and `exposure_off`.
/// A returned `background` replaces the template and becomes the on exposure.
pub trait BackgroundEstimator {
    fn run(&self, maps: &MapSet) -> MapResult<MapSet>;
}

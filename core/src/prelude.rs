//! Types needed by most users of the map makers.

pub use crate::background::{BackgroundEstimator, ConvolutionMethod, RingBackgroundEstimator};
pub use crate::config::{ExclusionRegion, GeomConfig, MapMakerConfig};
pub use crate::cube::{
    EnergyCollapse, MapMaker, MapMakerError, MapMakerObs, MapMakerResult, MapMakerRing, Product,
    RingImages, Selection,
};
pub use crate::events::{Event, EventList};
pub use crate::geom::{CutoutMode, MapAxis, SkyCoord, WcsGeom};
pub use crate::irf::{Background2D, EffectiveAreaTable2D, EnergyDispersion, Instrument};
pub use crate::map::{Map, MapKey, MapSet, Unit};
pub use crate::observation::Observation;
pub use crate::spectrum::{PowerLaw, SpectralModel};

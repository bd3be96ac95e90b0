//! Sky grids, energy axes and coordinates.

pub mod axis;
pub mod coord;
pub mod error;
pub mod wcs;

pub use axis::MapAxis;
pub use coord::{MapCoord, SkyCoord};
pub use error::{CutoutError, GeomError, GeomResult};
pub use wcs::{CutoutMode, CutoutSlices, WcsGeom};

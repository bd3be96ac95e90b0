//! Map containers bound to a geometry and a unit.

pub mod error;
pub mod key;
pub mod skymap;
pub mod unit;

pub use error::{MapError, MapResult};
pub use key::{MapKey, MapSet};
pub use skymap::Map;
pub use unit::Unit;

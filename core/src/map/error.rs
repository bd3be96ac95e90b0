use thiserror::Error;

use crate::geom::GeomError;
use crate::map::key::MapKey;
use crate::map::unit::Unit;

pub type MapResult<T> = Result<T, MapError>;

/// Errors raised by map containers and the functions that fill them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    #[error("cannot convert {from} to {to}")]
    UnitConversion { from: Unit, to: Unit },
    #[error("unknown unit: {0:?}")]
    UnknownUnit(String),
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },
    #[error("coordinate/value length mismatch: {coords} coordinates, {values} values")]
    LengthMismatch { coords: usize, values: usize },
    #[error("geometry has no energy axis")]
    MissingEnergyAxis,
    #[error("coordinates carry no energy but the map has an energy axis")]
    MissingEnergyCoord,
    #[error("energy index {index} out of range for {nbin} bins")]
    EnergyIndex { index: usize, nbin: usize },
    #[error("missing map {0}")]
    MissingKey(MapKey),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Geom(#[from] GeomError),
}

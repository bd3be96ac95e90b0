use thiserror::Error;

use crate::map::MapError;

pub type MapMakerResult<T> = Result<T, MapMakerError>;

/// Errors surfaced by the map makers.
///
/// Per-observation overlap failures never show up here: they are turned into
/// skips inside the stacking loop.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapMakerError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("selection must be a list of product names, got {0}")]
    SelectionType(String),
    #[error("unknown selection {0:?}, available: counts, exposure, background")]
    UnknownSelection(String),
    #[error("run_images needs observations or the maps of a previous run")]
    MissingPriorState,
    #[error(transparent)]
    Map(#[from] MapError),
}

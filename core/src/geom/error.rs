use thiserror::Error;

pub type GeomResult<T> = Result<T, GeomError>;

/// Errors raised while building or querying a geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeomError {
    #[error("invalid axis: {0}")]
    InvalidAxis(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Outcome of a cutout that could not be honored.
///
/// Both variants are per-observation conditions: the stacking pipeline turns
/// them into a skip rather than an error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CutoutError {
    #[error("cutout does not overlap the parent geometry")]
    NoOverlap,
    #[error("cutout only partially overlaps the parent geometry")]
    PartialOverlap,
}

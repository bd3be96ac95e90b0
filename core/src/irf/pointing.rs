use serde::{Deserialize, Serialize};

use crate::geom::SkyCoord;

/// Pointing of a fixed-position (non-drifting) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedPointingInfo {
    pub radec: SkyCoord,
}

impl FixedPointingInfo {
    pub fn new(radec: SkyCoord) -> Self {
        Self { radec }
    }
}

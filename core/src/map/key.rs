use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::map::skymap::Map;
use crate::map::unit::Unit;

/// Names of the maps produced and consumed by the stacking pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKey {
    Counts,
    Exposure,
    Background,
    Exclusion,
    On,
    Off,
    ExposureOn,
    ExposureOff,
    Alpha,
}

impl MapKey {
    pub fn as_str(self) -> &'static str {
        match self {
            MapKey::Counts => "counts",
            MapKey::Exposure => "exposure",
            MapKey::Background => "background",
            MapKey::Exclusion => "exclusion",
            MapKey::On => "on",
            MapKey::Off => "off",
            MapKey::ExposureOn => "exposure_on",
            MapKey::ExposureOff => "exposure_off",
            MapKey::Alpha => "alpha",
        }
    }

    /// Unit of a freshly allocated output map for this key.
    pub fn unit(self) -> Unit {
        match self {
            MapKey::Exposure => Unit::SquareMeterSecond,
            _ => Unit::Dimensionless,
        }
    }

    /// Whether this key lives on the true-energy geometry.
    pub fn uses_true_energy(self) -> bool {
        matches!(
            self,
            MapKey::Exposure | MapKey::ExposureOn | MapKey::ExposureOff
        )
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Named collection of maps, ordered by key.
pub type MapSet = BTreeMap<MapKey, Map>;

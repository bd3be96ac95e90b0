use crate::events::EventList;
use crate::geom::SkyCoord;
use crate::irf::{Background2D, EffectiveAreaTable2D, EnergyDispersion, FixedPointingInfo};

/// One IACT exposure with its event list and instrument response.
///
/// Observations are read-only inputs to the map makers.
#[derive(Debug, Clone)]
pub struct Observation {
    pub obs_id: u64,
    pub pointing: SkyCoord,
    /// Dead-time corrected exposure time in seconds.
    pub livetime_s: f64,
    /// Wall-clock duration in seconds.
    pub ontime_s: f64,
    pub events: EventList,
    pub aeff: EffectiveAreaTable2D,
    pub edisp: EnergyDispersion,
    pub bkg: Background2D,
}

impl Observation {
    pub fn fixed_pointing_info(&self) -> FixedPointingInfo {
        FixedPointingInfo::new(self.pointing)
    }
}

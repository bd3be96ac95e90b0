//! Event lists and counts binning.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::geom::MapCoord;
use crate::map::{Map, MapResult};

/// Single reconstructed photon candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub energy_tev: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events with `emin <= energy < emax`.
    pub fn select_energy(&self, emin_tev: f64, emax_tev: f64) -> EventList {
        let events = self
            .events
            .iter()
            .filter(|event| event.energy_tev >= emin_tev && event.energy_tev < emax_tev)
            .copied()
            .collect();
        Self { events }
    }

    pub fn to_coord(&self) -> MapCoord {
        MapCoord {
            lon: self.events.iter().map(|event| event.lon_deg).collect(),
            lat: self.events.iter().map(|event| event.lat_deg).collect(),
            energy: Some(self.events.iter().map(|event| event.energy_tev).collect()),
        }
    }
}

impl FromIterator<Event> for EventList {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Bins `events` into `counts`, one count per event. Events outside the map
/// are ignored.
pub fn fill_map_counts(counts: &mut Map, events: &EventList) -> MapResult<()> {
    if events.is_empty() {
        warn!("event list is empty, counts map left unchanged");
        return Ok(());
    }
    let weights = vec![1.0; events.len()];
    counts.fill_by_coord(&events.to_coord(), &weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{MapAxis, SkyCoord, WcsGeom};
    use crate::map::Unit;

    fn event(lon_deg: f64, lat_deg: f64, energy_tev: f64) -> Event {
        Event {
            lon_deg,
            lat_deg,
            energy_tev,
        }
    }

    #[test]
    fn counts_are_binned_by_position_and_energy() {
        let axis = MapAxis::from_edges(vec![1.0, 10.0, 100.0], "energy", "TeV").unwrap();
        let geom = WcsGeom::create(SkyCoord::new(0.0, 0.0), 1.0, (3.0, 3.0), Some(axis)).unwrap();
        let mut counts = Map::from_geom(geom, Unit::Dimensionless);
        let events: EventList = vec![
            event(0.1, 0.1, 2.0),
            event(-0.2, 0.3, 3.0),
            event(1.0, -1.0, 20.0),
            event(9.0, 0.0, 2.0),
            event(0.0, 0.0, 500.0),
        ]
        .into_iter()
        .collect();

        fill_map_counts(&mut counts, &events).unwrap();
        assert_eq!(counts.data()[[0, 1, 1]], 2.0);
        assert_eq!(counts.data()[[1, 0, 2]], 1.0);
        assert_eq!(counts.sum(), 3.0);
    }

    #[test]
    fn events_without_a_finite_position_are_not_counted() {
        let axis = MapAxis::energy_from_bounds(1.0, 10.0, 1).unwrap();
        let geom = WcsGeom::create(SkyCoord::new(0.0, 0.0), 1.0, (3.0, 3.0), Some(axis)).unwrap();
        let mut counts = Map::from_geom(geom, Unit::Dimensionless);
        let events = EventList::new(vec![
            event(f64::NAN, f64::NAN, 2.0),
            event(f64::NAN, 0.0, 2.0),
            event(0.0, 0.0, 2.0),
        ]);

        fill_map_counts(&mut counts, &events).unwrap();
        assert_eq!(counts.data()[[0, 0, 0]], 0.0);
        assert_eq!(counts.data()[[0, 1, 1]], 1.0);
        assert_eq!(counts.sum(), 1.0);
    }

    #[test]
    fn select_energy_is_half_open() {
        let events = EventList::new(vec![event(0.0, 0.0, 1.0), event(0.0, 0.0, 2.0)]);
        assert_eq!(events.select_energy(1.0, 2.0).len(), 1);
        assert!(events.select_energy(5.0, 6.0).is_empty());
    }
}

use serde::{Deserialize, Serialize};

use crate::geo::geodesy::{haversine_m, initial_bearing_deg, METERS_PER_NM};
use crate::geo::units::MeasurementSystem;
use crate::prelude::{LatLon, Mmsi};
use crate::state::registry::VesselRegistry;

/// End of a measurement: a fixed point, or a vessel that moves with the feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Anchor {
    Point(LatLon),
    Vessel(Mmsi),
}

impl Anchor {
    pub fn resolve(&self, registry: &VesselRegistry) -> Option<LatLon> {
        match self {
            Anchor::Point(point) => Some(*point),
            Anchor::Vessel(mmsi) => registry.position(*mmsi),
        }
    }

    pub fn vessel(&self) -> Option<Mmsi> {
        match self {
            Anchor::Vessel(mmsi) => Some(*mmsi),
            Anchor::Point(_) => None,
        }
    }

    pub fn label(&self, registry: &VesselRegistry) -> String {
        match self {
            Anchor::Point(point) => format!("{:.4}, {:.4}", point.lat, point.lon),
            Anchor::Vessel(mmsi) => registry
                .get(*mmsi)
                .map_or_else(|| mmsi.to_string(), |record| record.display_name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub start: Anchor,
    pub end: Option<Anchor>,
    pub visible: bool,
}

/// Distance and bearing of a measurement at the current positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureSolution {
    pub from: LatLon,
    pub to: LatLon,
    pub distance_m: f64,
    pub bearing_deg: f64,
}

impl MeasureSolution {
    pub fn between(from: LatLon, to: LatLon) -> Self {
        Self {
            from,
            to,
            distance_m: haversine_m(from, to),
            bearing_deg: initial_bearing_deg(from, to),
        }
    }

    pub fn distance_text(&self, system: MeasurementSystem) -> String {
        system.format_distance_nm(self.distance_m / METERS_PER_NM)
    }

    pub fn bearing_text(&self) -> String {
        format!("{:.0}", self.bearing_deg)
    }

    pub fn label(&self, system: MeasurementSystem) -> String {
        format!(
            "{} {}, {} degrees",
            self.distance_text(system),
            system.distance_unit(),
            self.bearing_text()
        )
    }
}

impl Measurement {
    pub fn new(start: Anchor, end: Anchor) -> Self {
        Self {
            start,
            end: Some(end),
            visible: true,
        }
    }

    pub fn solve(&self, registry: &VesselRegistry) -> Option<MeasureSolution> {
        let from = self.start.resolve(registry)?;
        let to = self.end?.resolve(registry)?;
        Some(MeasureSolution::between(from, to))
    }

    /// False once a vessel anchor has left the registry.
    pub fn is_resolvable(&self, registry: &VesselRegistry) -> bool {
        [Some(self.start), self.end]
            .into_iter()
            .flatten()
            .filter_map(|anchor| anchor.vessel())
            .all(|mmsi| registry.contains(mmsi))
    }
}

/// Completed measurements in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementList {
    items: Vec<Measurement>,
}

impl MeasurementList {
    pub fn push(&mut self, measurement: Measurement) -> usize {
        self.items.push(measurement);
        self.items.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Measurement> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Returns the new visibility, or `None` for an unknown index.
    pub fn toggle_visibility(&mut self, index: usize) -> Option<bool> {
        let item = self.items.get_mut(index)?;
        item.visible = !item.visible;
        Some(item.visible)
    }

    pub fn get(&self, index: usize) -> Option<&Measurement> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Measurement> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drops measurements tied to vanished vessels; returns how many.
    pub fn retain_resolvable(&mut self, registry: &VesselRegistry) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.is_resolvable(registry));
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::vessel::VesselRecord;

    fn registry_with(mmsi: Mmsi, position: LatLon) -> VesselRegistry {
        let mut record = VesselRecord::new(mmsi);
        record.position = Some(position);
        let mut registry = VesselRegistry::new();
        registry.replace(vec![record]);
        registry
    }

    #[test]
    fn vessel_anchor_follows_the_registry() {
        let start = LatLon::new(52.0, 4.0);
        let measurement = Measurement::new(Anchor::Point(start), Anchor::Vessel(7));

        let registry = registry_with(7, LatLon::new(52.0, 4.1));
        let first = measurement.solve(&registry).unwrap();
        let registry = registry_with(7, LatLon::new(52.1, 4.0));
        let second = measurement.solve(&registry).unwrap();

        assert_eq!(first.from, start);
        assert!((first.bearing_deg - 90.0).abs() < 0.1);
        assert_eq!(second.bearing_text(), "0");
        assert!((second.distance_m - haversine_m(start, LatLon::new(52.1, 4.0))).abs() < 1e-9);
        assert_eq!(second.label(MeasurementSystem::Nautical), "6.0 nmi, 0 degrees");
    }

    #[test]
    fn vanished_vessels_drop_their_measurements() {
        let mut list = MeasurementList::default();
        list.push(Measurement::new(Anchor::Vessel(7), Anchor::Point(LatLon::new(1.0, 1.0))));
        list.push(Measurement::new(
            Anchor::Point(LatLon::new(2.0, 2.0)),
            Anchor::Point(LatLon::new(1.0, 1.0)),
        ));

        let registry = registry_with(8, LatLon::new(1.0, 1.0));
        assert!(list.get(0).unwrap().solve(&registry).is_none());
        assert_eq!(list.retain_resolvable(&registry), 1);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().start.vessel(), None);
    }

    #[test]
    fn visibility_and_removal_by_index() {
        let mut list = MeasurementList::default();
        let point = Anchor::Point(LatLon::new(1.0, 1.0));
        list.push(Measurement::new(point, point));
        assert_eq!(list.toggle_visibility(0), Some(false));
        assert_eq!(list.toggle_visibility(3), None);
        assert!(list.remove(1).is_none());
        assert!(list.remove(0).is_some());
        assert!(list.is_empty());
    }

    #[test]
    fn anchors_serialize_with_type_tags() {
        let json = serde_json::to_value(Anchor::Vessel(9)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "vessel", "value": 9}));
    }
}

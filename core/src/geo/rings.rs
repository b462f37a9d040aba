use crate::geo::geodesy::LocalFrame;
use crate::geo::units::MeasurementSystem;
use crate::prelude::LatLon;

/// Nominal ring distances in thousandths of the active distance unit.
pub const RING_DISTANCES: [f64; 5] = [5000.0, 10000.0, 25000.0, 50000.0, 100000.0];
pub const RING_POINTS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceRing {
    /// Distance in display units.
    pub nominal: f64,
    pub radius_m: f64,
    pub points: Vec<LatLon>,
    pub tooltip: String,
}

pub fn distance_rings(station: LatLon, system: MeasurementSystem) -> Vec<DistanceRing> {
    let frame = LocalFrame::at(station);
    let unit = system.distance_unit().to_uppercase();
    RING_DISTANCES
        .iter()
        .map(|distance| {
            let radius_m = distance * system.ring_factor();
            let nominal = distance / 1000.0;
            DistanceRing {
                nominal,
                radius_m,
                points: frame.circle(radius_m, RING_POINTS),
                tooltip: format!("{} {}", nominal, unit),
            }
        })
        .collect()
}

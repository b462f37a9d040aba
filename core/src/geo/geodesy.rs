//! Small-step geodesy.
//!
//! Offsets are linearized around an origin: the destination of a fixed
//! 100 m step is computed on a sphere and scaled down to one meter, then
//! multiplied back out by whatever distance is needed. Good at hull scale,
//! visibly off at a few hundred kilometers.

use std::f64::consts::PI;

use crate::prelude::LatLon;

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
/// Mean radius used for measurements.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;
pub const METERS_PER_NM: f64 = 1852.0;
const STEP_M: f64 = 100.0;

/// Degrees of latitude and longitude per meter of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterOffset {
    pub dlat: f64,
    pub dlon: f64,
}

pub fn offset_per_meter(origin: LatLon, heading_deg: f64) -> MeterOffset {
    let lat = origin.lat.to_radians();
    let heading = heading_deg.rem_euclid(360.0).to_radians();
    let angular = STEP_M / EARTH_RADIUS_M;

    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_d, cos_d) = angular.sin_cos();

    let sin_lat2 = (sin_lat * cos_d + cos_lat * sin_d * heading.cos()).clamp(-1.0, 1.0);
    let lat2 = sin_lat2.asin();
    let dlon = (heading.sin() * sin_d * cos_lat).atan2(cos_d - sin_lat * sin_lat2);

    MeterOffset {
        dlat: (lat2.to_degrees() - origin.lat) / STEP_M,
        dlon: dlon.to_degrees() / STEP_M,
    }
}

pub fn move_by(point: LatLon, offset: MeterOffset, distance_m: f64) -> LatLon {
    LatLon::new(
        point.lat + offset.dlat * distance_m,
        point.lon + offset.dlon * distance_m,
    )
}

/// North and east unit offsets at a fixed origin, for projecting many points
/// around the same center.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    origin: LatLon,
    north: MeterOffset,
    east: MeterOffset,
}

impl LocalFrame {
    pub fn at(origin: LatLon) -> Self {
        Self {
            origin,
            north: offset_per_meter(origin, 0.0),
            east: offset_per_meter(origin, 90.0),
        }
    }

    pub fn origin(&self) -> LatLon {
        self.origin
    }

    /// Point `distance_m` away at `angle_rad`, clockwise from north.
    pub fn project(&self, distance_m: f64, angle_rad: f64) -> LatLon {
        LatLon::new(
            self.origin.lat + distance_m * self.north.dlat * angle_rad.cos(),
            self.origin.lon + distance_m * self.east.dlon * angle_rad.sin(),
        )
    }

    /// `count` points evenly spaced on a circle, starting north.
    pub fn circle(&self, radius_m: f64, count: usize) -> Vec<LatLon> {
        (0..count)
            .map(|i| self.project(radius_m, i as f64 / count as f64 * 2.0 * PI))
            .collect()
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(from: LatLon, to: LatLon) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.lon - from.lon).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial great-circle bearing in degrees, `[0, 360)`.
pub fn initial_bearing_deg(from: LatLon, to: LatLon) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const METER_DEG: f64 = 180.0 / (PI * EARTH_RADIUS_M);

    #[test]
    fn zero_distance_returns_origin_for_any_heading() {
        let origin = LatLon::new(51.9, 4.5);
        for heading in (0..720).map(|h| h as f64 * 0.5 - 90.0) {
            let offset = offset_per_meter(origin, heading);
            assert_eq!(move_by(origin, offset, 0.0), origin);
        }
    }

    #[test]
    fn cardinal_offsets_have_expected_magnitude() {
        let origin = LatLon::new(0.0, 10.0);
        let north = offset_per_meter(origin, 0.0);
        assert!((north.dlat - METER_DEG).abs() < 1e-12);
        assert!(north.dlon.abs() < 1e-15);

        let east = offset_per_meter(origin, 90.0);
        assert!(east.dlat.abs() < 1e-12);
        assert!((east.dlon - METER_DEG).abs() < 1e-12);

        let west = offset_per_meter(origin, -90.0);
        assert!((west.dlon + METER_DEG).abs() < 1e-12);
    }

    #[test]
    fn longitude_offsets_stretch_with_latitude() {
        let east = offset_per_meter(LatLon::new(60.0, 0.0), 90.0);
        assert!((east.dlon - 2.0 * METER_DEG).abs() < 1e-9);
    }

    #[test]
    fn frame_projects_on_the_circle() {
        let frame = LocalFrame::at(LatLon::new(52.0, 4.0));
        let ring = frame.circle(10_000.0, 36);
        assert_eq!(ring.len(), 36);
        for point in ring {
            let d = haversine_m(frame.origin(), point);
            assert!((d - 10_000.0).abs() < 50.0, "distance {}", d);
        }
    }

    #[test]
    fn measurement_helpers() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(1.0, 0.0);
        assert!((haversine_m(a, b) - 111_195.08).abs() < 1.0);
        assert!((initial_bearing_deg(a, LatLon::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_deg(b, a) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_deg(a, LatLon::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }
}

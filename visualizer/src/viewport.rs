use iced::{Point, Size};
use std::f64::consts::PI;
use vesselcore::interaction::ScreenPoint;
use vesselcore::LatLon;

const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 3.0;
pub const MAX_ZOOM: f64 = 18.0;
const MAX_LAT: f64 = 85.051_128_78;

/// Web Mercator view of the map canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLon,
    pub zoom: f64,
    pub size: Size,
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

fn to_world(position: LatLon, zoom: f64) -> (f64, f64) {
    let lat = position.lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let size = world_size(zoom);
    let x = (position.lon + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

fn from_world(x: f64, y: f64, zoom: f64) -> LatLon {
    let size = world_size(zoom);
    let lon = x / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    LatLon::new(lat, lon)
}

impl Viewport {
    pub fn new(center: LatLon, zoom: f64, size: Size) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            size,
        }
    }

    pub fn project(&self, position: LatLon) -> Point {
        let (cx, cy) = to_world(self.center, self.zoom);
        let (x, y) = to_world(position, self.zoom);
        Point::new(
            (x - cx + f64::from(self.size.width) / 2.0) as f32,
            (y - cy + f64::from(self.size.height) / 2.0) as f32,
        )
    }

    pub fn screen(&self, position: LatLon) -> ScreenPoint {
        let point = self.project(position);
        ScreenPoint::new(point.x, point.y)
    }

    pub fn unproject(&self, point: Point) -> LatLon {
        let (cx, cy) = to_world(self.center, self.zoom);
        let x = cx + f64::from(point.x) - f64::from(self.size.width) / 2.0;
        let y = cy + f64::from(point.y) - f64::from(self.size.height) / 2.0;
        from_world(x, y, self.zoom)
    }

    /// Moves the map with the pointer by a screen delta.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let (cx, cy) = to_world(self.center, self.zoom);
        self.center = from_world(cx - f64::from(dx), cy - f64::from(dy), self.zoom);
    }

    /// Zooms by `steps`, keeping the point under `anchor` in place.
    pub fn zoom_at(&mut self, steps: f64, anchor: Point) {
        let fixed = self.unproject(anchor);
        self.zoom = (self.zoom + steps).clamp(MIN_ZOOM, MAX_ZOOM);
        let drift = self.project(fixed);
        self.pan(anchor.x - drift.x, anchor.y - drift.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(LatLon::new(51.9, 4.5), 12.0, Size::new(800.0, 600.0))
    }

    #[test]
    fn center_projects_to_the_middle() {
        let view = viewport();
        let point = view.project(view.center);
        assert!((point.x - 400.0).abs() < 1e-3);
        assert!((point.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn unproject_inverts_project() {
        let view = viewport();
        let position = LatLon::new(51.93, 4.47);
        let back = view.unproject(view.project(position));
        assert!((back.lat - position.lat).abs() < 1e-5);
        assert!((back.lon - position.lon).abs() < 1e-5);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let view = viewport();
        let north = view.project(LatLon::new(52.0, 4.5));
        let east = view.project(LatLon::new(51.9, 4.6));
        assert!(north.y < 300.0);
        assert!(east.x > 400.0);
    }

    #[test]
    fn zoom_keeps_the_anchor_in_place() {
        let mut view = viewport();
        let anchor = Point::new(600.0, 200.0);
        let under = view.unproject(anchor);
        view.zoom_at(1.0, anchor);
        assert_eq!(view.zoom, 13.0);
        let after = view.project(under);
        assert!((after.x - anchor.x).abs() < 0.5);
        assert!((after.y - anchor.y).abs() < 0.5);

        view.zoom_at(20.0, anchor);
        assert_eq!(view.zoom, MAX_ZOOM);
    }
}

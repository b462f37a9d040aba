use crate::interaction::machine::ScreenPoint;
use crate::interaction::target::Hit;
use crate::prelude::LatLon;
use crate::render::scene::{RangeKind, RenderScene};

pub const HIT_TOLERANCE_PX: f32 = 10.0;

fn distance(a: ScreenPoint, b: ScreenPoint) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn segment_distance(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    distance(p, ScreenPoint::new(a.x + t * dx, a.y + t * dy))
}

/// Distance from `p` to the closed outline through `points`.
fn ring_distance(p: ScreenPoint, points: &[ScreenPoint]) -> f32 {
    let Some(last) = points.last() else {
        return f32::INFINITY;
    };
    let mut previous = *last;
    let mut best = f32::INFINITY;
    for point in points {
        best = best.min(segment_distance(p, previous, *point));
        previous = *point;
    }
    best
}

fn contains(p: ScreenPoint, polygon: &[ScreenPoint]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Topmost feature at `cursor`.
///
/// Vessel markers win (nearest within `tolerance`), then footprints the
/// cursor is inside, then distance rings and range outlines within
/// `tolerance` of their line.
pub fn hit_test(
    scene: &RenderScene,
    cursor: ScreenPoint,
    project: impl Fn(LatLon) -> ScreenPoint,
    tolerance: f32,
) -> Option<Hit> {
    let nearest = scene
        .markers
        .iter()
        .map(|marker| (marker.mmsi, distance(cursor, project(marker.position))))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((mmsi, _)) = nearest {
        return Some(Hit::Vessel(mmsi));
    }

    for footprint in scene.footprints.iter().rev() {
        let outline: Vec<ScreenPoint> = footprint.ring.iter().map(|p| project(*p)).collect();
        if contains(cursor, &outline) {
            return Some(Hit::Vessel(footprint.mmsi));
        }
    }

    for (index, ring) in scene.distance_rings.iter().enumerate() {
        let outline: Vec<ScreenPoint> = ring.points.iter().map(|p| project(*p)).collect();
        if ring_distance(cursor, &outline) <= tolerance {
            return Some(Hit::DistanceRing {
                index,
                tooltip: ring.tooltip.clone(),
            });
        }
    }

    for overlay in &scene.range {
        let outline: Vec<ScreenPoint> = overlay.points.iter().map(|p| project(*p)).collect();
        if ring_distance(cursor, &outline) <= tolerance {
            return Some(Hit::RangeRing {
                short: overlay.kind == RangeKind::Short,
                tooltip: overlay.tooltip.clone(),
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::rings::DistanceRing;
    use crate::render::scene::{Footprint, VesselMarker};
    use crate::wire::vessel::ShipClass;

    // one degree is 100 px, y grows southwards
    fn project(p: LatLon) -> ScreenPoint {
        ScreenPoint::new((p.lon * 100.0) as f32, (-p.lat * 100.0) as f32)
    }

    fn marker(mmsi: u32, lat: f64, lon: f64) -> VesselMarker {
        VesselMarker {
            mmsi,
            position: LatLon::new(lat, lon),
            rotation: None,
            shipclass: ShipClass::Cargo,
            opacity: 1.0,
            hovered: false,
            selected: false,
        }
    }

    fn square(lat: f64, lon: f64, half: f64) -> Vec<LatLon> {
        vec![
            LatLon::new(lat + half, lon - half),
            LatLon::new(lat + half, lon + half),
            LatLon::new(lat - half, lon + half),
            LatLon::new(lat - half, lon - half),
        ]
    }

    #[test]
    fn nearest_marker_wins() {
        let scene = RenderScene {
            markers: vec![marker(1, 1.0, 1.0), marker(2, 1.0, 1.05)],
            ..RenderScene::default()
        };
        let hit = hit_test(&scene, ScreenPoint::new(104.0, -100.0), project, HIT_TOLERANCE_PX);
        assert_eq!(hit, Some(Hit::Vessel(2)));
        let miss = hit_test(&scene, ScreenPoint::new(150.0, -100.0), project, HIT_TOLERANCE_PX);
        assert_eq!(miss, None);
    }

    #[test]
    fn footprint_interior_hits_its_vessel() {
        let scene = RenderScene {
            footprints: vec![Footprint {
                mmsi: 9,
                ring: square(2.0, 2.0, 0.3),
                oriented: true,
            }],
            ..RenderScene::default()
        };
        let hit = hit_test(&scene, ScreenPoint::new(210.0, -190.0), project, HIT_TOLERANCE_PX);
        assert_eq!(hit, Some(Hit::Vessel(9)));
    }

    #[test]
    fn ring_outlines_hit_only_near_the_line() {
        let scene = RenderScene {
            distance_rings: vec![DistanceRing {
                nominal: 5.0,
                radius_m: 9260.0,
                points: square(0.0, 0.0, 1.0),
                tooltip: "5 NMI".into(),
            }],
            ..RenderScene::default()
        };
        let on_edge = hit_test(&scene, ScreenPoint::new(95.0, 0.0), project, HIT_TOLERANCE_PX);
        assert_eq!(
            on_edge,
            Some(Hit::DistanceRing {
                index: 0,
                tooltip: "5 NMI".into()
            })
        );
        let inside = hit_test(&scene, ScreenPoint::new(0.0, 0.0), project, HIT_TOLERANCE_PX);
        assert_eq!(inside, None);
    }
}

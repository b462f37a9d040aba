use crate::geo::geodesy::{move_by, offset_per_meter, LocalFrame};
use crate::prelude::LatLon;
use crate::wire::vessel::VesselRecord;

/// Share of the hull length taken by the parallel body; the rest tapers to
/// the bow.
const BODY_FRACTION: f64 = 0.8;
/// Points used when a circular outline is drawn as a ring.
pub const CIRCLE_POINTS: usize = 36;

/// Footprint of a vessel drawn to scale.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    /// Closed ring: the first point is repeated at the end.
    Polygon(Vec<LatLon>),
    /// Used when the orientation is unknown.
    Circle { center: LatLon, radius_m: f64 },
}

impl Outline {
    pub fn is_polygon(&self) -> bool {
        matches!(self, Outline::Polygon(_))
    }

    /// Outline as a closed ring of points.
    pub fn ring(&self) -> Vec<LatLon> {
        match self {
            Outline::Polygon(points) => points.clone(),
            Outline::Circle { center, radius_m } => {
                let mut ring = LocalFrame::at(*center).circle(*radius_m, CIRCLE_POINTS);
                if let Some(first) = ring.first().copied() {
                    ring.push(first);
                }
                ring
            }
        }
    }
}

/// Builds the footprint of a vessel from its antenna offsets.
///
/// Returns `None` without a fix or a complete set of hull offsets. Without an
/// effective heading the outline degrades to a circle of radius
/// `max(to_bow, to_stern)` around the reported position.
pub fn ship_outline(record: &VesselRecord) -> Option<Outline> {
    let position = record.position?;
    let dims = record.hull.dimensions()?;

    let heading = match record.kinematics.effective_heading() {
        Some(heading) => heading,
        None => {
            return Some(Outline::Circle {
                center: position,
                radius_m: dims.to_bow.max(dims.to_stern),
            })
        }
    };

    let ahead = offset_per_meter(position, heading);
    let starboard = offset_per_meter(position, heading + 90.0);
    let length = dims.length();
    let beam = dims.beam();

    let stern = move_by(position, ahead, -dims.to_stern);
    let stern_starboard = move_by(stern, starboard, dims.to_starboard);
    let stern_port = move_by(stern, starboard, -dims.to_port);
    let shoulder_port = move_by(stern_port, ahead, BODY_FRACTION * length);
    let bow = move_by(
        move_by(shoulder_port, starboard, 0.5 * beam),
        ahead,
        (1.0 - BODY_FRACTION) * length,
    );
    let shoulder_starboard = move_by(shoulder_port, starboard, beam);

    Some(Outline::Polygon(vec![
        stern_starboard,
        stern_port,
        shoulder_port,
        bow,
        shoulder_starboard,
        stern_starboard,
    ]))
}

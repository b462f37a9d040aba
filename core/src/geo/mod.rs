pub mod geodesy;
pub mod outline;
pub mod range;
pub mod rings;
pub mod units;

pub use geodesy::{
    haversine_m, initial_bearing_deg, move_by, offset_per_meter, LocalFrame, MeterOffset,
    EARTH_RADIUS_M, METERS_PER_NM,
};
pub use outline::{ship_outline, Outline};
pub use range::{range_polygon, RangeProfile, RangeTimeframe};
pub use rings::{distance_rings, DistanceRing, RING_DISTANCES, RING_POINTS};
pub use units::{format_age, MeasurementSystem};

pub mod measure;
pub mod registry;
pub mod session;
pub mod tracks;

pub use measure::{Anchor, MeasureSolution, Measurement, MeasurementList};
pub use registry::VesselRegistry;
pub use session::{MapSession, Notice};
pub use tracks::{TrackManager, TrackOwners, TrackRequest, TrackVisibility};

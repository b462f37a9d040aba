pub mod flags;
pub mod history;
pub mod paths;
pub mod schema;
pub mod snapshot;
pub mod vessel;

pub use flags::{FlagWord, Validation};
pub use history::{BucketSeries, HistoryResponse, SectorStat};
pub use paths::PathResponse;
pub use schema::{Field, FieldKind, Row, RowBuilder, FIELDS, REQUIRED_ARITY};
pub use snapshot::{
    sanitize_text, DecodeReport, Decoded, InclusionFilter, RowCheck, SnapshotDecoder,
    SnapshotResponse, StationRecord,
};
pub use vessel::{
    Classification, Eta, Hull, HullDimensions, Identity, Kinematics, MmsiType, Quality, ShipClass,
    VesselRecord, COURSE_SPEED_THRESHOLD_KN,
};

pub mod hit;
pub mod scene;
pub mod sync;
pub mod table;

pub use hit::{hit_test, HIT_TOLERANCE_PX};
pub use scene::{
    Footprint, MeasureLine, MeasurementRow, RangeKind, RangeOverlay, RenderScene, TrackLine,
    VesselLabel, VesselMarker, ViewState,
};
pub use sync::build_scene;
pub use table::{
    build_table, compare_number, compare_text, SortOrder, TableColumn, TableRow, TABLE_ROW_LIMIT,
};

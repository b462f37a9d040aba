use crate::geo::rings::DistanceRing;
use crate::prelude::{LatLon, Mmsi};
use crate::state::tracks::TrackVisibility;
use crate::wire::vessel::ShipClass;

/// Map viewport parameters that influence what is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { zoom: 10.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VesselMarker {
    pub mmsi: Mmsi,
    pub position: LatLon,
    /// Degrees true; `None` draws an unrotated marker.
    pub rotation: Option<f64>,
    pub shipclass: ShipClass,
    pub opacity: f32,
    pub hovered: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub mmsi: Mmsi,
    /// Closed ring.
    pub ring: Vec<LatLon>,
    /// False for the circular fallback.
    pub oriented: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VesselLabel {
    pub mmsi: Mmsi,
    pub position: LatLon,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackLine {
    pub mmsi: Mmsi,
    /// Most recent first.
    pub points: Vec<LatLon>,
    pub visibility: TrackVisibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeOverlay {
    pub kind: RangeKind,
    pub points: Vec<LatLon>,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureLine {
    pub index: usize,
    pub from: LatLon,
    pub to: LatLon,
    pub label: String,
}

/// One line of the measurement list, drawn or not.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub index: usize,
    pub from: String,
    pub to: String,
    pub distance: Option<String>,
    pub bearing: Option<String>,
    pub visible: bool,
}

/// Everything the client draws, rebuilt from scratch on every refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderScene {
    pub markers: Vec<VesselMarker>,
    pub footprints: Vec<Footprint>,
    pub labels: Vec<VesselLabel>,
    pub tracks: Vec<TrackLine>,
    pub range: Vec<RangeOverlay>,
    pub distance_rings: Vec<DistanceRing>,
    pub measure_lines: Vec<MeasureLine>,
    pub measurement_rows: Vec<MeasurementRow>,
    /// Provisional line of the measurement in progress.
    pub preview: Option<MeasureLine>,
    pub hover_marker: Option<LatLon>,
    pub selection_marker: Option<LatLon>,
    pub station: Option<LatLon>,
    pub vessel_count: usize,
}

impl RenderScene {
    pub fn marker(&self, mmsi: Mmsi) -> Option<&VesselMarker> {
        self.markers.iter().find(|marker| marker.mmsi == mmsi)
    }

    pub fn track(&self, mmsi: Mmsi) -> Option<&TrackLine> {
        self.tracks.iter().find(|track| track.mmsi == mmsi)
    }
}

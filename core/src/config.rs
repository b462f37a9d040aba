//! Operator preferences read by the core.
//!
//! The settings are owned and persisted by the surrounding client; the core
//! only reads them. Every field has a default so partial documents load.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geo::range::RangeTimeframe;
use crate::geo::units::MeasurementSystem;
use crate::render::table::{SortOrder, TableColumn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    Always,
    #[default]
    Never,
    /// Shown past the label zoom threshold.
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub metric: MeasurementSystem,
    pub show_labels: LabelMode,
    pub label_zoom: f64,
    pub shape_zoom: f64,
    /// Draw the circular fallback for vessels without an orientation.
    pub show_circle_outline: bool,
    pub show_track_on_hover: bool,
    pub show_track_on_select: bool,
    pub fading: bool,
    pub show_range: bool,
    /// The one-hour ring drawn inside the long one.
    pub show_short_range: bool,
    pub range_timeframe: RangeTimeframe,
    pub distance_circles: bool,
    pub track_point_cap: usize,
    pub hover_debounce_ms: u64,
    pub click_delay_ms: u64,
    pub refresh_interval_ms: u64,
    pub range_refresh_min: u64,
    pub table_column: TableColumn,
    pub table_order: SortOrder,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            metric: MeasurementSystem::Nautical,
            show_labels: LabelMode::Never,
            label_zoom: 11.5,
            shape_zoom: 11.5,
            show_circle_outline: false,
            show_track_on_hover: false,
            show_track_on_select: false,
            fading: false,
            show_range: false,
            show_short_range: false,
            range_timeframe: RangeTimeframe::Day,
            distance_circles: true,
            track_point_cap: 250,
            hover_debounce_ms: 250,
            click_delay_ms: 300,
            refresh_interval_ms: 2500,
            range_refresh_min: 15,
            table_column: TableColumn::Shipname,
            table_order: SortOrder::Ascending,
        }
    }
}

impl ViewSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(100))
    }

    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }

    pub fn range_refresh(&self) -> Duration {
        Duration::from_secs(self.range_refresh_min * 60)
    }

    pub fn labels_visible(&self, zoom: f64) -> bool {
        match self.show_labels {
            LabelMode::Always => true,
            LabelMode::Never => false,
            LabelMode::Dynamic => zoom > self.label_zoom,
        }
    }

    /// Marker opacity for a vessel last heard `last_signal` seconds ago.
    pub fn opacity(&self, last_signal: Option<u64>) -> f32 {
        if !self.fading {
            return 1.0;
        }
        let age = last_signal.unwrap_or(0) as f64;
        (1.0 - age / 1800.0 * 0.8).clamp(0.2, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fill_in_defaults() {
        let settings: ViewSettings =
            serde_json::from_str(r#"{"metric": "SI", "show_labels": "dynamic"}"#).unwrap();
        assert_eq!(settings.metric, MeasurementSystem::Metric);
        assert_eq!(settings.show_labels, LabelMode::Dynamic);
        assert_eq!(settings.refresh_interval(), Duration::from_millis(2500));
        assert_eq!(settings.track_point_cap, 250);
        assert!(settings.distance_circles);
        assert!(!settings.labels_visible(11.0));
        assert!(settings.labels_visible(12.0));
    }

    #[test]
    fn fading_lowers_opacity_with_age() {
        let mut settings = ViewSettings::default();
        assert_eq!(settings.opacity(Some(3600)), 1.0);
        settings.fading = true;
        assert_eq!(settings.opacity(Some(0)), 1.0);
        assert!((settings.opacity(Some(900)) - 0.6).abs() < 1e-6);
        assert!((settings.opacity(Some(7200)) - 0.2).abs() < 1e-6);
    }
}

//! Rebuilds the drawable scene from the session.

use crate::geo::outline::{ship_outline, Outline};
use crate::geo::range::range_polygon;
use crate::geo::rings::distance_rings;
use crate::interaction::machine::MeasureMode;
use crate::render::scene::{
    Footprint, MeasureLine, MeasurementRow, RangeKind, RangeOverlay, RenderScene, TrackLine,
    VesselLabel, VesselMarker, ViewState,
};
use crate::state::measure::MeasureSolution;
use crate::state::session::MapSession;

/// Builds the scene without touching the session. Call
/// [`MapSession::render`] to clear dangling references first.
pub fn build_scene(session: &MapSession, view: &ViewState) -> RenderScene {
    let settings = &session.settings;
    let registry = &session.registry;
    let hovered = session.interaction.hovered_vessel();
    let selected = session.interaction.selected;
    let shapes_visible = view.zoom > settings.shape_zoom;
    let labels_visible = settings.labels_visible(view.zoom);

    let mut scene = RenderScene {
        station: session.station_position(),
        vessel_count: registry.len(),
        ..RenderScene::default()
    };

    let mut vessels: Vec<_> = registry.all().collect();
    vessels.sort_by_key(|record| record.mmsi);

    for record in vessels {
        let Some(position) = record.position else {
            continue;
        };
        scene.markers.push(VesselMarker {
            mmsi: record.mmsi,
            position,
            rotation: record.kinematics.rotation(),
            shipclass: record.classification.shipclass,
            opacity: settings.opacity(record.last_signal),
            hovered: hovered == Some(record.mmsi),
            selected: selected == Some(record.mmsi),
        });

        if shapes_visible {
            match ship_outline(record) {
                Some(outline @ Outline::Polygon(_)) => scene.footprints.push(Footprint {
                    mmsi: record.mmsi,
                    ring: outline.ring(),
                    oriented: true,
                }),
                Some(outline @ Outline::Circle { .. }) if settings.show_circle_outline => {
                    scene.footprints.push(Footprint {
                        mmsi: record.mmsi,
                        ring: outline.ring(),
                        oriented: false,
                    })
                }
                _ => {}
            }
        }

        if labels_visible {
            scene.labels.push(VesselLabel {
                mmsi: record.mmsi,
                position,
                text: record.display_name(),
            });
        }
    }

    let owners = session.tracks.owners();
    let cap = settings.track_point_cap;
    let mut tracks: Vec<TrackLine> = session
        .tracks
        .visible()
        .filter(|(mmsi, _)| registry.contains(*mmsi))
        .map(|(mmsi, points)| TrackLine {
            mmsi,
            points: points.iter().take(cap).copied().collect(),
            visibility: owners.visibility(mmsi),
        })
        .collect();
    tracks.sort_by_key(|track| track.mmsi);
    scene.tracks = tracks;

    if let Some(station) = scene.station {
        if settings.show_range {
            if let Some(profile) = &session.range {
                scene.range.push(RangeOverlay {
                    kind: RangeKind::Long,
                    points: range_polygon(station, &profile.long),
                    tooltip: format!("Station Range {}", profile.timeframe.label()),
                });
                if settings.show_short_range {
                    scene.range.push(RangeOverlay {
                        kind: RangeKind::Short,
                        points: range_polygon(station, &profile.short),
                        tooltip: "Station Range 1h".into(),
                    });
                }
            }
        }
        if settings.distance_circles {
            scene.distance_rings = distance_rings(station, settings.metric);
        }
    }

    for (index, measurement) in session.measurements.iter().enumerate() {
        let solution = measurement.solve(registry);
        let to = measurement
            .end
            .map(|anchor| anchor.label(registry))
            .unwrap_or_default();
        scene.measurement_rows.push(MeasurementRow {
            index,
            from: measurement.start.label(registry),
            to,
            distance: solution.map(|s| s.distance_text(settings.metric)),
            bearing: solution.map(|s| s.bearing_text()),
            visible: measurement.visible,
        });
        if let (true, Some(solution)) = (measurement.visible, solution) {
            scene.measure_lines.push(MeasureLine {
                index,
                from: solution.from,
                to: solution.to,
                label: solution.label(settings.metric),
            });
        }
    }

    if let MeasureMode::Anchored {
        start,
        preview: Some(end),
    } = session.interaction.measure
    {
        if let Some(from) = start.resolve(registry) {
            let solution = MeasureSolution::between(from, end);
            scene.preview = Some(MeasureLine {
                index: scene.measure_lines.len(),
                from,
                to: end,
                label: solution.label(settings.metric),
            });
        }
    }

    scene.hover_marker = hovered.and_then(|mmsi| registry.position(mmsi));
    scene.selection_marker = selected.and_then(|mmsi| registry.position(mmsi));
    scene
}

impl MapSession {
    /// Clears references to vanished vessels, then builds the scene.
    pub fn render(&mut self, view: &ViewState) -> RenderScene {
        self.reconcile();
        build_scene(self, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelMode;
    use crate::interaction::target::Hit;
    use crate::prelude::LatLon;
    use crate::state::measure::Anchor;
    use crate::state::tracks::TrackVisibility;
    use crate::wire::history::{BucketSeries, HistoryResponse, SectorStat};
    use crate::wire::paths::PathResponse;
    use crate::wire::schema::{Field, RowBuilder};
    use crate::wire::snapshot::{SnapshotResponse, StationRecord};
    use std::collections::BTreeMap;
    use std::time::Instant;

    fn scenario() -> SnapshotResponse {
        SnapshotResponse {
            count: Some(2),
            station: Some(StationRecord {
                lat: 51.95,
                lon: 4.4,
                mmsi: None,
            }),
            values: vec![
                RowBuilder::new(123_456_789)
                    .set(Field::Lat, 51.9)
                    .set(Field::Lon, 4.5)
                    .set(Field::Speed, 12.3)
                    .set(Field::Cog, 90.0)
                    .set(Field::ToBow, 100)
                    .set(Field::ToStern, 20)
                    .set(Field::ToPort, 10)
                    .set(Field::ToStarboard, 10)
                    .set(Field::Shipname, "NORDIC")
                    .set(Field::Flags, 0)
                    .build(),
                RowBuilder::new(244_000_001)
                    .set(Field::Lat, 52.0)
                    .set(Field::Lon, 4.6)
                    .set(Field::ToBow, 10)
                    .set(Field::ToStern, 5)
                    .set(Field::ToPort, 2)
                    .set(Field::ToStarboard, 2)
                    .build(),
                RowBuilder::new(244_000_002).build(),
            ],
        }
    }

    fn session() -> MapSession {
        let mut session = MapSession::default();
        session.apply_snapshot(&scenario());
        session
    }

    #[test]
    fn footprints_appear_past_the_zoom_threshold() {
        let mut session = session();
        let far = session.render(&ViewState { zoom: 10.0 });
        assert_eq!(far.markers.len(), 2);
        assert_eq!(far.vessel_count, 3);
        assert!(far.footprints.is_empty());

        let near = session.render(&ViewState { zoom: 13.0 });
        assert_eq!(near.footprints.len(), 1);
        assert_eq!(near.footprints[0].mmsi, 123_456_789);
        assert_eq!(near.footprints[0].ring.len(), 6);

        session.update_settings(|s| s.show_circle_outline = true);
        let near = session.render(&ViewState { zoom: 13.0 });
        assert_eq!(near.footprints.len(), 2);
        assert!(!near.footprints[1].oriented);
    }

    #[test]
    fn labels_follow_the_label_mode() {
        let mut session = session();
        assert!(session.render(&ViewState { zoom: 14.0 }).labels.is_empty());
        session.update_settings(|s| s.show_labels = LabelMode::Dynamic);
        assert!(session.render(&ViewState { zoom: 11.0 }).labels.is_empty());
        let scene = session.render(&ViewState { zoom: 12.0 });
        assert_eq!(scene.labels[0].text, "NORDIC");
        session.update_settings(|s| s.show_labels = LabelMode::Always);
        assert_eq!(session.render(&ViewState { zoom: 3.0 }).labels.len(), 2);
    }

    #[test]
    fn rings_need_station_and_toggles() {
        let mut session = session();
        let scene = session.render(&ViewState::default());
        assert_eq!(scene.distance_rings.len(), 5);
        assert!(scene.range.is_empty());

        session.toggle_range();
        let stat = SectorStat {
            radar_a: vec![10.0; 8],
            radar_b: vec![12.0; 8],
        };
        let history = HistoryResponse {
            minute: BucketSeries { stat: vec![stat.clone()] },
            hour: BucketSeries::default(),
            day: BucketSeries { stat: vec![stat] },
        };
        session.apply_history(Ok(history), Instant::now()).unwrap();
        let scene = session.render(&ViewState::default());
        assert_eq!(scene.range.len(), 1);
        assert_eq!(scene.range[0].points.len(), 16);
        assert_eq!(scene.range[0].tooltip, "Station Range 24h");

        session.update_settings(|s| s.show_short_range = true);
        let scene = session.render(&ViewState::default());
        assert_eq!(scene.range[1].kind, RangeKind::Short);

        session.apply_snapshot(&SnapshotResponse::default());
        let scene = session.render(&ViewState::default());
        assert!(scene.range.is_empty());
        assert!(scene.distance_rings.is_empty());
    }

    #[test]
    fn tracks_are_capped_and_limited_to_shown_vessels() {
        let mut session = session();
        session.update_settings(|s| s.track_point_cap = 3);
        session.show_track(123_456_789);
        let points: Vec<[f64; 2]> = (0..10).map(|i| [51.9 - i as f64 * 0.01, 4.5]).collect();
        let mut map = BTreeMap::new();
        map.insert("123456789".to_string(), points.clone());
        map.insert("244000001".to_string(), points);
        session.apply_paths(Ok(PathResponse(map))).unwrap();

        let scene = session.render(&ViewState::default());
        assert_eq!(scene.tracks.len(), 1);
        assert_eq!(scene.tracks[0].points.len(), 3);
        assert_eq!(
            scene.track(123_456_789).map(|t| t.visibility),
            Some(TrackVisibility::Explicit)
        );
    }

    #[test]
    fn measurements_render_lines_rows_and_preview() {
        let mut session = session();
        session.start_measurement_at(Anchor::Point(LatLon::new(52.0, 4.4)));
        session.end_measurement(Anchor::Vessel(244_000_001));
        session.start_measurement_at(Anchor::Vessel(123_456_789));
        session.pointer_move(
            Instant::now(),
            crate::interaction::machine::PointerEvent {
                at: Default::default(),
                position: Some(LatLon::new(52.0, 4.5)),
                hit: None,
                modifier: false,
            },
        );
        session.toggle_measurement_visibility(0);

        let scene = session.render(&ViewState::default());
        assert!(scene.measure_lines.is_empty());
        assert_eq!(scene.measurement_rows.len(), 1);
        assert!(!scene.measurement_rows[0].visible);
        assert!(scene.measurement_rows[0].distance.is_some());
        let preview = scene.preview.unwrap();
        assert_eq!(preview.from, LatLon::new(51.9, 4.5));
        assert!(preview.label.ends_with("0 degrees"));
    }

    #[test]
    fn hover_and_selection_markers_follow_the_registry() {
        let mut session = session();
        session.pointer_move(
            Instant::now(),
            crate::interaction::machine::PointerEvent {
                at: Default::default(),
                position: None,
                hit: Some(Hit::Vessel(244_000_001)),
                modifier: false,
            },
        );
        session.select(Some(123_456_789));
        let scene = session.render(&ViewState::default());
        assert_eq!(scene.hover_marker, Some(LatLon::new(52.0, 4.6)));
        assert_eq!(scene.selection_marker, Some(LatLon::new(51.9, 4.5)));
        assert!(scene.marker(123_456_789).unwrap().selected);

        session.apply_snapshot(&SnapshotResponse::default());
        let scene = session.render(&ViewState::default());
        assert!(scene.hover_marker.is_none());
        assert!(scene.selection_marker.is_none());
        assert!(session.interaction().selected().is_none());
    }
}

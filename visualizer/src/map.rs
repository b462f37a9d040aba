use crate::viewport::Viewport;
use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke, Text};
use iced::{mouse, Color, Pixels, Point, Rectangle, Renderer, Size, Theme, Vector};
use vesselcore::render::{RangeKind, RenderScene, VesselMarker};
use vesselcore::wire::ShipClass;
use vesselcore::LatLon;

const BACKGROUND: Color = Color::from_rgb(0.05, 0.08, 0.12);
const MEASURE: Color = Color::from_rgb(0.98, 0.6, 0.2);
const MARKER_SIZE: f32 = 8.0;

/// Tooltip text anchored at a screen position.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub at: Point,
}

pub fn class_color(class: ShipClass) -> Color {
    match class {
        ShipClass::Cargo => Color::from_rgb(0.55, 0.85, 0.35),
        ShipClass::Tanker => Color::from_rgb(0.9, 0.3, 0.3),
        ShipClass::Passenger => Color::from_rgb(0.3, 0.55, 0.95),
        ShipClass::HighSpeed => Color::from_rgb(0.95, 0.85, 0.25),
        ShipClass::Fishing => Color::from_rgb(0.95, 0.55, 0.75),
        ShipClass::Special => Color::from_rgb(0.25, 0.85, 0.85),
        ShipClass::ClassB => Color::from_rgb(0.95, 0.6, 0.2),
        ShipClass::Station | ShipClass::AidToNavigation => Color::from_rgb(0.8, 0.4, 0.95),
        ShipClass::Plane | ShipClass::Helicopter => Color::WHITE,
        ShipClass::SartEpirb => Color::from_rgb(1.0, 0.1, 0.1),
        ShipClass::Other | ShipClass::Unknown => Color::from_rgb(0.6, 0.6, 0.6),
    }
}

fn with_alpha(color: Color, alpha: f32) -> Color {
    Color { a: alpha, ..color }
}

fn polyline(viewport: &Viewport, points: &[LatLon], closed: bool) -> Path {
    Path::new(|builder| {
        let mut screen = points.iter().map(|p| viewport.project(*p));
        if let Some(first) = screen.next() {
            builder.move_to(first);
            for point in screen {
                builder.line_to(point);
            }
            if closed {
                builder.close();
            }
        }
    })
}

fn label(frame: &mut Frame, content: impl Into<String>, position: Point, color: Color) {
    frame.fill_text(Text {
        content: content.into(),
        position,
        color,
        size: Pixels(12.0),
        ..Text::default()
    });
}

/// Arrowhead along the rotation, or a dot when the vessel has none.
fn marker_path(center: Point, rotation: Option<f64>) -> Path {
    match rotation {
        Some(degrees) => {
            let angle = degrees.to_radians() as f32;
            let corner = |offset: f32, radius: f32| {
                let a = angle + offset;
                Point::new(center.x + radius * a.sin(), center.y - radius * a.cos())
            };
            Path::new(|builder| {
                builder.move_to(corner(0.0, MARKER_SIZE));
                builder.line_to(corner(2.5, MARKER_SIZE * 0.8));
                builder.line_to(corner(std::f32::consts::PI, MARKER_SIZE * 0.3));
                builder.line_to(corner(-2.5, MARKER_SIZE * 0.8));
                builder.close();
            })
        }
        None => Path::circle(center, MARKER_SIZE * 0.5),
    }
}

/// Draws a [`RenderScene`] through a [`Viewport`].
pub struct MapCanvas<'a> {
    pub scene: &'a RenderScene,
    pub viewport: Viewport,
    pub tooltip: Option<&'a Tooltip>,
}

impl MapCanvas<'_> {
    fn draw_overlays(&self, frame: &mut Frame, viewport: &Viewport) {
        for ring in &self.scene.distance_rings {
            frame.stroke(
                &polyline(viewport, &ring.points, true),
                Stroke::default()
                    .with_width(1.0)
                    .with_color(Color::from_rgba(0.7, 0.7, 0.8, 0.35)),
            );
            if let Some(top) = ring.points.first() {
                let at = viewport.project(*top) + Vector::new(4.0, 2.0);
                label(frame, ring.tooltip.clone(), at, Color::from_rgba(0.8, 0.8, 0.9, 0.6));
            }
        }

        for overlay in &self.scene.range {
            let path = polyline(viewport, &overlay.points, true);
            let color = match overlay.kind {
                RangeKind::Long => Color::from_rgb(0.3, 0.85, 0.5),
                RangeKind::Short => Color::from_rgb(0.3, 0.6, 0.95),
            };
            if overlay.kind == RangeKind::Long {
                frame.fill(&path, with_alpha(color, 0.08));
            }
            frame.stroke(&path, Stroke::default().with_width(1.5).with_color(color));
        }

        for track in &self.scene.tracks {
            frame.stroke(
                &polyline(viewport, &track.points, false),
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgba(0.95, 0.95, 0.4, 0.8)),
            );
        }
    }

    fn draw_vessels(&self, frame: &mut Frame, viewport: &Viewport) {
        for footprint in &self.scene.footprints {
            let color = self
                .scene
                .marker(footprint.mmsi)
                .map_or(Color::WHITE, |marker| class_color(marker.shipclass));
            let path = polyline(viewport, &footprint.ring, true);
            frame.fill(&path, with_alpha(color, 0.35));
            frame.stroke(&path, Stroke::default().with_width(1.0).with_color(color));
        }

        for marker in &self.scene.markers {
            self.draw_marker(frame, viewport, marker);
        }

        for vessel_label in &self.scene.labels {
            let at = viewport.project(vessel_label.position) + Vector::new(9.0, -14.0);
            label(frame, vessel_label.text.clone(), at, Color::WHITE);
        }

        if let Some(position) = self.scene.hover_marker {
            frame.stroke(
                &Path::circle(viewport.project(position), 12.0),
                Stroke::default().with_width(1.5).with_color(Color::WHITE),
            );
        }
        if let Some(position) = self.scene.selection_marker {
            frame.stroke(
                &Path::circle(viewport.project(position), 15.0),
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(1.0, 0.85, 0.1)),
            );
        }
        if let Some(station) = self.scene.station {
            let center = viewport.project(station);
            frame.fill(
                &Path::rectangle(center - Vector::new(4.0, 4.0), Size::new(8.0, 8.0)),
                Color::from_rgb(0.9, 0.3, 0.9),
            );
        }
    }

    fn draw_marker(&self, frame: &mut Frame, viewport: &Viewport, marker: &VesselMarker) {
        let center = viewport.project(marker.position);
        let path = marker_path(center, marker.rotation);
        frame.fill(&path, with_alpha(class_color(marker.shipclass), marker.opacity));
        let outline = if marker.selected || marker.hovered {
            Color::WHITE
        } else {
            Color::from_rgba(0.0, 0.0, 0.0, marker.opacity)
        };
        frame.stroke(&path, Stroke::default().with_width(1.0).with_color(outline));
    }

    fn draw_measurements(&self, frame: &mut Frame, viewport: &Viewport) {
        for line in self.scene.measure_lines.iter().chain(self.scene.preview.iter()) {
            let from = viewport.project(line.from);
            let to = viewport.project(line.to);
            let provisional = self.scene.preview.as_ref() == Some(line);
            let color = if provisional {
                with_alpha(MEASURE, 0.6)
            } else {
                MEASURE
            };
            frame.stroke(
                &Path::line(from, to),
                Stroke::default().with_width(2.0).with_color(color),
            );
            let middle = Point::new((from.x + to.x) / 2.0 + 6.0, (from.y + to.y) / 2.0 - 6.0);
            label(frame, line.label.clone(), middle, color);
        }
    }

    fn draw_tooltip(&self, frame: &mut Frame, bounds: Size) {
        let Some(tooltip) = self.tooltip else {
            return;
        };
        let lines = tooltip.text.lines().count().max(1) as f32;
        let widest = tooltip
            .text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0) as f32;
        let size = Size::new(widest * 7.0 + 12.0, lines * 16.0 + 8.0);
        let mut origin = tooltip.at + Vector::new(14.0, 14.0);
        origin.x = origin.x.min(bounds.width - size.width).max(0.0);
        origin.y = origin.y.min(bounds.height - size.height).max(0.0);

        frame.fill(
            &Path::rectangle(origin, size),
            Color::from_rgba(0.0, 0.0, 0.0, 0.8),
        );
        for (row, line) in tooltip.text.lines().enumerate() {
            let at = origin + Vector::new(6.0, 4.0 + row as f32 * 16.0);
            label(frame, line, at, Color::WHITE);
        }
    }
}

impl<Message> canvas::Program<Message> for MapCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);

        let viewport = Viewport {
            size: bounds.size(),
            ..self.viewport
        };
        self.draw_overlays(&mut frame, &viewport);
        self.draw_vessels(&mut frame, &viewport);
        self.draw_measurements(&mut frame, &viewport);
        self.draw_tooltip(&mut frame, bounds.size());

        vec![frame.into_geometry()]
    }
}

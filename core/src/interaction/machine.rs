//! Hover, selection and measurement handling.
//!
//! Hover and selection are independent: a vessel can be hovered and selected
//! at once. Measuring is exclusive; while it is active, clicks place anchors
//! instead of selecting. Every command records the follow-up work for the
//! client as [`UiEffect`]s on the session.

use std::time::{Duration, Instant};

use crate::config::ViewSettings;
use crate::geo::units::format_age;
use crate::interaction::schedule::Debounced;
use crate::interaction::target::Hit;
use crate::prelude::{LatLon, Mmsi};
use crate::state::measure::{Anchor, Measurement};
use crate::state::session::{MapSession, Notice};
use crate::state::tracks::TrackVisibility;

/// Pointer position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pointer input after hit testing.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub at: ScreenPoint,
    /// Geographic position under the pointer, when it is over the map.
    pub position: Option<LatLon>,
    /// Topmost feature under the pointer.
    pub hit: Option<Hit>,
    /// Measurement modifier held (ctrl, or a secondary button).
    pub modifier: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureMode {
    Off,
    /// Waiting for the start anchor.
    Armed,
    Anchored {
        start: Anchor,
        preview: Option<LatLon>,
    },
}

impl MeasureMode {
    pub fn is_active(&self) -> bool {
        !matches!(self, MeasureMode::Off)
    }
}

/// Overlay groups the client redraws independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Shapes,
    Tracks,
    Range,
    Measures,
    Markers,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::Shapes,
        Layer::Tracks,
        Layer::Range,
        Layer::Measures,
        Layer::Markers,
    ];
}

/// Work the client has to carry out after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEffect {
    ShowTooltip { text: String, at: ScreenPoint },
    HideTooltip,
    Invalidate(Layer),
    /// Close panels that cover the map before the vessel card opens.
    CloseOverlays,
    OpenCard(Mmsi),
    CloseCard,
    /// The set of wanted tracks changed; fetch paths now.
    FetchTracks,
    Notify(Notice),
    Crosshair(bool),
}

#[derive(Debug, Clone)]
pub struct InteractionState {
    pub(crate) hover: Option<Hit>,
    pub(crate) selected: Option<Mmsi>,
    pub(crate) measure: MeasureMode,
    pub(crate) hover_track: Debounced<Mmsi>,
    pub(crate) deselect: Debounced<()>,
}

impl InteractionState {
    pub fn new(settings: &ViewSettings) -> Self {
        Self {
            hover: None,
            selected: None,
            measure: MeasureMode::Off,
            hover_track: Debounced::new(settings.hover_debounce()),
            deselect: Debounced::new(settings.click_delay()),
        }
    }

    pub(crate) fn sync_waits(&mut self, settings: &ViewSettings) {
        self.hover_track.set_wait(settings.hover_debounce());
        self.deselect.set_wait(settings.click_delay());
    }

    pub fn hover(&self) -> Option<&Hit> {
        self.hover.as_ref()
    }

    pub fn hovered_vessel(&self) -> Option<Mmsi> {
        self.hover.as_ref().and_then(Hit::vessel)
    }

    pub fn selected(&self) -> Option<Mmsi> {
        self.selected
    }

    pub fn measure(&self) -> &MeasureMode {
        &self.measure
    }

    pub fn hover_track_wait(&self) -> Duration {
        self.hover_track.wait()
    }

    /// Earliest instant at which [`MapSession::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.hover_track.deadline(), self.deselect.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

const OUT_OF_RANGE: &str = "Ship out of range for measurement.";

impl MapSession {
    fn vessel_tooltip(&self, mmsi: Mmsi) -> Option<String> {
        let record = self.registry.get(mmsi)?;
        let metric = self.settings.metric;
        let mut text = record.display_name();
        if let Some(speed) = record.kinematics.speed {
            text.push_str(&format!(
                " at {} {}",
                metric.format_speed_kn(speed),
                metric.speed_unit()
            ));
        }
        if let Some(age) = record.last_signal {
            text.push_str(&format!("\nReceived {} ago", format_age(age)));
        }
        Some(text)
    }

    fn hit_tooltip(&self, hit: &Hit) -> Option<String> {
        match hit {
            Hit::Vessel(mmsi) => self.vessel_tooltip(*mmsi),
            Hit::RangeRing { tooltip, .. } | Hit::DistanceRing { tooltip, .. } => {
                Some(tooltip.clone())
            }
        }
    }

    fn hover_layer(hit: &Hit) -> Layer {
        if hit.is_ring() {
            Layer::Range
        } else {
            Layer::Markers
        }
    }

    /// Makes `hit` the hover target. A different previous target is torn
    /// down first.
    pub fn start_hover(&mut self, now: Instant, hit: Hit, at: ScreenPoint) {
        let Some(text) = self.hit_tooltip(&hit) else {
            self.stop_hover();
            return;
        };

        if self.interaction.hover.as_ref() == Some(&hit) {
            self.push_effect(UiEffect::ShowTooltip { text, at });
            return;
        }

        self.stop_hover();
        self.push_effect(UiEffect::ShowTooltip { text, at });
        self.push_effect(UiEffect::Invalidate(Self::hover_layer(&hit)));
        if let Some(mmsi) = hit.vessel() {
            if self.settings.show_track_on_hover {
                self.interaction.hover_track.schedule(now, mmsi);
            }
        }
        self.interaction.hover = Some(hit);
    }

    /// Ends the hover: hides the tooltip, cancels a pending hover track and
    /// hides a track the hover put up.
    pub fn stop_hover(&mut self) {
        self.interaction.hover_track.cancel();
        let Some(hit) = self.interaction.hover.take() else {
            return;
        };
        self.push_effect(UiEffect::HideTooltip);
        self.push_effect(UiEffect::Invalidate(Self::hover_layer(&hit)));

        if let Some(mmsi) = hit.vessel() {
            if self.tracks.owners().hover() == Some(mmsi) {
                self.tracks.owners_mut().release_hover();
                self.push_effect(UiEffect::Invalidate(Layer::Tracks));
            }
        }
    }

    pub fn pointer_move(&mut self, now: Instant, event: PointerEvent) {
        if let MeasureMode::Anchored { preview, .. } = &mut self.interaction.measure {
            *preview = event.position;
            self.push_effect(UiEffect::Invalidate(Layer::Measures));
        }
        match event.hit {
            Some(hit) => self.start_hover(now, hit, event.at),
            None => self.stop_hover(),
        }
    }

    /// Anchor for a click: the vessel under the pointer, else the point.
    fn click_anchor(&self, event: &PointerEvent) -> Option<Anchor> {
        event
            .hit
            .as_ref()
            .and_then(Hit::vessel)
            .filter(|mmsi| self.registry.contains(*mmsi))
            .map(Anchor::Vessel)
            .or_else(|| event.position.map(Anchor::Point))
    }

    pub fn click(&mut self, now: Instant, event: PointerEvent) {
        // second click of a double click
        if self.interaction.deselect.cancel().is_some() {
            return;
        }

        if event.modifier || self.interaction.measure.is_active() {
            if let Some(anchor) = self.click_anchor(&event) {
                if matches!(self.interaction.measure, MeasureMode::Anchored { .. }) {
                    self.end_measurement(anchor);
                } else {
                    self.start_measurement_at(anchor);
                }
            }
            return;
        }

        match event.hit.as_ref().and_then(Hit::vessel) {
            Some(mmsi) if self.registry.contains(mmsi) => {
                self.push_effect(UiEffect::CloseOverlays);
                self.select(Some(mmsi));
            }
            _ => self.interaction.deselect.schedule(now, ()),
        }
    }

    /// Changes the selection. Unknown ids deselect.
    pub fn select(&mut self, mmsi: Option<Mmsi>) {
        let mmsi = mmsi.filter(|id| self.registry.contains(*id));
        let previous = self.interaction.selected;

        if let Some(owned) = self.tracks.owners().selected() {
            if mmsi != Some(owned) {
                self.tracks.owners_mut().release_selection();
                // hovering the vessel keeps its track up
                if self.settings.show_track_on_hover
                    && self.interaction.hovered_vessel() == Some(owned)
                {
                    self.tracks.owners_mut().claim_hover(owned);
                }
                self.push_effect(UiEffect::Invalidate(Layer::Tracks));
            }
        }

        self.interaction.selected = mmsi;
        match mmsi {
            Some(id) => {
                self.push_effect(UiEffect::OpenCard(id));
                if self.settings.show_track_on_select && self.tracks.owners_mut().claim_selection(id)
                {
                    self.push_effect(UiEffect::FetchTracks);
                    self.push_effect(UiEffect::Invalidate(Layer::Tracks));
                }
            }
            None if previous.is_some() => self.push_effect(UiEffect::CloseCard),
            None => {}
        }
        if previous != mmsi {
            self.push_effect(UiEffect::Invalidate(Layer::Markers));
        }
    }

    /// Arms measuring; the next click places the start anchor.
    pub fn start_measurement(&mut self) {
        self.interaction.measure = MeasureMode::Armed;
        self.push_effect(UiEffect::Crosshair(true));
    }

    pub fn start_measurement_at(&mut self, start: Anchor) {
        self.interaction.measure = MeasureMode::Anchored {
            start,
            preview: None,
        };
        self.push_effect(UiEffect::Crosshair(true));
        self.push_effect(UiEffect::Invalidate(Layer::Measures));
    }

    /// Completes the measurement in progress. Returns its list index.
    pub fn end_measurement(&mut self, end: Anchor) -> Option<usize> {
        let MeasureMode::Anchored { start, .. } = self.interaction.measure else {
            return None;
        };
        self.interaction.measure = MeasureMode::Off;
        let index = self.measurements.push(Measurement::new(start, end));
        self.push_effect(UiEffect::Crosshair(false));
        self.push_effect(UiEffect::Invalidate(Layer::Measures));
        Some(index)
    }

    pub fn cancel_measurement(&mut self) {
        if self.interaction.measure.is_active() {
            self.interaction.measure = MeasureMode::Off;
            self.push_effect(UiEffect::Crosshair(false));
            self.push_effect(UiEffect::Invalidate(Layer::Measures));
        }
    }

    pub fn remove_measurement(&mut self, index: usize) -> bool {
        let removed = self.measurements.remove(index).is_some();
        if removed {
            self.push_effect(UiEffect::Invalidate(Layer::Measures));
        }
        removed
    }

    pub fn toggle_measurement_visibility(&mut self, index: usize) -> Option<bool> {
        let visible = self.measurements.toggle_visibility(index)?;
        self.push_effect(UiEffect::Invalidate(Layer::Measures));
        Some(visible)
    }

    /// Fires due debounced work, then clears references to vanished vessels.
    pub fn tick(&mut self, now: Instant) {
        if let Some(mmsi) = self.interaction.hover_track.poll(now) {
            let still_hovered = self.interaction.hovered_vessel() == Some(mmsi);
            if still_hovered
                && self.settings.show_track_on_hover
                && self.registry.contains(mmsi)
                && self.tracks.owners_mut().claim_hover(mmsi)
            {
                self.push_effect(UiEffect::FetchTracks);
                self.push_effect(UiEffect::Invalidate(Layer::Tracks));
            }
        }
        if self.interaction.deselect.poll(now).is_some() {
            self.select(None);
        }
        self.reconcile();
    }

    /// Drops hover, selection, track owners and measurements that refer to
    /// vessels no longer in the registry. Returns how many were dropped.
    pub fn reconcile(&mut self) -> usize {
        let mut dropped = 0;

        if let Some(mmsi) = self.interaction.hovered_vessel() {
            if !self.registry.contains(mmsi) {
                self.stop_hover();
                dropped += 1;
            }
        }
        if let Some(mmsi) = self.interaction.selected {
            if !self.registry.contains(mmsi) {
                self.select(None);
                dropped += 1;
            }
        }

        let registry = &self.registry;
        let owners = self.tracks.owners_mut().prune(|id| registry.contains(id));
        if owners > 0 {
            dropped += owners;
            self.push_effect(UiEffect::Invalidate(Layer::Tracks));
        }

        if let MeasureMode::Anchored {
            start: Anchor::Vessel(mmsi),
            ..
        } = self.interaction.measure
        {
            if !self.registry.contains(mmsi) {
                self.cancel_measurement();
                self.notify(Notice::error(OUT_OF_RANGE));
                dropped += 1;
            }
        }
        let measures = self.measurements.retain_resolvable(&self.registry);
        if measures > 0 {
            dropped += measures;
            self.notify(Notice::error(OUT_OF_RANGE));
            self.push_effect(UiEffect::Invalidate(Layer::Measures));
        }

        dropped
    }

    pub fn track_visibility(&self, mmsi: Mmsi) -> TrackVisibility {
        self.tracks.owners().visibility(mmsi)
    }

    pub fn track_is_shown(&self, mmsi: Mmsi) -> bool {
        self.track_visibility(mmsi).is_shown()
    }

    /// Per-vessel track controls are inert while all tracks are shown.
    pub fn track_controls_enabled(&self) -> bool {
        !self.tracks.owners().all()
    }

    /// Caption for the per-vessel track control.
    pub fn track_option_label(&self, mmsi: Mmsi) -> &'static str {
        match self.track_visibility(mmsi) {
            TrackVisibility::Explicit => "Hide Track",
            _ => "Show Track",
        }
    }

    pub fn show_track(&mut self, mmsi: Mmsi) {
        if !self.track_controls_enabled() || self.track_visibility(mmsi) == TrackVisibility::Explicit
        {
            return;
        }
        self.tracks.owners_mut().show(mmsi);
        self.push_effect(UiEffect::FetchTracks);
        self.push_effect(UiEffect::Invalidate(Layer::Tracks));
    }

    pub fn hide_track(&mut self, mmsi: Mmsi) {
        if !self.track_controls_enabled() || !self.track_is_shown(mmsi) {
            return;
        }
        self.tracks.owners_mut().hide(mmsi);
        self.push_effect(UiEffect::Invalidate(Layer::Tracks));
    }

    /// With track-on-select, toggling the selected vessel pins or unpins its
    /// track instead of hiding it.
    pub fn toggle_track(&mut self, mmsi: Mmsi) {
        if !self.track_controls_enabled() {
            return;
        }
        if self.settings.show_track_on_select && self.interaction.selected == Some(mmsi) {
            match self.track_visibility(mmsi) {
                TrackVisibility::Selected | TrackVisibility::Explicit => {
                    self.tracks.owners_mut().toggle_pin(mmsi);
                    self.push_effect(UiEffect::Invalidate(Layer::Tracks));
                }
                _ => {
                    self.tracks.owners_mut().claim_selection(mmsi);
                    self.push_effect(UiEffect::FetchTracks);
                    self.push_effect(UiEffect::Invalidate(Layer::Tracks));
                }
            }
            return;
        }
        match self.track_visibility(mmsi) {
            TrackVisibility::None => self.show_track(mmsi),
            TrackVisibility::Hover => {
                // pin the track the hover put up
                self.tracks.owners_mut().release_hover();
                self.show_track(mmsi);
            }
            _ => self.hide_track(mmsi),
        }
    }

    pub fn show_all_tracks(&mut self) {
        self.tracks.owners_mut().show_all();
        self.push_effect(UiEffect::FetchTracks);
        self.push_effect(UiEffect::Invalidate(Layer::Tracks));
    }

    /// Clears every track except the one following the selection.
    pub fn delete_all_tracks(&mut self) {
        let keep = self
            .interaction
            .selected
            .filter(|_| self.settings.show_track_on_select);
        self.tracks.owners_mut().clear(keep);
        self.tracks.retain_cache(|id| Some(id) == keep);
        self.push_effect(UiEffect::Invalidate(Layer::Tracks));
    }
}

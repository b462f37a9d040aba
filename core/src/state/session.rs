use std::sync::Arc;
use std::time::Instant;

use crate::config::ViewSettings;
use crate::geo::range::{RangeProfile, RangeTimeframe};
use crate::interaction::machine::{InteractionState, Layer, UiEffect};
use crate::prelude::{LatLon, SyncResult};
use crate::state::measure::MeasurementList;
use crate::state::registry::VesselRegistry;
use crate::state::tracks::{TrackManager, TrackRequest};
use crate::telemetry::log::LogManager;
use crate::wire::history::HistoryResponse;
use crate::wire::paths::PathResponse;
use crate::wire::snapshot::{
    DecodeReport, Decoded, InclusionFilter, SnapshotDecoder, SnapshotResponse, StationRecord,
};

/// Message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// All mutable map state: the registry, the track cache, the measurement
/// list and the interaction state, plus the settings they are read with.
///
/// Feed results are applied here after their fetch has resolved, so a fetch
/// never observes a half-updated session.
pub struct MapSession {
    pub(crate) registry: VesselRegistry,
    pub(crate) station: Option<StationRecord>,
    pub(crate) tracks: TrackManager,
    pub(crate) measurements: MeasurementList,
    pub(crate) interaction: InteractionState,
    pub(crate) settings: ViewSettings,
    pub(crate) range: Option<RangeProfile>,
    range_fetched_at: Option<Instant>,
    range_forced: bool,
    effects: Vec<UiEffect>,
    decoder: SnapshotDecoder,
    filter: Option<Arc<InclusionFilter>>,
    last_report: DecodeReport,
    logger: LogManager,
}

impl Default for MapSession {
    fn default() -> Self {
        Self::new(ViewSettings::default())
    }
}

impl MapSession {
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            registry: VesselRegistry::new(),
            station: None,
            tracks: TrackManager::new(),
            measurements: MeasurementList::default(),
            interaction: InteractionState::new(&settings),
            settings,
            range: None,
            range_fetched_at: None,
            range_forced: false,
            effects: Vec::new(),
            decoder: SnapshotDecoder::new(),
            filter: None,
            last_report: DecodeReport::default(),
            logger: LogManager::new("session"),
        }
    }

    pub fn registry(&self) -> &VesselRegistry {
        &self.registry
    }

    pub fn station(&self) -> Option<&StationRecord> {
        self.station.as_ref()
    }

    pub fn station_position(&self) -> Option<LatLon> {
        self.station.and_then(|station| station.position())
    }

    pub fn tracks(&self) -> &TrackManager {
        &self.tracks
    }

    pub fn measurements(&self) -> &MeasurementList {
        &self.measurements
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn range(&self) -> Option<&RangeProfile> {
        self.range.as_ref()
    }

    pub fn last_report(&self) -> DecodeReport {
        self.last_report
    }

    /// Restricts which decoded vessels enter the registry from the next
    /// snapshot on.
    pub fn set_filter(&mut self, filter: Option<Arc<InclusionFilter>>) {
        self.filter = filter;
    }

    pub fn filter(&self) -> Option<Arc<InclusionFilter>> {
        self.filter.clone()
    }

    pub fn decoder(&self) -> &SnapshotDecoder {
        &self.decoder
    }

    pub(crate) fn push_effect(&mut self, effect: UiEffect) {
        self.effects.push(effect);
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        if notice.is_error {
            self.logger.warn(&notice.message);
        } else {
            self.logger.detail(&notice.message);
        }
        self.effects.push(UiEffect::Notify(notice));
    }

    /// Effects raised since the last call, oldest first.
    pub fn drain_effects(&mut self) -> Vec<UiEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Replaces the registry and the station with the content of a snapshot.
    pub fn apply_snapshot(&mut self, response: &SnapshotResponse) -> DecodeReport {
        let decoded = self.decoder.decode(response, self.filter.as_deref());
        self.apply_decoded(decoded)
    }

    /// Same as [`MapSession::apply_snapshot`] for a snapshot decoded
    /// elsewhere with [`MapSession::decoder`] and [`MapSession::filter`].
    pub fn apply_decoded(&mut self, decoded: Decoded) -> DecodeReport {
        self.registry.replace(decoded.records);
        if self.station.is_some() && decoded.station.is_none() {
            self.logger.detail("snapshot carries no station, clearing it");
        }
        self.station = decoded.station;
        self.last_report = decoded.report;
        decoded.report
    }

    /// Path request for the tracks currently wanted, after dropping owners
    /// of vanished vessels.
    pub fn track_request(&mut self) -> Option<TrackRequest> {
        self.tracks.plan(&self.registry)
    }

    pub fn apply_paths(&mut self, result: SyncResult<PathResponse>) -> SyncResult<usize> {
        let outcome = self.tracks.apply(result, &mut self.registry);
        self.push_effect(UiEffect::Invalidate(Layer::Tracks));
        outcome
    }

    /// Installs paths fetched for an older set of wanted tracks: the
    /// response's tracks are added, every other cached track is kept, and a
    /// fresh track fetch is requested.
    pub fn merge_paths(&mut self, result: SyncResult<PathResponse>) -> SyncResult<usize> {
        let outcome = self.tracks.merge(result, &mut self.registry);
        self.push_effect(UiEffect::Invalidate(Layer::Tracks));
        self.push_effect(UiEffect::FetchTracks);
        outcome
    }

    /// Installs fresh range statistics. A failure turns the range overlay off.
    pub fn apply_history(
        &mut self,
        result: SyncResult<HistoryResponse>,
        now: Instant,
    ) -> SyncResult<()> {
        self.range_forced = false;
        match result {
            Ok(history) => {
                self.range = RangeProfile::from_history(&history, self.settings.range_timeframe);
                self.range_fetched_at = Some(now);
                if self.range.is_none() {
                    self.logger.detail("history carries no sector statistics");
                }
                self.push_effect(UiEffect::Invalidate(Layer::Range));
                Ok(())
            }
            Err(err) => {
                self.range = None;
                self.range_fetched_at = None;
                self.settings.show_range = false;
                self.notify(Notice::error(format!(
                    "Could not retrieve station range: {}",
                    err
                )));
                self.push_effect(UiEffect::Invalidate(Layer::Range));
                Err(err)
            }
        }
    }

    /// Whether the range statistics should be fetched in this cycle.
    pub fn range_due(&self, now: Instant) -> bool {
        if !self.settings.show_range || self.station_position().is_none() {
            return false;
        }
        self.range_forced
            || self.range_fetched_at.map_or(true, |fetched| {
                now.saturating_duration_since(fetched) >= self.settings.range_refresh()
            })
    }

    pub fn set_range_timeframe(&mut self, timeframe: RangeTimeframe) {
        if self.settings.range_timeframe != timeframe {
            self.settings.range_timeframe = timeframe;
            self.range_forced = true;
        }
    }

    /// Flips the range overlay. Without a station fix it stays off.
    pub fn toggle_range(&mut self) -> bool {
        if self.settings.show_range {
            self.settings.show_range = false;
        } else if self.station_position().is_none() {
            self.notify(Notice::error(
                "Station location is not available, range cannot be shown.",
            ));
        } else {
            self.settings.show_range = true;
            self.range_forced = true;
        }
        self.push_effect(UiEffect::Invalidate(Layer::Range));
        self.settings.show_range
    }

    /// Edits the settings in place and brings dependent state in line.
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut ViewSettings)) {
        let before = self.settings.clone();
        edit(&mut self.settings);

        self.interaction.sync_waits(&self.settings);
        if before.range_timeframe != self.settings.range_timeframe {
            self.range_forced = true;
        }
        if self.settings.show_range && !before.show_range {
            if self.station_position().is_none() {
                self.settings.show_range = false;
                self.notify(Notice::error(
                    "Station location is not available, range cannot be shown.",
                ));
            } else {
                self.range_forced = true;
            }
        }
        if before.show_track_on_hover && !self.settings.show_track_on_hover {
            self.interaction.hover_track.cancel();
            self.tracks.owners_mut().release_hover();
        }
        if before.show_track_on_select && !self.settings.show_track_on_select {
            self.tracks.owners_mut().release_selection();
        }
        if before != self.settings {
            for layer in Layer::ALL {
                self.push_effect(UiEffect::Invalidate(layer));
            }
        }
    }
}

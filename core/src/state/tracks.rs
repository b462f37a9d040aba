use std::collections::{BTreeSet, HashMap};

use crate::prelude::{Feed, LatLon, Mmsi, SyncResult};
use crate::state::registry::VesselRegistry;
use crate::telemetry::log::LogManager;
use crate::wire::paths::PathResponse;

/// Why a vessel's track is on the map. Higher variants win when several
/// owners apply to the same vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrackVisibility {
    None,
    Hover,
    Selected,
    Explicit,
    All,
}

impl TrackVisibility {
    pub fn is_shown(self) -> bool {
        self != TrackVisibility::None
    }

    /// Temporary owners release the track on their own.
    pub fn is_temporary(self) -> bool {
        matches!(self, TrackVisibility::Hover | TrackVisibility::Selected)
    }
}

/// One batched path request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackRequest {
    All,
    Vessels(BTreeSet<Mmsi>),
}

impl TrackRequest {
    /// Comma separated ids, empty for [`TrackRequest::All`].
    pub fn query(&self) -> String {
        match self {
            TrackRequest::All => String::new(),
            TrackRequest::Vessels(ids) => ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Who asked for which track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackOwners {
    explicit: BTreeSet<Mmsi>,
    hover: Option<Mmsi>,
    selected: Option<Mmsi>,
    all: bool,
}

impl TrackOwners {
    pub fn visibility(&self, mmsi: Mmsi) -> TrackVisibility {
        if self.all {
            TrackVisibility::All
        } else if self.explicit.contains(&mmsi) {
            TrackVisibility::Explicit
        } else if self.selected == Some(mmsi) {
            TrackVisibility::Selected
        } else if self.hover == Some(mmsi) {
            TrackVisibility::Hover
        } else {
            TrackVisibility::None
        }
    }

    pub fn is_shown(&self, mmsi: Mmsi) -> bool {
        self.visibility(mmsi).is_shown()
    }

    pub fn all(&self) -> bool {
        self.all
    }

    pub fn hover(&self) -> Option<Mmsi> {
        self.hover
    }

    pub fn selected(&self) -> Option<Mmsi> {
        self.selected
    }

    pub fn explicit(&self) -> impl Iterator<Item = Mmsi> + '_ {
        self.explicit.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        !self.all && self.explicit.is_empty() && self.hover.is_none() && self.selected.is_none()
    }

    /// Ids to fetch, or `None` when no track is wanted.
    pub fn request(&self) -> Option<TrackRequest> {
        self.request_within(|_| true)
    }

    /// Like [`TrackOwners::request`], ignoring ids rejected by `known`.
    pub fn request_within(&self, known: impl Fn(Mmsi) -> bool) -> Option<TrackRequest> {
        if self.all {
            return Some(TrackRequest::All);
        }
        let ids: BTreeSet<Mmsi> = self
            .explicit
            .iter()
            .copied()
            .chain(self.hover)
            .chain(self.selected)
            .filter(|id| known(*id))
            .collect();
        (!ids.is_empty()).then_some(TrackRequest::Vessels(ids))
    }

    pub fn show(&mut self, mmsi: Mmsi) {
        self.explicit.insert(mmsi);
    }

    /// Hides a track whoever owns it.
    pub fn hide(&mut self, mmsi: Mmsi) {
        self.explicit.remove(&mmsi);
        if self.hover == Some(mmsi) {
            self.hover = None;
        }
        if self.selected == Some(mmsi) {
            self.selected = None;
        }
    }

    /// Takes the hover slot when nobody else shows the track.
    pub fn claim_hover(&mut self, mmsi: Mmsi) -> bool {
        if self.is_shown(mmsi) {
            return false;
        }
        self.hover = Some(mmsi);
        true
    }

    pub fn release_hover(&mut self) -> Option<Mmsi> {
        self.hover.take()
    }

    /// Takes the selection slot. A hover-owned track is handed over.
    pub fn claim_selection(&mut self, mmsi: Mmsi) -> bool {
        if self.hover == Some(mmsi) {
            self.hover = None;
            self.selected = Some(mmsi);
            return true;
        }
        if self.is_shown(mmsi) {
            return false;
        }
        self.selected = Some(mmsi);
        true
    }

    pub fn release_selection(&mut self) -> Option<Mmsi> {
        self.selected.take()
    }

    /// Flips a selection-owned track to explicit and back.
    pub fn toggle_pin(&mut self, mmsi: Mmsi) {
        if self.selected == Some(mmsi) {
            self.selected = None;
            self.explicit.insert(mmsi);
        } else if self.explicit.remove(&mmsi) {
            self.selected = Some(mmsi);
        }
    }

    pub fn show_all(&mut self) {
        self.all = true;
        self.hover = None;
        self.selected = None;
    }

    /// Clears every owner, optionally keeping the selection-driven track.
    pub fn clear(&mut self, keep_selected: Option<Mmsi>) {
        self.all = false;
        self.explicit.clear();
        self.hover = None;
        self.selected = keep_selected;
    }

    /// Forgets ids `known` rejects. Returns how many owners were dropped.
    pub fn prune(&mut self, known: impl Fn(Mmsi) -> bool) -> usize {
        let before = self.explicit.len();
        self.explicit.retain(|id| known(*id));
        let mut dropped = before - self.explicit.len();
        if self.hover.map_or(false, |id| !known(id)) {
            self.hover = None;
            dropped += 1;
        }
        if self.selected.map_or(false, |id| !known(id)) {
            self.selected = None;
            dropped += 1;
        }
        dropped
    }
}

/// Owns the track cache and the bookkeeping of which tracks are wanted.
#[derive(Debug, Clone)]
pub struct TrackManager {
    owners: TrackOwners,
    cache: HashMap<Mmsi, Vec<LatLon>>,
    logger: LogManager,
}

impl Default for TrackManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackManager {
    pub fn new() -> Self {
        Self {
            owners: TrackOwners::default(),
            cache: HashMap::new(),
            logger: LogManager::new("tracks"),
        }
    }

    pub fn owners(&self) -> &TrackOwners {
        &self.owners
    }

    pub fn owners_mut(&mut self) -> &mut TrackOwners {
        &mut self.owners
    }

    /// Drops owners of vanished vessels and returns the request to send.
    pub fn plan(&mut self, registry: &VesselRegistry) -> Option<TrackRequest> {
        let dropped = self.owners.prune(|id| registry.contains(id));
        if dropped > 0 {
            self.logger
                .detail(&format!("released {} track(s) of vanished vessels", dropped));
        }
        self.owners.request()
    }

    /// Installs the outcome of a path request.
    ///
    /// Success replaces the cache and moves each tracked vessel to the head
    /// of its track; failure empties the cache.
    pub fn apply(
        &mut self,
        result: SyncResult<PathResponse>,
        registry: &mut VesselRegistry,
    ) -> SyncResult<usize> {
        match result {
            Ok(response) => {
                self.cache = response.into_tracks();
                let mut corrected = 0;
                for (mmsi, track) in &self.cache {
                    if let Some(head) = track.first() {
                        if registry.correct_position(*mmsi, *head) {
                            corrected += 1;
                        }
                    }
                }
                self.logger.detail(&format!(
                    "{} track(s) cached, {} position(s) corrected",
                    self.cache.len(),
                    corrected
                ));
                Ok(self.cache.len())
            }
            Err(err) => {
                self.cache.clear();
                self.logger.warn(&format!("track fetch failed: {}", err));
                Err(err)
            }
        }
    }

    /// Adds the tracks of a path response without dropping other cached
    /// tracks. A failure leaves the cache as it was.
    pub fn merge(
        &mut self,
        result: SyncResult<PathResponse>,
        registry: &mut VesselRegistry,
    ) -> SyncResult<usize> {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.logger
                    .warn(&format!("track fetch failed, keeping cache: {}", err));
                return Err(err);
            }
        };
        let tracks = response.into_tracks();
        let merged = tracks.len();
        for (mmsi, track) in tracks {
            if let Some(head) = track.first() {
                registry.correct_position(mmsi, *head);
            }
            self.cache.insert(mmsi, track);
        }
        self.logger.detail(&format!(
            "{} track(s) merged, {} cached",
            merged,
            self.cache.len()
        ));
        Ok(merged)
    }

    /// Fetches and applies the tracks currently wanted.
    pub async fn refresh<F: Feed>(
        &mut self,
        feed: &F,
        registry: &mut VesselRegistry,
    ) -> SyncResult<usize> {
        match self.plan(registry) {
            Some(request) => {
                let result = feed.fetch_paths(&request).await;
                self.apply(result, registry)
            }
            None => {
                self.cache.clear();
                Ok(0)
            }
        }
    }

    pub fn track(&self, mmsi: Mmsi) -> Option<&[LatLon]> {
        self.cache.get(&mmsi).map(Vec::as_slice)
    }

    /// Cached tracks whose vessel is currently meant to show one.
    pub fn visible(&self) -> impl Iterator<Item = (Mmsi, &[LatLon])> + '_ {
        self.cache
            .iter()
            .filter(|(mmsi, _)| self.owners.is_shown(**mmsi))
            .map(|(mmsi, track)| (*mmsi, track.as_slice()))
    }

    pub fn retain_cache(&mut self, keep: impl Fn(Mmsi) -> bool) {
        self.cache.retain(|mmsi, _| keep(*mmsi));
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::poll::single_flight::{FlightToken, SingleFlight};
use crate::prelude::{Feed, Mmsi, SyncError, SyncResult};
use crate::render::scene::{RenderScene, ViewState};
use crate::state::session::MapSession;
use crate::state::tracks::TrackOwners;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::CycleMetrics;
use crate::wire::history::HistoryResponse;
use crate::wire::paths::PathResponse;
use crate::wire::snapshot::{DecodeReport, Decoded, InclusionFilter, SnapshotDecoder};

/// Why a cycle did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Hidden,
}

/// What a cycle will fetch, captured when it starts.
#[derive(Clone)]
pub struct FetchPlan {
    pub owners: TrackOwners,
    pub history: bool,
    pub decoder: SnapshotDecoder,
    pub filter: Option<Arc<InclusionFilter>>,
}

/// Results of a cycle's fetches, decoded but not yet applied.
#[derive(Debug, Clone)]
pub struct CycleFetch {
    pub snapshot: SyncResult<Decoded>,
    pub paths: Option<SyncResult<PathResponse>>,
    pub history: Option<SyncResult<HistoryResponse>>,
    /// Track owners the path request was built from.
    owners: TrackOwners,
    token: FlightToken,
}

/// Runs the fetches of one cycle: the snapshot, then the paths of wanted
/// vessels that passed the inclusion filter, then the range statistics when
/// due.
pub async fn fetch_cycle<F: Feed>(feed: &F, plan: FetchPlan, token: FlightToken) -> CycleFetch {
    let snapshot = feed
        .fetch_snapshot()
        .await
        .map(|response| plan.decoder.decode(&response, plan.filter.as_deref()));
    let (paths, history) = match &snapshot {
        Ok(decoded) => {
            let ids: HashSet<Mmsi> = decoded.records.iter().map(|record| record.mmsi).collect();
            let paths = match plan.owners.request_within(|id| ids.contains(&id)) {
                Some(request) => Some(feed.fetch_paths(&request).await),
                None => None,
            };
            let history = if plan.history {
                Some(feed.fetch_history().await)
            } else {
                None
            };
            (paths, history)
        }
        Err(_) => (None, None),
    };
    CycleFetch {
        snapshot,
        paths,
        history,
        owners: plan.owners,
        token,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub decode: DecodeReport,
    pub tracks: Option<SyncResult<usize>>,
    pub range: Option<SyncResult<()>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    /// The snapshot could not be fetched; the session is unchanged.
    Failed(SyncError),
    Completed {
        report: CycleReport,
        scene: RenderScene,
    },
}

/// Single-flight, visibility-aware driver of the refresh cycle.
pub struct PollLoop {
    flight: SingleFlight,
    metrics: CycleMetrics,
    logger: LogManager,
}

impl Default for PollLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl PollLoop {
    pub fn new() -> Self {
        Self {
            flight: SingleFlight::new(),
            metrics: CycleMetrics::new(),
            logger: LogManager::new("poll"),
        }
    }

    pub fn metrics(&self) -> &CycleMetrics {
        &self.metrics
    }

    pub fn in_flight(&self) -> bool {
        self.flight.in_flight()
    }

    /// Claims the cycle slot. Skips when the view is hidden or a previous
    /// cycle has not finished.
    pub fn begin(
        &self,
        session: &MapSession,
        visible: bool,
        now: Instant,
    ) -> Result<(FlightToken, FetchPlan), SkipReason> {
        if !visible {
            self.metrics.record_skipped();
            self.logger.detail("view hidden, skipping cycle");
            return Err(SkipReason::Hidden);
        }
        let Some(token) = self.flight.try_begin() else {
            self.metrics.record_skipped();
            self.logger.detail("previous cycle still in flight, skipping");
            return Err(SkipReason::InFlight);
        };
        let plan = FetchPlan {
            owners: session.tracks().owners().clone(),
            history: session.range_due(now),
            decoder: session.decoder().clone(),
            filter: session.filter(),
        };
        Ok((token, plan))
    }

    /// Applies fetched results to the session and renders. Frees the slot.
    pub fn complete(
        &self,
        session: &mut MapSession,
        fetch: CycleFetch,
        view: &ViewState,
        now: Instant,
    ) -> CycleOutcome {
        let CycleFetch {
            snapshot,
            paths,
            history,
            owners,
            token,
        } = fetch;

        let decoded = match snapshot {
            Ok(decoded) => decoded,
            Err(err) => {
                self.metrics.record_failed();
                self.logger.warn(&format!("snapshot fetch failed: {}", err));
                drop(token);
                return CycleOutcome::Failed(err);
            }
        };

        let decode = session.apply_decoded(decoded);
        let mut healthy = true;

        // tracks wanted since the cycle started may already be cached
        let stale = owners != *session.tracks().owners();
        let tracks = match paths {
            Some(result) if stale => Some(session.merge_paths(result)),
            Some(result) => Some(session.apply_paths(result)),
            None if stale => {
                self.logger
                    .detail("wanted tracks changed during the cycle, keeping cache");
                None
            }
            None => {
                session.tracks.retain_cache(|_| false);
                None
            }
        };
        if matches!(tracks, Some(Err(_))) {
            healthy = false;
        }
        let range = history.map(|result| session.apply_history(result, now));
        if matches!(range, Some(Err(_))) {
            healthy = false;
        }

        let scene = session.render(view);
        self.metrics.record_exchange(healthy);
        self.metrics.record_completed();
        self.logger.detail(&format!(
            "cycle done: {} vessels, {} excluded, {} rejected",
            decode.accepted, decode.excluded, decode.rejected
        ));
        drop(token);

        CycleOutcome::Completed {
            report: CycleReport {
                decode,
                tracks,
                range,
            },
            scene,
        }
    }

    /// One full cycle on the current task.
    pub async fn run_cycle<F: Feed>(
        &self,
        session: &mut MapSession,
        feed: &F,
        visible: bool,
        view: &ViewState,
        now: Instant,
    ) -> CycleOutcome {
        let (token, plan) = match self.begin(session, visible, now) {
            Ok(started) => started,
            Err(reason) => return CycleOutcome::Skipped(reason),
        };
        let fetch = fetch_cycle(feed, plan, token).await;
        self.complete(session, fetch, view, now)
    }
}

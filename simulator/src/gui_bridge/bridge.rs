use crate::gui_bridge::model::FeedSummary;
use crate::workflow::runner::FeedModel;
use anyhow::Context;
use std::collections::BTreeSet;
use std::future::Future;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};
use vesselcore::state::TrackRequest;
use vesselcore::wire::SnapshotResponse;
use vesselcore::Mmsi;
use warp::Filter;

pub type SharedModel = Arc<RwLock<FeedModel>>;

pub fn default_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8100))
}

fn read_model(state: &SharedModel) -> RwLockReadGuard<'_, FeedModel> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_model(state: &SharedModel) -> RwLockWriteGuard<'_, FeedModel> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Ids from a `path.json?1,2,3` query. Unparsable entries are skipped.
fn parse_ids(query: &str) -> TrackRequest {
    let ids: BTreeSet<Mmsi> = query
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();
    TrackRequest::Vessels(ids)
}

async fn run_ticker(state: SharedModel, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    // the first tick completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        write_model(&state).tick(tick);
    }
}

/// HTTP face of the synthetic feed: the endpoints the map client polls.
#[derive(Clone)]
pub struct FeedBridge {
    state: SharedModel,
}

impl FeedBridge {
    pub fn new(model: FeedModel) -> Self {
        Self {
            state: Arc::new(RwLock::new(model)),
        }
    }

    pub fn advance(&self, dt: Duration) {
        write_model(&self.state).tick(dt);
    }

    pub fn snapshot(&self) -> SnapshotResponse {
        read_model(&self.state).snapshot()
    }

    pub fn summary(&self) -> FeedSummary {
        FeedSummary::of(&read_model(&self.state))
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());

        let ships_route = warp::path!("api" / "ships_array.json")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| warp::reply::json(&read_model(&state).snapshot()));

        let path_route = warp::path!("api" / "path.json")
            .and(warp::get())
            .and(
                warp::query::raw()
                    .or(warp::any().map(String::new))
                    .unify(),
            )
            .and(state_filter.clone())
            .map(|query: String, state: SharedModel| {
                let request = parse_ids(&query);
                warp::reply::json(&read_model(&state).paths(&request))
            });

        let all_paths_route = warp::path!("api" / "allpath.json")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| {
                warp::reply::json(&read_model(&state).paths(&TrackRequest::All))
            });

        let history_route = warp::path!("api" / "history_full.json")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| warp::reply::json(&read_model(&state).history()));

        let status_route = warp::path!("api" / "status.json")
            .and(warp::get())
            .and(state_filter)
            .map(|state: SharedModel| warp::reply::json(&FeedSummary::of(&read_model(&state))));

        ships_route
            .or(path_route)
            .or(all_paths_route)
            .or(history_route)
            .or(status_route)
            .with(warp::log("simulator::http"))
    }

    /// Serves the feed and advances the fleet every `tick` until `shutdown`
    /// resolves.
    pub async fn serve(
        &self,
        address: SocketAddr,
        tick: Duration,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(address, shutdown)
            .with_context(|| format!("binding feed server to {}", address))?;
        log::info!("serving vessel feed on http://{}", bound);

        let ticker = tokio::spawn(run_ticker(self.state.clone(), tick));
        server.await;
        ticker.abort();
        log::info!("feed server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::ScenarioConfig;
    use vesselcore::wire::{HistoryResponse, PathResponse};

    fn bridge(vessels: usize) -> FeedBridge {
        let config = ScenarioConfig {
            dropout: 0.0,
            ..ScenarioConfig::from_args(vessels, 21)
        };
        FeedBridge::new(FeedModel::new(config))
    }

    #[test]
    fn ids_query_skips_garbage() {
        assert_eq!(
            parse_ids("244660000, 1,abc,"),
            TrackRequest::Vessels(BTreeSet::from([1, 244_660_000]))
        );
        assert_eq!(parse_ids(""), TrackRequest::Vessels(BTreeSet::new()));
    }

    #[test]
    fn advance_moves_the_clock() {
        let bridge = bridge(2);
        bridge.advance(Duration::from_secs(2));
        assert_eq!(bridge.summary().clock_s, 2);
    }

    #[tokio::test]
    async fn ships_route_serves_the_snapshot() {
        let bridge = bridge(3);
        let routes = bridge.routes();
        let res = warp::test::request()
            .method("GET")
            .path("/api/ships_array.json")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), 200);
        let body: SnapshotResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.values.len(), 3);
        assert_eq!(body.count, Some(3));
    }

    #[tokio::test]
    async fn path_route_filters_by_query() {
        let bridge = bridge(3);
        bridge.advance(Duration::from_secs(1));
        let first = bridge.snapshot().values[0][0].as_u64().unwrap();
        let routes = bridge.routes();

        let res = warp::test::request()
            .path(&format!("/api/path.json?{},42", first))
            .reply(&routes)
            .await;
        let body: PathResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.len(), 1);

        let res = warp::test::request()
            .path("/api/path.json")
            .reply(&routes)
            .await;
        let body: PathResponse = serde_json::from_slice(res.body()).unwrap();
        assert!(body.is_empty());

        let res = warp::test::request()
            .path("/api/allpath.json")
            .reply(&routes)
            .await;
        let body: PathResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.len(), 3);
    }

    #[tokio::test]
    async fn history_and_unknown_routes() {
        let bridge = bridge(4);
        let routes = bridge.routes();
        let res = warp::test::request()
            .path("/api/history_full.json")
            .reply(&routes)
            .await;
        let body: HistoryResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.minute.stat.len(), 1);

        let res = warp::test::request()
            .path("/api/nothing.json")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), 404);
    }
}

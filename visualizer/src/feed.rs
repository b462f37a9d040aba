use serde::de::DeserializeOwned;
use std::future::Future;
use vesselcore::state::TrackRequest;
use vesselcore::wire::{HistoryResponse, PathResponse, SnapshotResponse};
use vesselcore::{Feed, SyncError, SyncResult};

/// [`Feed`] over the receiver's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    base: String,
}

impl HttpFeed {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn paths_url(&self, request: &TrackRequest) -> String {
        match request {
            TrackRequest::All => self.url("api/allpath.json"),
            TrackRequest::Vessels(_) => self.url(&format!("api/path.json?{}", request.query())),
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> SyncResult<T> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Feed for HttpFeed {
    fn fetch_snapshot(&self) -> impl Future<Output = SyncResult<SnapshotResponse>> + Send {
        self.get(self.url("api/ships_array.json"))
    }

    fn fetch_paths(
        &self,
        request: &TrackRequest,
    ) -> impl Future<Output = SyncResult<PathResponse>> + Send {
        self.get(self.paths_url(request))
    }

    fn fetch_history(&self) -> impl Future<Output = SyncResult<HistoryResponse>> + Send {
        self.get(self.url("api/history_full.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn urls_follow_the_endpoint_layout() {
        let feed = HttpFeed::new("http://127.0.0.1:8100/");
        assert_eq!(feed.base(), "http://127.0.0.1:8100");
        assert_eq!(
            feed.url("api/ships_array.json"),
            "http://127.0.0.1:8100/api/ships_array.json"
        );
        assert_eq!(
            feed.paths_url(&TrackRequest::Vessels(BTreeSet::from([5, 3]))),
            "http://127.0.0.1:8100/api/path.json?3,5"
        );
        assert_eq!(
            feed.paths_url(&TrackRequest::All),
            "http://127.0.0.1:8100/api/allpath.json"
        );
    }
}

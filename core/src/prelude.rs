use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::state::TrackRequest;
use crate::wire::{HistoryResponse, PathResponse, SnapshotResponse};

/// Numeric vessel or station identifier, used as the registry key.
pub type Mmsi = u32;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True for a usable fix. Out-of-range sentinels and the exact (0, 0)
    /// placeholder are not fixes.
    pub fn is_valid_fix(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat < 90.0
            && self.lon < 180.0
            && !(self.lat == 0.0 && self.lon == 0.0)
    }
}

/// Failure on any of the feed endpoints.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Parse(String),
    #[error("schema mismatch: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Parse(err.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Source of vessel snapshots, historical paths and range statistics.
///
/// Implementations own the transport; the core only awaits the futures and
/// mutates its state once they resolve.
pub trait Feed {
    fn fetch_snapshot(&self) -> impl Future<Output = SyncResult<SnapshotResponse>> + Send;

    fn fetch_paths(
        &self,
        request: &TrackRequest,
    ) -> impl Future<Output = SyncResult<PathResponse>> + Send;

    fn fetch_history(&self) -> impl Future<Output = SyncResult<HistoryResponse>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_positions_are_not_fixes() {
        assert!(LatLon::new(51.9, 4.5).is_valid_fix());
        assert!(!LatLon::new(91.0, 4.5).is_valid_fix());
        assert!(!LatLon::new(51.9, 181.0).is_valid_fix());
        assert!(!LatLon::new(0.0, 0.0).is_valid_fix());
        assert!(LatLon::new(0.0, 4.5).is_valid_fix());
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(SyncError::from(err), SyncError::Parse(_)));
    }
}

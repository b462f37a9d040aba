//! Vessel-state synchronization and geospatial interaction core for the
//! vessel map.
//!
//! The crate decodes the receiver's tabular vessel snapshot into typed
//! records, keeps the registry, track cache and measurement list in step
//! with each poll, and turns that state into a renderer-neutral scene the
//! desktop client draws.

pub mod config;
pub mod geo;
pub mod interaction;
pub mod poll;
pub mod prelude;
pub mod render;
pub mod state;
pub mod telemetry;
pub mod wire;

pub use config::{LabelMode, ViewSettings};
pub use prelude::{Feed, LatLon, Mmsi, SyncError, SyncResult};
pub use state::MapSession;

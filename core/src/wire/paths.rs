use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::prelude::{LatLon, Mmsi};

/// Payload of the path endpoints: mmsi (as a JSON key) to `[lat, lon]`
/// points, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathResponse(pub BTreeMap<String, Vec<[f64; 2]>>);

impl PathResponse {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys that are not mmsi numbers and points without a fix are dropped.
    pub fn into_tracks(self) -> HashMap<Mmsi, Vec<LatLon>> {
        self.0
            .into_iter()
            .filter_map(|(key, points)| {
                let mmsi = key.trim().parse::<Mmsi>().ok()?;
                let track = points
                    .into_iter()
                    .map(|[lat, lon]| LatLon::new(lat, lon))
                    .filter(LatLon::is_valid_fix)
                    .collect();
                Some((mmsi, track))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keyed_point_lists() {
        let body = r#"{"244660000": [[52.1, 4.2], [52.0, 4.1], [91, 181]], "bogus": [[1, 1]]}"#;
        let response: PathResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.len(), 2);
        let tracks = response.into_tracks();
        assert_eq!(tracks.len(), 1);
        let track = &tracks[&244_660_000];
        assert_eq!(track.len(), 2);
        assert_eq!(track[0], LatLon::new(52.1, 4.2));
    }
}

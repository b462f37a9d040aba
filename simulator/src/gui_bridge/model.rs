use crate::workflow::runner::FeedModel;
use serde::{Deserialize, Serialize};

/// Short account of the feed state, served next to the data endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FeedSummary {
    pub clock_s: u64,
    pub vessels: usize,
    pub listed: usize,
    pub silent: usize,
    pub path_points: usize,
    pub station_shared: bool,
}

impl FeedSummary {
    pub fn of(model: &FeedModel) -> Self {
        let vessels = model.vessels();
        Self {
            clock_s: model.clock_s(),
            vessels: vessels.len(),
            listed: model.listed_count(),
            silent: vessels.iter().filter(|v| v.silent).count(),
            path_points: vessels.iter().map(|v| v.path.len()).sum(),
            station_shared: model.config().station.share_location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::ScenarioConfig;

    #[test]
    fn summary_counts_the_fleet() {
        let model = FeedModel::new(ScenarioConfig::from_args(6, 2));
        let summary = FeedSummary::of(&model);
        assert_eq!(summary.vessels, 6);
        assert_eq!(summary.listed, 6);
        assert_eq!(summary.path_points, 6);
        assert!(summary.station_shared);
    }
}

use serde::{Deserialize, Serialize};

/// Per-sector maximum reception distance in nautical miles, one array per
/// sub-channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorStat {
    #[serde(default)]
    pub radar_a: Vec<f64>,
    #[serde(default)]
    pub radar_b: Vec<f64>,
}

/// Buckets of one resolution, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketSeries {
    #[serde(default)]
    pub stat: Vec<SectorStat>,
}

/// Payload of the history endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub minute: BucketSeries,
    #[serde(default)]
    pub hour: BucketSeries,
    #[serde(default)]
    pub day: BucketSeries,
}

impl HistoryResponse {
    /// Number of angular sectors, taken from the newest day bucket.
    pub fn sector_count(&self) -> usize {
        self.day
            .stat
            .first()
            .map(|stat| stat.radar_a.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let body = r#"{
            "minute": {"stat": [{"radar_a": [1.0, 2.0], "radar_b": [0.5, 3.0], "msg": 4}]},
            "day": {"stat": [{"radar_a": [1.0, 2.0, 3.0], "radar_b": [0, 0, 0]}], "time": []}
        }"#;
        let history: HistoryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(history.sector_count(), 3);
        assert!(history.hour.stat.is_empty());
        assert_eq!(history.minute.stat[0].radar_b, vec![0.5, 3.0]);
    }
}

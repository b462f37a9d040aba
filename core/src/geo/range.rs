use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::geo::geodesy::{LocalFrame, METERS_PER_NM};
use crate::prelude::LatLon;
use crate::wire::history::{HistoryResponse, SectorStat};

/// Window of the long detection-range ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangeTimeframe {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl RangeTimeframe {
    pub const ALL: [RangeTimeframe; 3] = [
        RangeTimeframe::Day,
        RangeTimeframe::Week,
        RangeTimeframe::Month,
    ];

    /// Day buckets added on top of the minute and hour buckets.
    pub fn additional_days(self) -> usize {
        match self {
            RangeTimeframe::Day => 0,
            RangeTimeframe::Week => 7,
            RangeTimeframe::Month => 30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RangeTimeframe::Day => "24h",
            RangeTimeframe::Week => "7d",
            RangeTimeframe::Month => "30d",
        }
    }
}

/// Per-sector maxima in nautical miles.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeProfile {
    /// Last hour.
    pub short: Vec<f64>,
    /// Last hour plus the selected timeframe.
    pub long: Vec<f64>,
    pub timeframe: RangeTimeframe,
}

/// Element-wise maximum over both sub-channels of every bucket.
fn sector_max<'a>(buckets: impl Iterator<Item = &'a SectorStat>, sectors: usize) -> Array1<f64> {
    let rows: Vec<&Vec<f64>> = buckets
        .flat_map(|stat| [&stat.radar_a, &stat.radar_b])
        .collect();
    let mut grid = Array2::<f64>::zeros((rows.len(), sectors));
    for (mut line, values) in grid.axis_iter_mut(Axis(0)).zip(rows) {
        for (cell, value) in line.iter_mut().zip(values.iter()) {
            if value.is_finite() && *value > 0.0 {
                *cell = *value;
            }
        }
    }
    grid.fold_axis(Axis(0), 0.0, |acc, value| acc.max(*value))
}

impl RangeProfile {
    pub fn from_history(history: &HistoryResponse, timeframe: RangeTimeframe) -> Option<Self> {
        let sectors = history.sector_count();
        if sectors == 0 {
            return None;
        }

        let short = sector_max(history.minute.stat.iter(), sectors);
        let older = sector_max(
            history
                .hour
                .stat
                .iter()
                .chain(history.day.stat.iter().take(timeframe.additional_days())),
            sectors,
        );
        let long = ndarray::Zip::from(&short)
            .and(&older)
            .map_collect(|a, b| a.max(*b));

        Some(Self {
            short: short.to_vec(),
            long: long.to_vec(),
            timeframe,
        })
    }

    pub fn sectors(&self) -> usize {
        self.long.len()
    }

    /// Furthest sector of the long ring in nautical miles.
    pub fn max_range_nm(&self) -> f64 {
        self.long.iter().copied().fold(0.0, f64::max)
    }
}

/// Stepped ring around the station: two points per sector, at the sector's
/// start and end angle, both at the sector's maximum distance.
pub fn range_polygon(station: LatLon, sectors_nm: &[f64]) -> Vec<LatLon> {
    let frame = LocalFrame::at(station);
    let count = sectors_nm.len() as f64;
    sectors_nm
        .iter()
        .enumerate()
        .flat_map(|(index, nm)| {
            let distance = nm * METERS_PER_NM;
            let start = index as f64 / count * 2.0 * PI;
            let end = (index + 1) as f64 / count * 2.0 * PI;
            [frame.project(distance, start), frame.project(distance, end)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::geodesy::haversine_m;
    use crate::wire::history::BucketSeries;

    fn stat(a: &[f64], b: &[f64]) -> SectorStat {
        SectorStat {
            radar_a: a.to_vec(),
            radar_b: b.to_vec(),
        }
    }

    fn history() -> HistoryResponse {
        HistoryResponse {
            minute: BucketSeries {
                stat: vec![stat(&[1.0, 0.0, 2.0, 0.0], &[0.0, 3.0, 0.0, 0.0])],
            },
            hour: BucketSeries {
                stat: vec![stat(&[4.0, 0.0, 0.0, 0.0], &[0.0, 0.0, 0.0, 0.0])],
            },
            day: BucketSeries {
                stat: vec![
                    stat(&[0.0, 0.0, 0.0, 0.0], &[0.0, 0.0, 5.0, 0.0]),
                    stat(&[0.0, 0.0, 0.0, 9.0], &[f64::NAN, 0.0, 0.0, 0.0]),
                ],
            },
        }
    }

    #[test]
    fn long_ring_widens_with_timeframe() {
        let day = RangeProfile::from_history(&history(), RangeTimeframe::Day).unwrap();
        assert_eq!(day.short, vec![1.0, 3.0, 2.0, 0.0]);
        assert_eq!(day.long, vec![4.0, 3.0, 2.0, 0.0]);

        let week = RangeProfile::from_history(&history(), RangeTimeframe::Week).unwrap();
        assert_eq!(week.long, vec![4.0, 3.0, 5.0, 9.0]);
        assert_eq!(week.max_range_nm(), 9.0);
    }

    #[test]
    fn empty_history_has_no_profile() {
        assert!(RangeProfile::from_history(&HistoryResponse::default(), RangeTimeframe::Day).is_none());
    }

    #[test]
    fn polygon_has_two_points_per_sector() {
        let station = LatLon::new(52.0, 4.0);
        let ring = range_polygon(station, &[10.0, 10.0, 20.0, 10.0]);
        assert_eq!(ring.len(), 8);
        // sector 0 starts due north
        assert!((ring[0].lon - 4.0).abs() < 1e-12);
        assert!(ring[0].lat > 52.0);
        // sector 2 spans south to west at 20 nm
        let d = haversine_m(station, ring[4]);
        assert!((d - 20.0 * METERS_PER_NM).abs() < 100.0);
        assert_eq!(ring[1], ring[2]);
    }
}

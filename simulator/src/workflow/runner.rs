use crate::generator::profile::{spawn_fleet, SimVessel};
use crate::workflow::config::ScenarioConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use vesselcore::geo::{haversine_m, initial_bearing_deg, METERS_PER_NM};
use vesselcore::state::TrackRequest;
use vesselcore::wire::{
    BucketSeries, Field, FlagWord, HistoryResponse, PathResponse, RowBuilder, SectorStat,
    SnapshotResponse, StationRecord, Validation,
};

const MINUTE_BUCKETS: usize = 60;
const HOUR_BUCKETS: usize = 24;
const DAY_BUCKETS: usize = 30;

/// Rolling per-sector maxima at one resolution, newest bucket first.
#[derive(Debug, Clone)]
struct BucketRing {
    span_s: u64,
    cap: usize,
    current: Option<u64>,
    buckets: VecDeque<SectorStat>,
}

impl BucketRing {
    fn new(span_s: u64, cap: usize) -> Self {
        Self {
            span_s,
            cap,
            current: None,
            buckets: VecDeque::new(),
        }
    }

    fn roll(&mut self, now: u64, sectors: usize) {
        let index = now / self.span_s;
        if self.current != Some(index) {
            self.current = Some(index);
            self.buckets.push_front(SectorStat {
                radar_a: vec![0.0; sectors],
                radar_b: vec![0.0; sectors],
            });
            self.buckets.truncate(self.cap);
        }
    }

    fn record(&mut self, sector: usize, distance_nm: f64, class_b: bool) {
        if let Some(bucket) = self.buckets.front_mut() {
            let cells = if class_b {
                &mut bucket.radar_b
            } else {
                &mut bucket.radar_a
            };
            if let Some(cell) = cells.get_mut(sector) {
                *cell = cell.max(distance_nm);
            }
        }
    }

    fn series(&self) -> BucketSeries {
        BucketSeries {
            stat: self.buckets.iter().cloned().collect(),
        }
    }
}

/// The synthetic receiver: a fleet, a clock and the reception statistics.
pub struct FeedModel {
    config: ScenarioConfig,
    rng: StdRng,
    vessels: Vec<SimVessel>,
    clock_s: u64,
    minute: BucketRing,
    hour: BucketRing,
    day: BucketRing,
}

impl FeedModel {
    pub fn new(config: ScenarioConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let vessels = spawn_fleet(&config, &mut rng);
        let mut model = Self {
            config,
            rng,
            vessels,
            clock_s: 0,
            minute: BucketRing::new(60, MINUTE_BUCKETS),
            hour: BucketRing::new(3600, HOUR_BUCKETS),
            day: BucketRing::new(86_400, DAY_BUCKETS),
        };
        model.receive_all();
        model
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn clock_s(&self) -> u64 {
        self.clock_s
    }

    pub fn vessels(&self) -> &[SimVessel] {
        &self.vessels
    }

    /// Advances the simulation by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        let dt_s = dt.as_secs_f64();
        self.clock_s += dt.as_secs().max(1);

        let station = self.config.station.position();
        let max_radius_m = self.config.spawn_radius_nm * METERS_PER_NM * 1.2;
        for vessel in &mut self.vessels {
            vessel.advance(dt_s, station, max_radius_m, &mut self.rng);
            vessel.silent = if vessel.silent {
                !self.rng.gen_bool(self.config.reappear)
            } else {
                self.rng.gen_bool(self.config.dropout)
            };
        }
        self.receive_all();
    }

    fn receive_all(&mut self) {
        let now = self.clock_s;
        let sectors = self.config.sectors;
        for ring in [&mut self.minute, &mut self.hour, &mut self.day] {
            ring.roll(now, sectors);
        }

        let station = self.config.station.position();
        let sector_width = 360.0 / sectors as f64;
        for vessel in self.vessels.iter_mut().filter(|v| !v.silent) {
            vessel.record_fix(now, self.config.path_cap);

            let distance_nm = haversine_m(station, vessel.position) / METERS_PER_NM;
            let bearing = initial_bearing_deg(station, vessel.position);
            let sector = ((bearing / sector_width) as usize).min(sectors - 1);
            for ring in [&mut self.minute, &mut self.hour, &mut self.day] {
                ring.record(sector, distance_nm, vessel.is_class_b());
            }
        }
    }

    /// Vessels heard within the linger window.
    fn listed(&self) -> impl Iterator<Item = &SimVessel> {
        let now = self.clock_s;
        let linger = self.config.linger_s;
        self.vessels
            .iter()
            .filter(move |v| v.messages > 0 && now.saturating_sub(v.heard_at) <= linger)
    }

    pub fn listed_count(&self) -> usize {
        self.listed().count()
    }

    pub fn snapshot(&self) -> SnapshotResponse {
        let station_cfg = &self.config.station;
        let station = station_cfg.position();
        let values: Vec<_> = self
            .listed()
            .map(|vessel| {
                let fix = vessel.path.front().copied().unwrap_or(vessel.position);
                let flags = FlagWord {
                    validation: Validation::Pending,
                    repeat: 0,
                    virtual_aid: false,
                    approximate: false,
                    channels: vessel.channels,
                };
                let hull = vessel.hull;
                // position report type: 1 for class A, 18 for class B
                let msg_type: u32 = if vessel.is_class_b() { 1 << 18 } else { 1 << 1 };
                RowBuilder::new(vessel.mmsi)
                    .set(Field::Lat, fix.lat)
                    .set(Field::Lon, fix.lon)
                    .set(
                        Field::Distance,
                        (haversine_m(station, fix) / METERS_PER_NM * 10.0).round() / 10.0,
                    )
                    .set(Field::Bearing, initial_bearing_deg(station, fix).round())
                    .set(Field::Level, self.signal_level(vessel))
                    .set(Field::Count, vessel.messages)
                    .set(Field::Ppm, 0.0)
                    .set(Field::Approx, false)
                    .set_opt(Field::Heading, vessel.heading())
                    .set(Field::Cog, (vessel.cog * 10.0).round() / 10.0)
                    .set(Field::Speed, (vessel.speed_kn * 10.0).round() / 10.0)
                    .set_opt(Field::ToBow, hull.map(|h| h[0]))
                    .set_opt(Field::ToStern, hull.map(|h| h[1]))
                    .set_opt(Field::ToStarboard, hull.map(|h| h[2]))
                    .set_opt(Field::ToPort, hull.map(|h| h[3]))
                    .set(Field::Shiptype, vessel.shiptype)
                    .set(Field::MmsiType, vessel.mmsi_type as u8)
                    .set(Field::Shipclass, vessel.shipclass.code())
                    .set(Field::MsgType, msg_type)
                    .set(Field::Country, vessel.country.clone())
                    .set(Field::Status, if vessel.speed_kn < 0.5 { 5 } else { 0 })
                    .set_opt(Field::Draught, vessel.draught)
                    .set_opt(Field::Imo, vessel.imo)
                    .set_opt(Field::Callsign, vessel.callsign.clone())
                    .set_opt(Field::Shipname, vessel.name.clone())
                    .set_opt(Field::Destination, vessel.destination.clone())
                    .set(Field::LastSignal, self.clock_s.saturating_sub(vessel.heard_at))
                    .set(Field::Flags, flags.encode())
                    .set(Field::Validated, flags.validation.code())
                    .set(Field::Channels, flags.channels)
                    .build()
            })
            .collect();

        SnapshotResponse {
            count: Some(values.len()),
            station: station_cfg.share_location.then_some(StationRecord {
                lat: station_cfg.lat,
                lon: station_cfg.lon,
                mmsi: station_cfg.mmsi,
            }),
            values,
        }
    }

    /// Received level in dB, weaker with distance.
    fn signal_level(&self, vessel: &SimVessel) -> f64 {
        let distance_nm =
            haversine_m(self.config.station.position(), vessel.position) / METERS_PER_NM;
        -(10.0 + distance_nm * 1.5).min(60.0).round()
    }

    /// Paths of the requested vessels still listed in the snapshot.
    pub fn paths(&self, request: &TrackRequest) -> PathResponse {
        let tracks = self
            .listed()
            .filter(|vessel| match request {
                TrackRequest::All => true,
                TrackRequest::Vessels(ids) => ids.contains(&vessel.mmsi),
            })
            .map(|vessel| {
                let points = vessel.path.iter().map(|p| [p.lat, p.lon]).collect();
                (vessel.mmsi.to_string(), points)
            })
            .collect::<BTreeMap<_, _>>();
        PathResponse(tracks)
    }

    pub fn history(&self) -> HistoryResponse {
        HistoryResponse {
            minute: self.minute.series(),
            hour: self.hour.series(),
            day: self.day.series(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use vesselcore::wire::SnapshotDecoder;

    fn quiet_config(vessels: usize) -> ScenarioConfig {
        ScenarioConfig {
            dropout: 0.0,
            ..ScenarioConfig::from_args(vessels, 9)
        }
    }

    #[test]
    fn snapshot_rows_decode_cleanly() {
        let model = FeedModel::new(quiet_config(10));
        let snapshot = model.snapshot();
        assert_eq!(snapshot.values.len(), 10);
        assert!(snapshot.station.is_some());

        let decoded = SnapshotDecoder::new().decode(&snapshot, None);
        assert_eq!(decoded.report.accepted, 10);
        assert_eq!(decoded.report.rejected, 0);
        assert_eq!(decoded.report.flag_mismatches, 0);
        assert!(decoded.records.iter().all(|r| r.position.is_some()));
    }

    #[test]
    fn silent_vessels_leave_after_linger() {
        let mut config = quiet_config(3);
        config.linger_s = 5;
        let mut model = FeedModel::new(config);
        model.vessels[0].silent = true;
        model.config.reappear = 0.0;
        for _ in 0..10 {
            model.tick(Duration::from_secs(1));
        }
        let snapshot = model.snapshot();
        assert_eq!(snapshot.values.len(), 2);
    }

    #[test]
    fn paths_follow_the_request() {
        let mut model = FeedModel::new(quiet_config(4));
        model.tick(Duration::from_secs(1));
        let first = model.vessels()[0].mmsi;

        let all = model.paths(&TrackRequest::All);
        assert_eq!(all.len(), 4);

        let one = model.paths(&TrackRequest::Vessels(BTreeSet::from([first, 1])));
        assert_eq!(one.len(), 1);
        let tracks = one.into_tracks();
        assert_eq!(tracks[&first].len(), 2);
    }

    #[test]
    fn history_accumulates_sector_maxima() {
        let mut model = FeedModel::new(quiet_config(20));
        for _ in 0..61 {
            model.tick(Duration::from_secs(1));
        }
        let history = model.history();
        assert_eq!(history.minute.stat.len(), 2);
        assert_eq!(history.sector_count(), 72);
        let longest = history.day.stat[0]
            .radar_a
            .iter()
            .chain(history.day.stat[0].radar_b.iter())
            .copied()
            .fold(0.0, f64::max);
        assert!(longest > 0.0);
    }

    #[test]
    fn hidden_station_is_omitted() {
        let mut config = quiet_config(2);
        config.station.share_location = false;
        let model = FeedModel::new(config);
        assert!(model.snapshot().station.is_none());
    }
}

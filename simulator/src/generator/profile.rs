use crate::generator::template::{callsign, destination, vessel_name, FLAGS};
use crate::workflow::config::ScenarioConfig;
use rand::{seq::SliceRandom, Rng};
use std::collections::{HashSet, VecDeque};
use vesselcore::geo::{
    haversine_m, initial_bearing_deg, move_by, offset_per_meter, LocalFrame, METERS_PER_NM,
};
use vesselcore::wire::{MmsiType, ShipClass};
use vesselcore::LatLon;

const CLASS_A_KINDS: [(ShipClass, u16, f64); 6] = [
    (ShipClass::Cargo, 70, 18.0),
    (ShipClass::Tanker, 80, 15.0),
    (ShipClass::Passenger, 60, 22.0),
    (ShipClass::Fishing, 30, 6.0),
    (ShipClass::Special, 52, 10.0),
    (ShipClass::HighSpeed, 40, 35.0),
];

/// Antenna offsets: bow, stern, starboard, port.
pub type HullOffsets = [f64; 4];

/// One synthetic vessel and what the feed knows about it.
#[derive(Debug, Clone)]
pub struct SimVessel {
    pub mmsi: u32,
    pub position: LatLon,
    pub speed_kn: f64,
    pub cog: f64,
    pub reports_heading: bool,
    pub hull: Option<HullOffsets>,
    pub shipclass: ShipClass,
    pub mmsi_type: MmsiType,
    pub shiptype: u16,
    pub name: Option<String>,
    pub callsign: Option<String>,
    pub destination: Option<String>,
    pub imo: Option<u32>,
    pub country: String,
    pub draught: Option<f64>,
    pub channels: u8,
    /// Simulation second of the last reception.
    pub heard_at: u64,
    pub silent: bool,
    pub messages: u64,
    /// Most recent first.
    pub path: VecDeque<LatLon>,
}

impl SimVessel {
    pub fn heading(&self) -> Option<f64> {
        self.reports_heading.then(|| self.cog.round().rem_euclid(360.0))
    }

    pub fn is_class_b(&self) -> bool {
        self.mmsi_type == MmsiType::ClassB
    }

    /// Moves the vessel along its course for `dt_s` seconds, turning back
    /// toward the station once it strays past `max_radius_m`.
    pub fn advance<R: Rng>(&mut self, dt_s: f64, station: LatLon, max_radius_m: f64, rng: &mut R) {
        if haversine_m(station, self.position) > max_radius_m {
            self.cog = initial_bearing_deg(self.position, station) + rng.gen_range(-20.0..20.0);
        } else {
            self.cog += rng.gen_range(-3.0..3.0);
        }
        self.cog = self.cog.rem_euclid(360.0);

        let distance_m = self.speed_kn * METERS_PER_NM / 3600.0 * dt_s;
        if distance_m > 0.0 {
            let offset = offset_per_meter(self.position, self.cog);
            self.position = move_by(self.position, offset, distance_m);
        }
    }

    /// Registers a reception at `now` and appends the fix to the path.
    pub fn record_fix(&mut self, now: u64, cap: usize) {
        self.heard_at = now;
        self.messages += 1;
        self.path.push_front(self.position);
        self.path.truncate(cap.max(1));
    }
}

fn unique_mmsi<R: Rng>(rng: &mut R, mid: u32, taken: &mut HashSet<u32>) -> u32 {
    loop {
        let mmsi = mid * 1_000_000 + rng.gen_range(0..1_000_000);
        if taken.insert(mmsi) {
            return mmsi;
        }
    }
}

fn spawn_vessel<R: Rng>(
    config: &ScenarioConfig,
    frame: &LocalFrame,
    rng: &mut R,
    taken: &mut HashSet<u32>,
) -> SimVessel {
    let (country, mid) = FLAGS.choose(rng).copied().unwrap_or(FLAGS[0]);
    let class_b = rng.gen_bool(config.class_b_share);
    let (shipclass, shiptype, top_speed) = if class_b {
        (ShipClass::ClassB, 37, 8.0)
    } else {
        CLASS_A_KINDS
            .choose(rng)
            .copied()
            .unwrap_or(CLASS_A_KINDS[0])
    };

    let distance_m = rng.gen_range(0.05..1.0) * config.spawn_radius_nm * METERS_PER_NM;
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    let position = frame.project(distance_m, angle);

    // a share of the fleet is moored
    let speed_kn = if rng.gen_bool(0.15) {
        rng.gen_range(0.0..0.5)
    } else {
        rng.gen_range(2.0..top_speed)
    };

    let hull = rng.gen_bool(0.9).then(|| {
        let length: f64 = if class_b {
            rng.gen_range(8.0..25.0)
        } else {
            rng.gen_range(30.0..300.0)
        };
        let beam = (length / 6.5).round().max(3.0);
        let to_bow = (length * rng.gen_range(0.6..0.85)).round();
        let to_port = (beam / 2.0).round();
        [to_bow, length.round() - to_bow, beam - to_port, to_port]
    });

    SimVessel {
        mmsi: unique_mmsi(rng, mid, taken),
        position,
        speed_kn,
        cog: rng.gen_range(0.0..360.0),
        reports_heading: !class_b && rng.gen_bool(0.7),
        hull,
        shipclass,
        mmsi_type: if class_b {
            MmsiType::ClassB
        } else {
            MmsiType::ClassA
        },
        shiptype,
        name: rng.gen_bool(0.95).then(|| vessel_name(rng)),
        callsign: rng.gen_bool(0.9).then(|| callsign(rng, country)),
        destination: (!class_b).then(|| destination(rng)),
        imo: (!class_b).then(|| rng.gen_range(9_000_000..9_999_999)),
        country: country.to_string(),
        draught: (!class_b).then(|| (rng.gen_range(3.0..14.0_f64) * 10.0).round() / 10.0),
        channels: if rng.gen_bool(0.5) { 0b01 } else { 0b11 },
        heard_at: 0,
        silent: false,
        messages: 0,
        path: VecDeque::new(),
    }
}

/// Spawns the scenario's fleet around the station.
pub fn spawn_fleet<R: Rng>(config: &ScenarioConfig, rng: &mut R) -> Vec<SimVessel> {
    let frame = LocalFrame::at(config.station.position());
    let mut taken = HashSet::new();
    (0..config.vessels)
        .map(|_| spawn_vessel(config, &frame, rng, &mut taken))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn fleet_is_deterministic_and_unique() {
        let config = ScenarioConfig::from_args(25, 42);
        let a = spawn_fleet(&config, &mut StdRng::seed_from_u64(config.seed));
        let b = spawn_fleet(&config, &mut StdRng::seed_from_u64(config.seed));
        assert_eq!(a.len(), 25);
        let ids: HashSet<u32> = a.iter().map(|v| v.mmsi).collect();
        assert_eq!(ids.len(), 25);
        assert_eq!(
            a.iter().map(|v| v.mmsi).collect::<Vec<_>>(),
            b.iter().map(|v| v.mmsi).collect::<Vec<_>>()
        );

        let station = config.station.position();
        let limit = config.spawn_radius_nm * METERS_PER_NM * 1.01;
        assert!(a.iter().all(|v| haversine_m(station, v.position) <= limit));
    }

    #[test]
    fn advance_covers_speed_times_time() {
        let config = ScenarioConfig::from_args(1, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let mut vessel = spawn_fleet(&config, &mut rng).remove(0);
        vessel.speed_kn = 10.0;
        let start = vessel.position;

        vessel.advance(360.0, config.station.position(), 1.0e7, &mut rng);
        let moved = haversine_m(start, vessel.position);
        assert!((moved - METERS_PER_NM).abs() < METERS_PER_NM * 0.01);
    }

    #[test]
    fn path_history_is_capped_newest_first() {
        let config = ScenarioConfig::from_args(1, 5);
        let mut rng = StdRng::seed_from_u64(5);
        let mut vessel = spawn_fleet(&config, &mut rng).remove(0);
        vessel.speed_kn = 12.0;
        for second in 1..=10 {
            vessel.advance(1.0, config.station.position(), 1.0e7, &mut rng);
            vessel.record_fix(second, 4);
        }
        assert_eq!(vessel.path.len(), 4);
        assert_eq!(vessel.path.front(), Some(&vessel.position));
        assert_eq!(vessel.heard_at, 10);
        assert_eq!(vessel.messages, 10);
    }
}

use serde::{Deserialize, Serialize};

use crate::prelude::{LatLon, Mmsi};
use crate::wire::flags::Validation;

/// Above this speed in knots the course over ground stands in for a missing
/// heading.
pub const COURSE_SPEED_THRESHOLD_KN: f64 = 1.0;

/// Rendering category of a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShipClass {
    #[default]
    Other,
    Unknown,
    Cargo,
    ClassB,
    Passenger,
    Special,
    Tanker,
    HighSpeed,
    Fishing,
    Plane,
    Helicopter,
    Station,
    AidToNavigation,
    SartEpirb,
}

impl ShipClass {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ShipClass::Unknown,
            2 => ShipClass::Cargo,
            3 => ShipClass::ClassB,
            4 => ShipClass::Passenger,
            5 => ShipClass::Special,
            6 => ShipClass::Tanker,
            7 => ShipClass::HighSpeed,
            8 => ShipClass::Fishing,
            9 => ShipClass::Plane,
            10 => ShipClass::Helicopter,
            11 => ShipClass::Station,
            12 => ShipClass::AidToNavigation,
            13 => ShipClass::SartEpirb,
            _ => ShipClass::Other,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            ShipClass::Other => "Other",
            ShipClass::Unknown => "Unknown",
            ShipClass::Cargo => "Cargo",
            ShipClass::ClassB => "Class B",
            ShipClass::Passenger => "Passenger",
            ShipClass::Special => "Special",
            ShipClass::Tanker => "Tanker",
            ShipClass::HighSpeed => "High Speed",
            ShipClass::Fishing => "Fishing",
            ShipClass::Plane => "Aircraft",
            ShipClass::Helicopter => "Helicopter",
            ShipClass::Station => "Base Station",
            ShipClass::AidToNavigation => "AtoN",
            ShipClass::SartEpirb => "SART/EPIRB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MmsiType {
    #[default]
    Other,
    ClassA,
    ClassB,
    BaseStation,
    SarAircraft,
    SartEpirb,
    AidToNavigation,
}

impl MmsiType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MmsiType::ClassA,
            2 => MmsiType::ClassB,
            3 => MmsiType::BaseStation,
            4 => MmsiType::SarAircraft,
            5 => MmsiType::SartEpirb,
            6 => MmsiType::AidToNavigation,
            _ => MmsiType::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MmsiType::Other => "Other",
            MmsiType::ClassA => "Class A",
            MmsiType::ClassB => "Class B",
            MmsiType::BaseStation => "Base Station",
            MmsiType::SarAircraft => "SAR aircraft",
            MmsiType::SartEpirb => "SART/EPIRB",
            MmsiType::AidToNavigation => "AtoN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    /// Knots.
    pub speed: Option<f64>,
    /// Degrees true.
    pub cog: Option<f64>,
    /// Degrees true.
    pub heading: Option<f64>,
    pub nav_status: Option<u8>,
}

impl Kinematics {
    /// Heading used to orient the hull: true heading, else course when the
    /// vessel is actually under way.
    pub fn effective_heading(&self) -> Option<f64> {
        self.heading.or_else(|| {
            self.cog
                .filter(|_| self.speed.map_or(false, |s| s > COURSE_SPEED_THRESHOLD_KN))
        })
    }

    /// Marker rotation ignores the speed threshold.
    pub fn rotation(&self) -> Option<f64> {
        self.heading.or(self.cog)
    }
}

/// Antenna offsets in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hull {
    pub to_bow: Option<f64>,
    pub to_stern: Option<f64>,
    pub to_starboard: Option<f64>,
    pub to_port: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullDimensions {
    pub to_bow: f64,
    pub to_stern: f64,
    pub to_starboard: f64,
    pub to_port: f64,
}

impl HullDimensions {
    pub fn length(&self) -> f64 {
        self.to_bow + self.to_stern
    }

    pub fn beam(&self) -> f64 {
        self.to_port + self.to_starboard
    }
}

impl Hull {
    /// All four offsets, or `None` when any is missing or the hull has no
    /// length.
    pub fn dimensions(&self) -> Option<HullDimensions> {
        let dims = HullDimensions {
            to_bow: self.to_bow?,
            to_stern: self.to_stern?,
            to_starboard: self.to_starboard?,
            to_port: self.to_port?,
        };
        (dims.length() > 0.0).then_some(dims)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Classification {
    pub shipclass: ShipClass,
    pub shiptype: Option<u16>,
    pub mmsi_type: MmsiType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Eta {
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
}

impl Eta {
    pub fn is_known(&self) -> bool {
        self.month.is_some() || self.day.is_some() || self.hour.is_some() || self.minute.is_some()
    }

    pub fn display(&self) -> String {
        fn part(value: Option<u8>) -> String {
            value.map_or_else(|| "--".to_string(), |v| format!("{:02}", v))
        }
        format!(
            "{}-{} {}:{}",
            part(self.month),
            part(self.day),
            part(self.hour),
            part(self.minute)
        )
    }
}

/// Free-text fields, already escaped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Identity {
    pub name: Option<String>,
    pub callsign: Option<String>,
    pub imo: Option<u32>,
    pub destination: Option<String>,
    pub eta: Eta,
    pub country: Option<String>,
    pub draught: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quality {
    pub level: Option<f64>,
    pub ppm: Option<f64>,
    pub count: Option<u64>,
    pub validation: Validation,
    pub repeat: u8,
    pub virtual_aid: bool,
    pub approximate: bool,
    pub channels: u8,
    pub msg_types: Option<u64>,
    pub last_group: Option<u64>,
    pub group_mask: Option<u64>,
    pub altitude: Option<f64>,
    pub received_stations: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VesselRecord {
    pub mmsi: Mmsi,
    /// `None` when the row carried no usable fix.
    pub position: Option<LatLon>,
    /// Nautical miles from the station.
    pub distance: Option<f64>,
    pub bearing: Option<f64>,
    pub kinematics: Kinematics,
    pub hull: Hull,
    pub classification: Classification,
    pub identity: Identity,
    pub quality: Quality,
    /// Seconds between the server snapshot time and the last reception,
    /// measured on the server clock.
    pub last_signal: Option<u64>,
}

impl VesselRecord {
    pub fn new(mmsi: Mmsi) -> Self {
        Self {
            mmsi,
            position: None,
            distance: None,
            bearing: None,
            kinematics: Kinematics::default(),
            hull: Hull::default(),
            classification: Classification::default(),
            identity: Identity::default(),
            quality: Quality::default(),
            last_signal: None,
        }
    }

    /// Name when known, else the mmsi.
    pub fn display_name(&self) -> String {
        self.identity
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map_or_else(|| self.mmsi.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_replaces_heading_only_when_under_way() {
        let mut kin = Kinematics {
            speed: Some(0.5),
            cog: Some(90.0),
            heading: None,
            nav_status: None,
        };
        assert_eq!(kin.effective_heading(), None);
        assert_eq!(kin.rotation(), Some(90.0));
        kin.speed = Some(12.3);
        assert_eq!(kin.effective_heading(), Some(90.0));
        kin.heading = Some(45.0);
        assert_eq!(kin.effective_heading(), Some(45.0));
    }

    #[test]
    fn hull_needs_every_offset() {
        let mut hull = Hull {
            to_bow: Some(100.0),
            to_stern: Some(20.0),
            to_starboard: Some(10.0),
            to_port: None,
        };
        assert!(hull.dimensions().is_none());
        hull.to_port = Some(10.0);
        let dims = hull.dimensions().unwrap();
        assert_eq!(dims.length(), 120.0);
        assert_eq!(dims.beam(), 20.0);
        hull.to_bow = Some(0.0);
        hull.to_stern = Some(0.0);
        assert!(hull.dimensions().is_none());
    }

    #[test]
    fn class_codes_fall_back_to_other() {
        assert_eq!(ShipClass::from_code(6), ShipClass::Tanker);
        assert_eq!(ShipClass::from_code(99), ShipClass::Other);
        assert_eq!(ShipClass::Tanker.code(), 6);
        assert_eq!(MmsiType::from_code(3), MmsiType::BaseStation);
    }

    #[test]
    fn unnamed_vessels_display_their_mmsi() {
        let mut record = VesselRecord::new(244_660_000);
        assert_eq!(record.display_name(), "244660000");
        record.identity.name = Some("HOPE".into());
        assert_eq!(record.display_name(), "HOPE");
    }
}

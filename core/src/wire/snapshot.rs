use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prelude::{LatLon, Mmsi, SyncError, SyncResult};
use crate::telemetry::log::LogManager;
use crate::wire::flags::FlagWord;
use crate::wire::schema::{Field, Row};
use crate::wire::vessel::{
    Classification, Eta, Hull, Identity, Kinematics, MmsiType, Quality, ShipClass, VesselRecord,
};

/// Payload of the vessel snapshot endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<StationRecord>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Receiving station as reported alongside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mmsi: Option<Mmsi>,
}

impl StationRecord {
    pub fn position(&self) -> Option<LatLon> {
        Some(LatLon::new(self.lat, self.lon)).filter(LatLon::is_valid_fix)
    }
}

/// Predicate deciding whether a decoded vessel enters the registry.
pub type InclusionFilter = dyn Fn(&VesselRecord) -> bool + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeReport {
    pub accepted: usize,
    pub excluded: usize,
    pub rejected: usize,
    pub flag_mismatches: usize,
    pub type_mismatches: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub records: Vec<VesselRecord>,
    pub station: Option<StationRecord>,
    pub report: DecodeReport,
}

/// Escapes markup in free text coming off the wire.
pub fn sanitize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escaped as received; padding and blank strings are kept.
fn sanitized(row: &Row<'_>, field: Field) -> Option<String> {
    row.text(field).map(sanitize_text)
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v >= 0.0)
}

fn below(value: Option<f64>, limit: f64) -> Option<f64> {
    value.filter(|v| *v >= 0.0 && *v < limit)
}

fn small(value: Option<i64>, sentinel: i64, max: i64) -> Option<u8> {
    value
        .filter(|v| *v != sentinel && (0..=max).contains(v))
        .map(|v| v as u8)
}

fn unsigned(value: Option<i64>) -> Option<u64> {
    value.filter(|v| *v >= 0).map(|v| v as u64)
}

/// Turns snapshot rows into vessel records.
#[derive(Debug, Clone)]
pub struct SnapshotDecoder {
    logger: LogManager,
}

impl SnapshotDecoder {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("decoder"),
        }
    }

    /// Decodes every row; rows failing the schema are counted and skipped.
    pub fn decode(&self, response: &SnapshotResponse, filter: Option<&InclusionFilter>) -> Decoded {
        let mut report = DecodeReport::default();
        let mut records = Vec::with_capacity(response.values.len());

        for values in &response.values {
            match self.decode_row(values) {
                Ok((record, check)) => {
                    report.flag_mismatches += check.flag_mismatches;
                    report.type_mismatches += check.type_mismatches;
                    if filter.map_or(true, |accept| accept(&record)) {
                        report.accepted += 1;
                        records.push(record);
                    } else {
                        report.excluded += 1;
                    }
                }
                Err(err) => {
                    report.rejected += 1;
                    self.logger.warn(&format!("dropping row: {}", err));
                }
            }
        }

        if let Some(expected) = response.count {
            if expected != response.values.len() {
                self.logger.detail(&format!(
                    "count field says {} rows, payload has {}",
                    expected,
                    response.values.len()
                ));
            }
        }

        Decoded {
            records,
            station: response.station,
            report,
        }
    }

    pub fn decode_row(&self, values: &[Value]) -> SyncResult<(VesselRecord, RowCheck)> {
        let row = Row::new(values)?;
        let mmsi = row
            .int(Field::Mmsi)
            .filter(|v| *v > 0 && *v <= i64::from(u32::MAX))
            .map(|v| v as Mmsi)
            .ok_or_else(|| SyncError::Schema("row without a usable mmsi".into()))?;

        let mut check = RowCheck::default();
        let wrong_types = row.type_mismatches();
        if !wrong_types.is_empty() {
            check.type_mismatches = wrong_types.len();
            let keys: Vec<&str> = wrong_types.iter().map(|f| f.key()).collect();
            self.logger
                .detail(&format!("{}: unexpected types for {}", mmsi, keys.join(", ")));
        }

        let raw_flags = row
            .int(Field::Flags)
            .filter(|v| *v >= 0)
            .map_or(0, |v| v as u32);
        let flags = FlagWord::decode(raw_flags);

        if let Some(validated) = row.int(Field::Validated) {
            if validated != flags.validation.code() {
                check.flag_mismatches += 1;
                self.logger.warn(&format!(
                    "{}: validated column {} disagrees with flags {}",
                    mmsi,
                    validated,
                    flags.validation.code()
                ));
            }
        }
        if let Some(channels) = row.int(Field::Channels) {
            if channels != i64::from(flags.channels) {
                check.flag_mismatches += 1;
                self.logger.warn(&format!(
                    "{}: channels column {} disagrees with flags {}",
                    mmsi, channels, flags.channels
                ));
            }
        }

        let position = match (row.float(Field::Lat), row.float(Field::Lon)) {
            (Some(lat), Some(lon)) => Some(LatLon::new(lat, lon)).filter(LatLon::is_valid_fix),
            _ => None,
        };

        let record = VesselRecord {
            mmsi,
            position,
            distance: non_negative(row.float(Field::Distance)),
            bearing: below(row.float(Field::Bearing), 360.0),
            kinematics: Kinematics {
                speed: below(row.float(Field::Speed), 102.3),
                cog: below(row.float(Field::Cog), 360.0),
                heading: below(row.float(Field::Heading), 360.0),
                nav_status: small(row.int(Field::Status), 15, 14),
            },
            hull: Hull {
                to_bow: non_negative(row.float(Field::ToBow)),
                to_stern: non_negative(row.float(Field::ToStern)),
                to_starboard: non_negative(row.float(Field::ToStarboard)),
                to_port: non_negative(row.float(Field::ToPort)),
            },
            classification: Classification {
                shipclass: row
                    .int(Field::Shipclass)
                    .map_or(ShipClass::Unknown, ShipClass::from_code),
                shiptype: row
                    .int(Field::Shiptype)
                    .filter(|v| (1..=u16::MAX as i64).contains(v))
                    .map(|v| v as u16),
                mmsi_type: row
                    .int(Field::MmsiType)
                    .map_or(MmsiType::Other, MmsiType::from_code),
            },
            identity: Identity {
                name: sanitized(&row, Field::Shipname),
                callsign: sanitized(&row, Field::Callsign),
                imo: row
                    .int(Field::Imo)
                    .filter(|v| *v > 0 && *v <= i64::from(u32::MAX))
                    .map(|v| v as u32),
                destination: sanitized(&row, Field::Destination),
                eta: Eta {
                    month: small(row.int(Field::EtaMonth), 0, 12),
                    day: small(row.int(Field::EtaDay), 0, 31),
                    hour: small(row.int(Field::EtaHour), 24, 23),
                    minute: small(row.int(Field::EtaMinute), 60, 59),
                },
                country: sanitized(&row, Field::Country),
                draught: row.float(Field::Draught).filter(|v| *v > 0.0),
            },
            quality: Quality {
                level: row.float(Field::Level),
                ppm: non_negative(row.float(Field::Ppm)),
                count: unsigned(row.int(Field::Count)),
                validation: flags.validation,
                repeat: flags.repeat,
                virtual_aid: flags.virtual_aid,
                approximate: flags.approximate,
                channels: flags.channels,
                msg_types: unsigned(row.int(Field::MsgType)),
                last_group: unsigned(row.int(Field::LastGroup)),
                group_mask: unsigned(row.int(Field::GroupMask)),
                altitude: row.float(Field::Altitude),
                received_stations: unsigned(row.int(Field::ReceivedStations))
                    .map(|v| v.min(u64::from(u32::MAX)) as u32),
            },
            last_signal: row
                .int(Field::LastSignal)
                .map(|v| v.max(0) as u64),
        };

        Ok((record, check))
    }
}

impl Default for SnapshotDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-row findings that do not prevent decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCheck {
    pub flag_mismatches: usize,
    pub type_mismatches: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::flags::Validation;
    use crate::wire::schema::RowBuilder;
    use serde_json::json;

    fn rotterdam_row() -> Vec<Value> {
        RowBuilder::new(123_456_789)
            .set(Field::Lat, 51.9)
            .set(Field::Lon, 4.5)
            .set(Field::Speed, 12.3)
            .set(Field::Cog, 90.0)
            .set(Field::Heading, 511)
            .set(Field::ToBow, 100)
            .set(Field::ToStern, 20)
            .set(Field::ToPort, 10)
            .set(Field::ToStarboard, 10)
            .set(Field::Shipclass, 2)
            .set(Field::Flags, 0)
            .build()
    }

    #[test]
    fn decodes_scenario_vessel() {
        let decoder = SnapshotDecoder::new();
        let (record, check) = decoder.decode_row(&rotterdam_row()).unwrap();
        assert_eq!(record.mmsi, 123_456_789);
        assert_eq!(record.position, Some(LatLon::new(51.9, 4.5)));
        assert_eq!(record.kinematics.heading, None);
        assert_eq!(record.kinematics.effective_heading(), Some(90.0));
        assert_eq!(record.quality.validation, Validation::Pending);
        assert_eq!(record.quality.repeat, 0);
        assert_eq!(record.classification.shipclass, ShipClass::Cargo);
        assert_eq!(check, RowCheck::default());
    }

    #[test]
    fn sentinels_decode_to_unknown() {
        let values = RowBuilder::new(5)
            .set(Field::Lat, 91)
            .set(Field::Lon, 181)
            .set(Field::Speed, -1)
            .set(Field::Cog, 360)
            .set(Field::ToBow, -1)
            .set(Field::Status, 15)
            .set(Field::EtaMonth, 0)
            .set(Field::EtaHour, 24)
            .set(Field::EtaMinute, 60)
            .set(Field::Imo, 0)
            .set(Field::Distance, -1)
            .build();
        let (record, _) = SnapshotDecoder::new().decode_row(&values).unwrap();
        assert_eq!(record.position, None);
        assert_eq!(record.kinematics, Kinematics::default());
        assert_eq!(record.hull.to_bow, None);
        assert!(!record.identity.eta.is_known());
        assert_eq!(record.identity.imo, None);
        assert_eq!(record.distance, None);
    }

    #[test]
    fn redundant_columns_agree_with_flags_for_every_word() {
        let decoder = SnapshotDecoder::new();
        for raw in 0..1024i64 {
            let validated = if raw & 3 == 2 { -1 } else { raw & 3 };
            let channels = (raw >> 6) & 0xF;
            let values = RowBuilder::new(9)
                .set(Field::Flags, raw)
                .set(Field::Validated, validated)
                .set(Field::Channels, channels)
                .build();
            let (record, check) = decoder.decode_row(&values).unwrap();
            assert_eq!(check.flag_mismatches, 0, "flags {}", raw);
            assert_eq!(record.quality.validation.code(), validated);
            assert_eq!(i64::from(record.quality.channels), channels);
            assert_eq!(i64::from(record.quality.repeat), (raw >> 2) & 3);
        }
    }

    #[test]
    fn mismatching_redundant_column_is_reported_not_fatal() {
        let values = RowBuilder::new(9)
            .set(Field::Flags, 1)
            .set(Field::Validated, 0)
            .build();
        let (record, check) = SnapshotDecoder::new().decode_row(&values).unwrap();
        assert_eq!(check.flag_mismatches, 1);
        assert_eq!(record.quality.validation, Validation::Confirmed);
    }

    #[test]
    fn free_text_is_escaped() {
        let values = RowBuilder::new(9)
            .set(Field::Shipname, "<b>\"A&B\"</b>")
            .set(Field::Callsign, "`x'")
            .build();
        let (record, _) = SnapshotDecoder::new().decode_row(&values).unwrap();
        assert_eq!(
            record.identity.name.as_deref(),
            Some("&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;")
        );
        assert_eq!(record.identity.callsign.as_deref(), Some("&#96;x&#039;"));
    }

    #[test]
    fn free_text_keeps_padding() {
        let values = RowBuilder::new(9)
            .set(Field::Shipname, " NORDIC  ")
            .set(Field::Destination, "")
            .build();
        let (record, _) = SnapshotDecoder::new().decode_row(&values).unwrap();
        assert_eq!(record.identity.name.as_deref(), Some(" NORDIC  "));
        assert_eq!(record.identity.destination.as_deref(), Some(""));
        assert_eq!(record.display_name(), " NORDIC  ");
    }

    #[test]
    fn filter_excludes_and_short_rows_are_counted() {
        let response = SnapshotResponse {
            count: Some(3),
            station: Some(StationRecord {
                lat: 52.0,
                lon: 4.0,
                mmsi: None,
            }),
            values: vec![
                rotterdam_row(),
                RowBuilder::new(2).build(),
                vec![json!(3), json!(51.0)],
            ],
        };
        let keep_named = |record: &VesselRecord| record.position.is_some();
        let decoded = SnapshotDecoder::new().decode(&response, Some(&keep_named));
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.report.accepted, 1);
        assert_eq!(decoded.report.excluded, 1);
        assert_eq!(decoded.report.rejected, 1);
        assert_eq!(
            decoded.station.and_then(|s| s.position()),
            Some(LatLon::new(52.0, 4.0))
        );
    }

    #[test]
    fn parses_server_document() {
        let body = json!({
            "count": 1,
            "values": [rotterdam_row()]
        })
        .to_string();
        let response: SnapshotResponse = serde_json::from_str(&body).unwrap();
        assert!(response.station.is_none());
        assert_eq!(response.values.len(), 1);
    }
}

//! Positional layout of a snapshot row.
//!
//! The server sends every vessel as a bare JSON array; the position of each
//! value is fixed by [`FIELDS`]. Rows are checked against this schema once,
//! when they are decoded, and typed access goes through [`Row`].

use serde_json::Value;

use crate::prelude::{SyncError, SyncResult};

/// JSON shape expected for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Bool,
    Text,
}

/// Every column of a snapshot row, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Mmsi,
    Lat,
    Lon,
    Distance,
    Bearing,
    Level,
    Count,
    Ppm,
    Approx,
    Heading,
    Cog,
    Speed,
    ToBow,
    ToStern,
    ToStarboard,
    ToPort,
    LastGroup,
    GroupMask,
    Shiptype,
    MmsiType,
    Shipclass,
    MsgType,
    Country,
    Status,
    Draught,
    EtaMonth,
    EtaDay,
    EtaHour,
    EtaMinute,
    Imo,
    Callsign,
    Shipname,
    Destination,
    LastSignal,
    Flags,
    Validated,
    Channels,
    Altitude,
    ReceivedStations,
}

pub const FIELDS: [Field; 39] = [
    Field::Mmsi,
    Field::Lat,
    Field::Lon,
    Field::Distance,
    Field::Bearing,
    Field::Level,
    Field::Count,
    Field::Ppm,
    Field::Approx,
    Field::Heading,
    Field::Cog,
    Field::Speed,
    Field::ToBow,
    Field::ToStern,
    Field::ToStarboard,
    Field::ToPort,
    Field::LastGroup,
    Field::GroupMask,
    Field::Shiptype,
    Field::MmsiType,
    Field::Shipclass,
    Field::MsgType,
    Field::Country,
    Field::Status,
    Field::Draught,
    Field::EtaMonth,
    Field::EtaDay,
    Field::EtaHour,
    Field::EtaMinute,
    Field::Imo,
    Field::Callsign,
    Field::Shipname,
    Field::Destination,
    Field::LastSignal,
    Field::Flags,
    Field::Validated,
    Field::Channels,
    Field::Altitude,
    Field::ReceivedStations,
];

/// Rows must carry every column up to and including `flags`. The redundant
/// columns after it were added later and may be missing.
pub const REQUIRED_ARITY: usize = Field::Flags as usize + 1;

impl Field {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn key(self) -> &'static str {
        match self {
            Field::Mmsi => "mmsi",
            Field::Lat => "lat",
            Field::Lon => "lon",
            Field::Distance => "distance",
            Field::Bearing => "bearing",
            Field::Level => "level",
            Field::Count => "count",
            Field::Ppm => "ppm",
            Field::Approx => "approx",
            Field::Heading => "heading",
            Field::Cog => "cog",
            Field::Speed => "speed",
            Field::ToBow => "to_bow",
            Field::ToStern => "to_stern",
            Field::ToStarboard => "to_starboard",
            Field::ToPort => "to_port",
            Field::LastGroup => "last_group",
            Field::GroupMask => "group_mask",
            Field::Shiptype => "shiptype",
            Field::MmsiType => "mmsi_type",
            Field::Shipclass => "shipclass",
            Field::MsgType => "msg_type",
            Field::Country => "country",
            Field::Status => "status",
            Field::Draught => "draught",
            Field::EtaMonth => "eta_month",
            Field::EtaDay => "eta_day",
            Field::EtaHour => "eta_hour",
            Field::EtaMinute => "eta_minute",
            Field::Imo => "imo",
            Field::Callsign => "callsign",
            Field::Shipname => "shipname",
            Field::Destination => "destination",
            Field::LastSignal => "last_signal",
            Field::Flags => "flags",
            Field::Validated => "validated",
            Field::Channels => "channels",
            Field::Altitude => "altitude",
            Field::ReceivedStations => "received_stations",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Field::Lat
            | Field::Lon
            | Field::Distance
            | Field::Bearing
            | Field::Level
            | Field::Ppm
            | Field::Heading
            | Field::Cog
            | Field::Speed
            | Field::Draught
            | Field::Altitude => FieldKind::Float,
            Field::Approx => FieldKind::Bool,
            Field::Country | Field::Callsign | Field::Shipname | Field::Destination => {
                FieldKind::Text
            }
            _ => FieldKind::Integer,
        }
    }
}

fn matches_kind(value: &Value, kind: FieldKind) -> bool {
    match kind {
        FieldKind::Integer => value.is_i64() || value.is_u64(),
        FieldKind::Float => value.is_number(),
        // older servers send 0/1 instead of booleans
        FieldKind::Bool => value.is_boolean() || value.is_u64(),
        FieldKind::Text => value.is_string(),
    }
}

/// A snapshot row that passed the arity check.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn new(values: &'a [Value]) -> SyncResult<Self> {
        if values.len() < REQUIRED_ARITY {
            return Err(SyncError::Schema(format!(
                "row has {} values, expected at least {}",
                values.len(),
                REQUIRED_ARITY
            )));
        }
        Ok(Self { values })
    }

    /// Present values whose JSON type does not fit their column.
    pub fn type_mismatches(&self) -> Vec<Field> {
        FIELDS
            .iter()
            .copied()
            .filter(|field| {
                self.raw(*field)
                    .map(|value| !matches_kind(value, field.kind()))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Values beyond the known schema.
    pub fn extra_values(&self) -> usize {
        self.values.len().saturating_sub(FIELDS.len())
    }

    pub fn raw(&self, field: Field) -> Option<&'a Value> {
        self.values.get(field.index()).filter(|value| !value.is_null())
    }

    pub fn int(&self, field: Field) -> Option<i64> {
        let value = self.raw(field)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|v| v.is_finite() && v.fract() == 0.0)
                .map(|v| v as i64)
        })
    }

    pub fn float(&self, field: Field) -> Option<f64> {
        self.raw(field)?.as_f64().filter(|v| v.is_finite())
    }

    pub fn flag(&self, field: Field) -> Option<bool> {
        let value = self.raw(field)?;
        value.as_bool().or_else(|| value.as_u64().map(|v| v != 0))
    }

    pub fn text(&self, field: Field) -> Option<&'a str> {
        self.raw(field)?.as_str()
    }
}

/// Assembles a positional row; unset columns are `null`.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    values: Vec<Value>,
}

impl RowBuilder {
    pub fn new(mmsi: u32) -> Self {
        let mut values = vec![Value::Null; FIELDS.len()];
        values[Field::Mmsi.index()] = Value::from(mmsi);
        values[Field::Flags.index()] = Value::from(0);
        Self { values }
    }

    pub fn set(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.values[field.index()] = value.into();
        self
    }

    pub fn set_opt<T: Into<Value>>(self, field: Field, value: Option<T>) -> Self {
        match value {
            Some(value) => self.set(field, value),
            None => self.set(field, Value::Null),
        }
    }

    pub fn build(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_order_matches_wire_keys() {
        let keys: Vec<&str> = FIELDS.iter().map(|f| f.key()).collect();
        assert_eq!(keys[0], "mmsi");
        assert_eq!(keys[34], "flags");
        assert_eq!(keys[38], "received_stations");
        for (position, field) in FIELDS.iter().enumerate() {
            assert_eq!(field.index(), position);
        }
        assert_eq!(REQUIRED_ARITY, 35);
    }

    #[test]
    fn short_rows_are_rejected() {
        let values = vec![json!(1); REQUIRED_ARITY - 1];
        assert!(matches!(Row::new(&values), Err(SyncError::Schema(_))));
    }

    #[test]
    fn typed_access_treats_null_and_wrong_types_as_absent() {
        let values = RowBuilder::new(7)
            .set(Field::Lat, 51.5)
            .set(Field::Shipname, 12)
            .set(Field::Approx, 1)
            .build();
        let row = Row::new(&values).unwrap();
        assert_eq!(row.int(Field::Mmsi), Some(7));
        assert_eq!(row.float(Field::Lat), Some(51.5));
        assert_eq!(row.float(Field::Lon), None);
        assert_eq!(row.text(Field::Shipname), None);
        assert_eq!(row.flag(Field::Approx), Some(true));
        assert_eq!(row.type_mismatches(), vec![Field::Shipname]);
    }
}

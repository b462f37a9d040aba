use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::geo::units::{format_age, MeasurementSystem};
use crate::prelude::Mmsi;
use crate::state::registry::VesselRegistry;
use crate::wire::vessel::VesselRecord;

/// The table stops after this many rows.
pub const TABLE_ROW_LIMIT: usize = 101;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableColumn {
    Flag,
    #[default]
    Shipname,
    Distance,
    Speed,
    Type,
    LastSignal,
}

impl TableColumn {
    pub const ALL: [TableColumn; 6] = [
        TableColumn::Flag,
        TableColumn::Shipname,
        TableColumn::Distance,
        TableColumn::Speed,
        TableColumn::Type,
        TableColumn::LastSignal,
    ];

    pub fn title(self) -> &'static str {
        match self {
            TableColumn::Flag => "Flag",
            TableColumn::Shipname => "Name",
            TableColumn::Distance => "Dist",
            TableColumn::Speed => "Speed",
            TableColumn::Type => "Type",
            TableColumn::LastSignal => "Last",
        }
    }

    fn is_numeric(self) -> bool {
        !matches!(self, TableColumn::Flag | TableColumn::Shipname)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Numeric column comparator as the viewer has always applied it, before
/// the order is applied. A missing value compares as "after" the other one
/// in ascending order and "before" in descending order, including when both
/// are missing, so the relation is not an order over missing values. After
/// the descending flip this keeps missing values last in both directions.
pub fn compare_number(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    let missing_after = match order {
        SortOrder::Ascending => Ordering::Greater,
        SortOrder::Descending => Ordering::Less,
    };
    match (a, b) {
        (None, _) => missing_after,
        (_, None) => missing_after.reverse(),
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Case-insensitive text comparison; missing text sorts after present text.
pub fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

fn numeric_key(record: &VesselRecord, column: TableColumn) -> Option<f64> {
    match column {
        TableColumn::Distance => record.distance,
        TableColumn::Speed => record.kinematics.speed,
        TableColumn::Type => Some(record.classification.shipclass.code() as f64),
        TableColumn::LastSignal => record.last_signal.map(|s| s as f64),
        TableColumn::Flag | TableColumn::Shipname => None,
    }
}

fn text_key(record: &VesselRecord, column: TableColumn) -> Option<&str> {
    match column {
        TableColumn::Flag => record.identity.country.as_deref(),
        _ => record.identity.name.as_deref(),
    }
}

fn apply_order(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub mmsi: Mmsi,
    pub country: Option<String>,
    pub name: String,
    /// Distance with a repeat marker for relayed messages.
    pub distance: Option<String>,
    pub speed: Option<String>,
    pub ship_type: &'static str,
    pub last_signal: Option<String>,
}

impl TableRow {
    fn from_record(record: &VesselRecord, system: MeasurementSystem) -> Self {
        let repeated = if record.quality.repeat > 0 { " (R)" } else { "" };
        Self {
            mmsi: record.mmsi,
            country: record.identity.country.clone(),
            name: record.display_name(),
            distance: record
                .distance
                .map(|nm| format!("{}{}", system.format_distance_nm(nm), repeated)),
            speed: record.kinematics.speed.map(|kn| system.format_speed_kn(kn)),
            ship_type: record.classification.shipclass.label(),
            last_signal: record.last_signal.map(format_age),
        }
    }
}

/// Sorted, filtered rows for the side table.
///
/// `query` matches case-insensitively against the name, or the mmsi for
/// unnamed vessels.
pub fn build_table(
    registry: &VesselRegistry,
    column: TableColumn,
    order: SortOrder,
    query: &str,
    system: MeasurementSystem,
) -> Vec<TableRow> {
    let query = query.trim().to_lowercase();
    let mut records: Vec<&VesselRecord> = registry
        .all()
        .filter(|record| query.is_empty() || record.display_name().to_lowercase().contains(&query))
        .collect();

    if column.is_numeric() {
        // rows without a value go last whatever the order
        let (mut present, mut missing): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|record| numeric_key(record, column).is_some());
        present.sort_by(|a, b| {
            let ordering = compare_number(numeric_key(a, column), numeric_key(b, column), order);
            apply_order(ordering, order).then(a.mmsi.cmp(&b.mmsi))
        });
        missing.sort_by_key(|record| record.mmsi);
        present.extend(missing);
        records = present;
    } else {
        records.sort_by(|a, b| {
            let ordering = compare_text(text_key(a, column), text_key(b, column));
            apply_order(ordering, order).then(a.mmsi.cmp(&b.mmsi))
        });
    }

    records
        .into_iter()
        .take(TABLE_ROW_LIMIT)
        .map(|record| TableRow::from_record(record, system))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel(mmsi: Mmsi, name: Option<&str>, speed: Option<f64>) -> VesselRecord {
        let mut record = VesselRecord::new(mmsi);
        record.identity.name = name.map(str::to_string);
        record.kinematics.speed = speed;
        record
    }

    fn registry() -> VesselRegistry {
        let mut registry = VesselRegistry::new();
        registry.replace(vec![
            vessel(1, Some("bravo"), Some(12.0)),
            vessel(2, Some("Alpha"), None),
            vessel(3, None, Some(3.0)),
            vessel(4, Some("charlie"), Some(20.0)),
        ]);
        registry
    }

    fn ids(rows: &[TableRow]) -> Vec<Mmsi> {
        rows.iter().map(|row| row.mmsi).collect()
    }

    #[test]
    fn numeric_comparator_keeps_its_null_asymmetry() {
        use Ordering::*;
        assert_eq!(compare_number(None, None, SortOrder::Ascending), Greater);
        assert_eq!(compare_number(None, Some(1.0), SortOrder::Ascending), Greater);
        assert_eq!(compare_number(Some(1.0), None, SortOrder::Ascending), Less);
        assert_eq!(compare_number(None, None, SortOrder::Descending), Less);
        assert_eq!(compare_number(Some(2.0), Some(1.0), SortOrder::Descending), Greater);
    }

    #[test]
    fn missing_numbers_sort_last_in_both_orders() {
        let registry = registry();
        let system = MeasurementSystem::Nautical;
        let asc = build_table(&registry, TableColumn::Speed, SortOrder::Ascending, "", system);
        assert_eq!(ids(&asc), vec![3, 1, 4, 2]);
        let desc = build_table(&registry, TableColumn::Speed, SortOrder::Descending, "", system);
        assert_eq!(ids(&desc), vec![4, 1, 3, 2]);
    }

    #[test]
    fn names_sort_case_insensitively_with_unnamed_last() {
        let registry = registry();
        let rows = build_table(
            &registry,
            TableColumn::Shipname,
            SortOrder::Ascending,
            "",
            MeasurementSystem::Nautical,
        );
        assert_eq!(ids(&rows), vec![2, 1, 4, 3]);
        assert_eq!(rows[3].name, "3");
    }

    #[test]
    fn search_and_row_limit() {
        let registry = registry();
        let rows = build_table(
            &registry,
            TableColumn::Shipname,
            SortOrder::Ascending,
            "AR",
            MeasurementSystem::Metric,
        );
        assert_eq!(ids(&rows), vec![4]);
        assert_eq!(rows[0].speed.as_deref(), Some("37.0"));

        let mut big = VesselRegistry::new();
        big.replace((1..=300).map(|id| vessel(id, None, None)).collect());
        let rows = build_table(
            &big,
            TableColumn::Distance,
            SortOrder::Ascending,
            "",
            MeasurementSystem::Nautical,
        );
        assert_eq!(rows.len(), TABLE_ROW_LIMIT);
    }

    #[test]
    fn relayed_distance_is_marked() {
        let mut record = vessel(9, None, None);
        record.distance = Some(10.0);
        record.quality.repeat = 1;
        record.last_signal = Some(61);
        let row = TableRow::from_record(&record, MeasurementSystem::Nautical);
        assert_eq!(row.distance.as_deref(), Some("10.0 (R)"));
        assert_eq!(row.last_signal.as_deref(), Some("1m 1s"));
    }
}

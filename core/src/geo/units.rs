use serde::{Deserialize, Serialize};

/// Units shown to the operator. Internal values stay in nautical miles,
/// knots and meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeasurementSystem {
    #[default]
    #[serde(rename = "DEFAULT")]
    Nautical,
    #[serde(rename = "SI")]
    Metric,
    #[serde(rename = "IMPERIAL")]
    Imperial,
}

impl MeasurementSystem {
    pub fn distance_from_nm(self, nm: f64) -> f64 {
        match self {
            MeasurementSystem::Nautical => nm,
            MeasurementSystem::Metric => nm * 1.852,
            MeasurementSystem::Imperial => nm * 1.15078,
        }
    }

    pub fn distance_unit(self) -> &'static str {
        match self {
            MeasurementSystem::Nautical => "nmi",
            MeasurementSystem::Metric => "km",
            MeasurementSystem::Imperial => "mi",
        }
    }

    pub fn speed_from_kn(self, kn: f64) -> f64 {
        match self {
            MeasurementSystem::Nautical => kn,
            MeasurementSystem::Metric => kn * 1.852,
            MeasurementSystem::Imperial => kn * 1.151,
        }
    }

    pub fn speed_unit(self) -> &'static str {
        match self {
            MeasurementSystem::Nautical => "kts",
            MeasurementSystem::Metric => "km/h",
            MeasurementSystem::Imperial => "mph",
        }
    }

    /// Meters per displayed distance unit, scaled by 1000 for ring radii.
    pub fn ring_factor(self) -> f64 {
        match self {
            MeasurementSystem::Nautical => 1.852,
            MeasurementSystem::Metric => 1.0,
            MeasurementSystem::Imperial => 1.609344,
        }
    }

    pub fn format_distance_nm(self, nm: f64) -> String {
        format!("{:.1}", self.distance_from_nm(nm))
    }

    pub fn format_speed_kn(self, kn: f64) -> String {
        format!("{:.1}", self.speed_from_kn(kn))
    }
}

/// Age as `1d 2h 3m 4s`, leading zero units omitted.
pub fn format_age(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || hours > 0 || days > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(MeasurementSystem::Metric.format_distance_nm(10.0), "18.5");
        assert_eq!(MeasurementSystem::Imperial.format_speed_kn(10.0), "11.5");
        assert_eq!(MeasurementSystem::Nautical.speed_unit(), "kts");
        let parsed: MeasurementSystem = serde_json::from_str("\"SI\"").unwrap();
        assert_eq!(parsed, MeasurementSystem::Metric);
    }

    #[test]
    fn ages() {
        assert_eq!(format_age(0), "0s");
        assert_eq!(format_age(59), "59s");
        assert_eq!(format_age(120), "2m");
        assert_eq!(format_age(3605), "1h 0m 5s");
        assert_eq!(format_age(90_061), "1d 1h 1m 1s");
    }
}

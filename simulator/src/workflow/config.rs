use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use vesselcore::LatLon;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub lat: f64,
    pub lon: f64,
    pub mmsi: Option<u32>,
    /// When off, snapshots carry no station object.
    pub share_location: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            lat: 51.95,
            lon: 4.10,
            mmsi: Some(2_442_000),
            share_location: true,
        }
    }
}

impl StationConfig {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Synthetic fleet and feed parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub station: StationConfig,
    pub vessels: usize,
    pub seed: u64,
    pub tick_ms: u64,
    /// Vessels are spawned within this distance of the station.
    pub spawn_radius_nm: f64,
    pub path_cap: usize,
    /// Chance per tick that a heard vessel goes silent.
    pub dropout: f64,
    /// Chance per tick that a silent vessel is heard again.
    pub reappear: f64,
    /// Seconds a silent vessel stays in the snapshot.
    pub linger_s: u64,
    pub sectors: usize,
    pub class_b_share: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            station: StationConfig::default(),
            vessels: 40,
            seed: 7,
            tick_ms: 1000,
            spawn_radius_nm: 20.0,
            path_cap: 400,
            dropout: 0.01,
            reappear: 0.05,
            linger_s: 30,
            sectors: 72,
            class_b_share: 0.3,
        }
    }
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(vessels: usize, seed: u64) -> Self {
        Self {
            vessels,
            seed,
            ..Default::default()
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(50))
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.station.position().is_valid_fix(),
            "station position {}, {} is not a valid fix",
            self.station.lat,
            self.station.lon
        );
        anyhow::ensure!(self.sectors > 0, "sectors must be positive");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.dropout) && (0.0..=1.0).contains(&self.reappear),
            "dropout and reappear are probabilities"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.class_b_share),
            "class_b_share is a fraction"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_defaults() {
        let cfg = ScenarioConfig::from_args(12, 3);
        assert_eq!(cfg.vessels, 12);
        assert_eq!(cfg.seed, 3);
        assert_eq!(cfg.tick(), Duration::from_millis(1000));
        assert!(cfg.station.share_location);
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"vessels: 5\nstation:\n  lat: 60.1\n  lon: 24.9\n  share_location: false\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = ScenarioConfig::load(&path).unwrap();
        assert_eq!(cfg.vessels, 5);
        assert_eq!(cfg.station.lat, 60.1);
        assert!(!cfg.station.share_location);
        assert_eq!(cfg.sectors, 72);
    }

    #[test]
    fn config_load_rejects_bad_probabilities() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"dropout: 2.0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(ScenarioConfig::load(&path).is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vesselcore::{LatLon, ViewSettings};

/// Quiet period before an edited configuration is written back.
pub const SAVE_DELAY: Duration = Duration::from_millis(1000);

/// Client configuration persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub feed_url: String,
    pub center: LatLon,
    pub zoom: f64,
    pub view: ViewSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            feed_url: "http://127.0.0.1:8100".into(),
            center: LatLon::new(51.95, 4.10),
            zoom: 10.0,
            view: ViewSettings::default(),
        }
    }
}

/// `VESSELMAP_CONFIG`, else `vesselmap.yaml` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var_os("VESSELMAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("vesselmap.yaml"))
}

/// A missing file yields the defaults.
pub fn load(path: &Path) -> Result<ViewerConfig, String> {
    if !path.exists() {
        return Ok(ViewerConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|err| format!("reading {}: {}", path.display(), err))?;
    serde_yaml::from_str(&contents).map_err(|err| format!("parsing {}: {}", path.display(), err))
}

pub async fn save(path: PathBuf, config: ViewerConfig) -> Result<(), String> {
    let contents = serde_yaml::to_string(&config).map_err(|err| err.to_string())?;
    tokio::fs::write(&path, contents)
        .await
        .map_err(|err| format!("writing {}: {}", path.display(), err))
}

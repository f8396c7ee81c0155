use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::chart::ChartConfig;
use crate::state::DatasetSource;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "DATASET_EXPLORER_CONFIG";
/// Config file looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "dataset-explorer.json";
/// California Housing table looked up relative to the working directory.
pub const DEFAULT_HOUSING_FILE: &str = "data/cal_housing.data";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Startup settings. Every field is optional in the file.
///
/// ```json
/// { "initial_source": "Iris", "preview_rows": 500, "histogram_bins": 20 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window_size: [f32; 2],
    pub initial_source: DatasetSource,
    /// Maximum rows drawn in each data table. `None` shows every row.
    pub preview_rows: Option<usize>,
    /// Fixed histogram bin count. `None` picks one from the data.
    pub histogram_bins: Option<usize>,
    /// Points on the density curve overlaid on histograms.
    pub density_points: usize,
    /// Location of the California Housing table: StatLib's
    /// `cal_housing.data`, or a CSV with the derived columns.
    pub housing_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_size: [1280.0, 860.0],
            initial_source: DatasetSource::Upload,
            preview_rows: Some(1000),
            histogram_bins: None,
            density_points: 200,
            housing_path: PathBuf::from(DEFAULT_HOUSING_FILE),
        }
    }
}

impl ViewerConfig {
    /// Load from `$DATASET_EXPLORER_CONFIG`, else `./dataset-explorer.json`,
    /// else defaults. A broken file is logged and ignored.
    pub fn load() -> Self {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn chart_config(&self) -> ChartConfig {
        ChartConfig {
            histogram_bins: self.histogram_bins.filter(|&n| n > 0),
            density_points: self.density_points.max(2),
        }
    }
}

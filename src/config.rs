use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analyzers::density::{
    DEFAULT_CELL_SIZE_M, DEFAULT_DENSITY_BANDWIDTH_M, DEFAULT_MAX_CELLS, DensityOptions,
};
use crate::analyzers::hotspot::{
    DEFAULT_HOTSPOT_BANDWIDTH_M, DEFAULT_SIGNIFICANCE_Z, HotspotOptions,
};
use crate::geo::BoundingBox;
use crate::analyzers::plan::DEFAULT_MAX_OPS;

/// Tunables for an analysis run. Every field is optional in the JSON file:
///
/// ```json
/// {
///   "hotspot_bandwidth_m": 500,
///   "significance_z": 1.96,
///   "max_ops": 5000000,
///   "time_budget_ms": 30000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub hotspot_bandwidth_m: f64,
    pub significance_z: f64,
    pub density_bandwidth_m: f64,
    pub density_cell_size_m: f64,
    pub max_cells: usize,
    pub normalize: bool,
    pub max_ops: usize,
    pub time_budget_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hotspot_bandwidth_m: DEFAULT_HOTSPOT_BANDWIDTH_M,
            significance_z: DEFAULT_SIGNIFICANCE_Z,
            density_bandwidth_m: DEFAULT_DENSITY_BANDWIDTH_M,
            density_cell_size_m: DEFAULT_CELL_SIZE_M,
            max_cells: DEFAULT_MAX_CELLS,
            normalize: true,
            max_ops: DEFAULT_MAX_OPS,
            time_budget_ms: 30_000,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config =
            serde_json::from_str(&content).with_context(|| format!("parsing config {path}"))?;
        Ok(config)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn hotspot_options(&self) -> HotspotOptions {
        HotspotOptions {
            bandwidth_meters: self.hotspot_bandwidth_m,
            significance_z: self.significance_z,
        }
    }

    /// Density options over `bbox`, or the padded point extent when `None`.
    pub fn density_options(&self, bbox: Option<BoundingBox>) -> DensityOptions {
        DensityOptions {
            bandwidth_meters: self.density_bandwidth_m,
            cell_size_meters: self.density_cell_size_m,
            bbox,
            normalize: self.normalize,
            max_cells: self.max_cells,
        }
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

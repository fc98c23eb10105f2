//! Configuration options for a sweep.
//!
//! [`LooperConfig`] can be built in code with the `with_*` methods or loaded
//! from JSON using the keys of the sweep scripts:
//!
//! ```json
//! {
//!     "show_progress": true,
//!     "file_path_prefix": "data/v1.0/3.4a",
//!     "grad": false,
//!     "X": { "var": "delta", "min": -0.5, "max": 0.5, "dim": 1001 },
//!     "Y": { "var": "P_lc", "val": [1e-3, 1e-2, 1e-1] }
//! }
//! ```
//!
//! Axis blocks are validated into [`AxisSpec`]s while loading, so a malformed
//! configuration is rejected before any evaluation.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::axis::{AxisConfig, AxisRole, AxisSpec};
use crate::error::{LooperError, Result};

/// Configuration of one sweep.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawLooperConfig")]
pub struct LooperConfig {
    /// Log progress while sweeping. Default: false
    pub show_progress: bool,

    /// Load and store results through a cache. Default: true
    pub cache: bool,

    /// Cache file prefix; entries are written to `<prefix>_<key>.json`.
    /// Without a prefix results are cached in memory. Default: None
    pub file_path_prefix: Option<PathBuf>,

    /// Also compute the derivative along X. Default: false
    pub grad: bool,

    /// Evaluate outer-axis blocks on a worker pool. Default: false
    pub parallel: bool,

    /// Worker count for parallel sweeps. Default: available parallelism
    pub num_workers: Option<usize>,

    /// Innermost axis, required
    pub x: Option<AxisSpec>,

    /// Middle axis
    pub y: Option<AxisSpec>,

    /// Outermost axis, requires `y`
    pub z: Option<AxisSpec>,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            show_progress: false,
            cache: true,
            file_path_prefix: None,
            grad: false,
            parallel: false,
            num_workers: None,
            x: None,
            y: None,
            z: None,
        }
    }
}

impl LooperConfig {
    /// Create a configuration sweeping a single X axis.
    pub fn new(x: AxisSpec) -> Self {
        Self::default().with_x(x)
    }

    pub fn with_x(mut self, axis: AxisSpec) -> Self {
        self.x = Some(axis);
        self
    }

    pub fn with_y(mut self, axis: AxisSpec) -> Self {
        self.y = Some(axis);
        self
    }

    pub fn with_z(mut self, axis: AxisSpec) -> Self {
        self.z = Some(axis);
        self
    }

    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_file_path_prefix<P: AsRef<Path>>(mut self, prefix: P) -> Self {
        self.file_path_prefix = Some(prefix.as_ref().to_path_buf());
        self
    }

    pub fn with_grad(mut self, grad: bool) -> Self {
        self.grad = grad;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = Some(num_workers);
        self
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawLooperConfig = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Load a configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// The axis playing `role`, if declared.
    pub fn axis(&self, role: AxisRole) -> Option<&AxisSpec> {
        match role {
            AxisRole::X => self.x.as_ref(),
            AxisRole::Y => self.y.as_ref(),
            AxisRole::Z => self.z.as_ref(),
        }
    }

    /// The declared axes in layout order, outermost first.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<AxisSpec>>` - `[X]`, `[Y, X]` or `[Z, Y, X]`
    pub fn axes(&self) -> Result<Vec<AxisSpec>> {
        let x = self
            .x
            .as_ref()
            .ok_or_else(|| LooperError::Config("A sweep needs an X axis".to_string()))?;

        match (&self.y, &self.z) {
            (None, None) => Ok(vec![x.clone()]),
            (Some(y), None) => Ok(vec![y.clone(), x.clone()]),
            (Some(y), Some(z)) => Ok(vec![z.clone(), y.clone(), x.clone()]),
            (None, Some(_)) => Err(LooperError::Config(
                "A Z axis requires a Y axis".to_string(),
            )),
        }
    }

    /// Check every setting without running anything.
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == Some(0) {
            return Err(LooperError::Config(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if let Some(prefix) = &self.file_path_prefix {
            if prefix.as_os_str().is_empty() {
                return Err(LooperError::Config(
                    "file_path_prefix must not be empty".to_string(),
                ));
            }
        }
        self.axes().map(|_| ())
    }
}

fn default_cache() -> bool {
    true
}

/// Sweep configuration as written in JSON.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLooperConfig {
    #[serde(default)]
    show_progress: bool,
    #[serde(default = "default_cache")]
    cache: bool,
    #[serde(default)]
    file_path_prefix: Option<PathBuf>,
    #[serde(default)]
    grad: bool,
    #[serde(default)]
    parallel: bool,
    #[serde(default)]
    num_workers: Option<usize>,
    #[serde(rename = "X", default)]
    x: Option<AxisConfig>,
    #[serde(rename = "Y", default)]
    y: Option<AxisConfig>,
    #[serde(rename = "Z", default)]
    z: Option<AxisConfig>,
}

impl TryFrom<RawLooperConfig> for LooperConfig {
    type Error = LooperError;

    fn try_from(raw: RawLooperConfig) -> Result<Self> {
        let config = Self {
            show_progress: raw.show_progress,
            cache: raw.cache,
            file_path_prefix: raw.file_path_prefix,
            grad: raw.grad,
            parallel: raw.parallel,
            num_workers: raw.num_workers,
            x: raw.x.map(AxisSpec::try_from).transpose()?,
            y: raw.y.map(AxisSpec::try_from).transpose()?,
            z: raw.z.map(AxisSpec::try_from).transpose()?,
        };
        config.validate()?;
        Ok(config)
    }
}

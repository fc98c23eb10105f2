//! Axis specification and value generation
//!
//! An axis is either an explicit list of values or a generated range. Both
//! forms are validated once, when the [`AxisSpec`] is constructed, and the
//! coordinate values are generated at the same time.
//!
//! Log-scaled ranges take the positive bounds themselves, not their
//! exponents: `(1e-3, 1e0, 4)` yields `1e-3, 1e-2, 1e-1, 1e0`.

use crate::error::{LooperError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spacing of a generated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Evenly spaced values between the bounds
    #[default]
    Linear,

    /// Evenly spaced in log10 space; both bounds must be positive
    Log,
}

impl FromStr for Scale {
    type Err = LooperError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Scale::Linear),
            "log" => Ok(Scale::Log),
            other => Err(LooperError::Config(format!(
                "Unsupported axis scale '{}', expected 'linear' or 'log'",
                other
            ))),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Linear => write!(f, "linear"),
            Scale::Log => write!(f, "log"),
        }
    }
}

/// The two ways of describing the values of an axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AxisValues {
    /// Values given one by one, swept in the given order
    Explicit(Vec<f64>),

    /// `count` values from `min` to `max` inclusive
    Range {
        min: f64,
        max: f64,
        count: usize,
        scale: Scale,
    },
}

impl AxisValues {
    fn validate(&self) -> Result<()> {
        match self {
            AxisValues::Explicit(values) => {
                if values.is_empty() {
                    return Err(LooperError::Config(
                        "Explicit axis values must not be empty".to_string(),
                    ));
                }
                if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                    return Err(LooperError::Config(format!(
                        "Explicit axis values must be finite, got {}",
                        bad
                    )));
                }
            }
            AxisValues::Range {
                min,
                max,
                count,
                scale,
            } => {
                if *count < 1 {
                    return Err(LooperError::Config(
                        "Axis range count must be at least 1".to_string(),
                    ));
                }
                if !min.is_finite() || !max.is_finite() {
                    return Err(LooperError::Config(format!(
                        "Axis range bounds must be finite, got ({}, {})",
                        min, max
                    )));
                }
                if *scale == Scale::Log && (*min <= 0.0 || *max <= 0.0) {
                    return Err(LooperError::Config(format!(
                        "Log-scaled axis bounds must be positive, got ({}, {})",
                        min, max
                    )));
                }
            }
        }
        Ok(())
    }

    /// Generate the coordinate values of the axis.
    ///
    /// Both bounds of a range are reproduced exactly.
    fn generate(&self) -> Vec<f64> {
        match self {
            AxisValues::Explicit(values) => values.clone(),
            AxisValues::Range {
                min,
                max,
                count,
                scale,
            } => {
                let (start, end) = match scale {
                    Scale::Linear => (*min, *max),
                    Scale::Log => (min.log10(), max.log10()),
                };
                let mut values: Vec<f64> = linspace(start, end, *count)
                    .into_iter()
                    .map(|v| match scale {
                        Scale::Linear => v,
                        Scale::Log => 10f64.powf(v),
                    })
                    .collect();

                values[0] = *min;
                if *count > 1 {
                    values[*count - 1] = *max;
                }
                values
            }
        }
    }
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![start];
    }
    let span = end - start;
    let steps = (count - 1) as f64;
    (0..count)
        .map(|i| start + span * (i as f64) / steps)
        .collect()
}

/// A validated sweep dimension.
///
/// `var` names the parameter the axis overrides. When `index` is set the
/// parameter must be a fixed-length vector and only that element is swept.
///
/// Serialized specs only carry the description; deserializing validates it
/// and regenerates the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AxisRecord", into = "AxisRecord")]
pub struct AxisSpec {
    var: String,
    values: AxisValues,
    index: Option<usize>,
    points: Vec<f64>,
}

impl AxisSpec {
    /// Create an axis from a validated [`AxisValues`].
    pub fn new(var: &str, values: AxisValues) -> Result<Self> {
        if var.is_empty() {
            return Err(LooperError::Config(
                "Axis parameter name must not be empty".to_string(),
            ));
        }
        values.validate()?;
        let points = values.generate();

        Ok(Self {
            var: var.to_string(),
            values,
            index: None,
            points,
        })
    }

    /// Create an axis sweeping an explicit list of values.
    ///
    /// # Examples
    ///
    /// ```
    /// use looper_rs::axis::AxisSpec;
    ///
    /// let axis = AxisSpec::explicit("P_lc", vec![1.5e-15, 1.0e-15]).unwrap();
    /// assert_eq!(axis.len(), 2);
    /// ```
    pub fn explicit(var: &str, values: Vec<f64>) -> Result<Self> {
        Self::new(var, AxisValues::Explicit(values))
    }

    /// Create an axis of `count` evenly spaced values from `min` to `max`.
    ///
    /// # Examples
    ///
    /// ```
    /// use looper_rs::axis::{AxisSpec, Scale};
    ///
    /// let axis = AxisSpec::range("kappa", 1e-3, 1e0, 4, Scale::Log).unwrap();
    /// assert_eq!(axis.len(), 4);
    /// assert_eq!(axis.values()[0], 1e-3);
    /// ```
    pub fn range(var: &str, min: f64, max: f64, count: usize, scale: Scale) -> Result<Self> {
        Self::new(
            var,
            AxisValues::Range {
                min,
                max,
                count,
                scale,
            },
        )
    }

    /// Target element `index` of a vector-valued parameter.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Name of the swept parameter
    pub fn var(&self) -> &str {
        &self.var
    }

    /// Vector element overridden by this axis, if any
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The description the values were generated from
    pub fn source(&self) -> &AxisValues {
        &self.values
    }

    /// Coordinate values in sweep order
    pub fn values(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AxisRecord {
    var: String,
    values: AxisValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
}

impl From<AxisSpec> for AxisRecord {
    fn from(spec: AxisSpec) -> Self {
        Self {
            var: spec.var,
            values: spec.values,
            index: spec.index,
        }
    }
}

impl TryFrom<AxisRecord> for AxisSpec {
    type Error = LooperError;

    fn try_from(record: AxisRecord) -> Result<Self> {
        let spec = AxisSpec::new(&record.var, record.values)?;
        Ok(match record.index {
            Some(index) => spec.with_index(index),
            None => spec,
        })
    }
}

/// Axis block as written in a sweep configuration.
///
/// Uses the key names of the sweep scripts (`var`, `val`, `min`, `max`,
/// `dim`, `scale`, `idx`) and is converted into an [`AxisSpec`] with
/// `TryFrom`, which rejects ambiguous or incomplete blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    pub var: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<usize>,
}

impl TryFrom<AxisConfig> for AxisSpec {
    type Error = LooperError;

    fn try_from(config: AxisConfig) -> Result<Self> {
        let has_range_keys = config.min.is_some() || config.max.is_some() || config.dim.is_some();

        let values = match (config.val, has_range_keys) {
            (Some(_), true) => {
                return Err(LooperError::Config(format!(
                    "Axis '{}' sets both 'val' and a 'min'/'max'/'dim' range",
                    config.var
                )))
            }
            (Some(values), false) => {
                if config.scale.is_some() {
                    return Err(LooperError::Config(format!(
                        "Axis '{}' sets 'scale' on an explicit value list",
                        config.var
                    )));
                }
                AxisValues::Explicit(values)
            }
            (None, _) => match (config.min, config.max, config.dim) {
                (Some(min), Some(max), Some(count)) => {
                    let scale = match config.scale.as_deref() {
                        Some(s) => s.parse()?,
                        None => Scale::default(),
                    };
                    AxisValues::Range {
                        min,
                        max,
                        count,
                        scale,
                    }
                }
                _ => {
                    return Err(LooperError::Config(format!(
                        "Axis '{}' needs either 'val' or all of 'min', 'max' and 'dim'",
                        config.var
                    )))
                }
            },
        };

        let spec = AxisSpec::new(&config.var, values)?;
        Ok(match config.idx {
            Some(index) => spec.with_index(index),
            None => spec,
        })
    }
}

//! Parameters collection implementation
//!
//! This module provides the Parameters struct, an ordered map of parameter
//! names to values. The ordering makes its serialization canonical, which is
//! what the cache keys are computed from.

use crate::error::{LooperError, Result};
use crate::parameters::parameter::ParamValue;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::fs;
use std::path::Path;

/// A named set of system parameters.
///
/// The base parameters of a sweep are never modified by the engine: each
/// grid point receives its own materialized copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: BTreeMap<String, ParamValue>,
}

impl Parameters {
    /// Create a new empty parameters collection
    ///
    /// # Examples
    ///
    /// ```
    /// use looper_rs::parameters::Parameters;
    ///
    /// let params = Parameters::new();
    /// assert_eq!(params.len(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Add a parameter, consuming and returning the collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use looper_rs::parameters::Parameters;
    ///
    /// let params = Parameters::new()
    ///     .with("kappa_norm", 0.15)
    ///     .with("gammas", vec![0.1, 1e-6, 1e-2])
    ///     .with("t_oss_method", "cubic");
    /// assert_eq!(params.len(), 3);
    /// assert_eq!(params.scalar("kappa_norm").unwrap(), 0.15);
    /// ```
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a parameter, returning the previous value if there was one.
    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.values.insert(name.to_string(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ParamValue> {
        self.values.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the parameters in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.values.iter()
    }

    fn require(&self, name: &str) -> Result<&ParamValue> {
        self.values
            .get(name)
            .ok_or_else(|| LooperError::Parameter(format!("Parameter '{}' not found", name)))
    }

    /// Value of a scalar parameter.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        let value = self.require(name)?;
        value.as_scalar().ok_or_else(|| {
            LooperError::Parameter(format!(
                "Parameter '{}' is a {}, not a scalar",
                name,
                value.kind()
            ))
        })
    }

    /// Elements of a vector parameter.
    pub fn vector(&self, name: &str) -> Result<&[f64]> {
        let value = self.require(name)?;
        value.as_vector().ok_or_else(|| {
            LooperError::Parameter(format!(
                "Parameter '{}' is a {}, not a vector",
                name,
                value.kind()
            ))
        })
    }

    /// Value of a string parameter.
    pub fn text(&self, name: &str) -> Result<&str> {
        let value = self.require(name)?;
        value.as_text().ok_or_else(|| {
            LooperError::Parameter(format!(
                "Parameter '{}' is a {}, not text",
                name,
                value.kind()
            ))
        })
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(json)
    }

    /// Parse from a JSON object of name/value pairs
    pub fn from_json(json: &str) -> Result<Self> {
        let params = serde_json::from_str(json)?;
        Ok(params)
    }

    /// Load parameters from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

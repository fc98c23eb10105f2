//! # Result cache
//!
//! Completed sweeps are stored under a content-addressed [`CacheKey`]: the
//! SHA-256 of a canonical JSON serialization of the cache format version,
//! the identity of the swept function, the axes, the base parameters and the
//! gradient flag. Any change to one of those misses the cache instead of
//! returning stale data.
//!
//! Base parameter values are written as the hex of their little-endian bits,
//! so infinities and NaN payloads keep distinct keys and survive a round trip
//! through a file entry.
//!
//! A cache is an optimization only. Stores report failures to the caller,
//! which logs them; loads never fail, an unreadable, corrupted or outdated
//! entry is simply a miss.

pub mod file;
pub mod memory;

pub use file::FileCacheStore;
pub use memory::MemoryCacheStore;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::axis::AxisSpec;
use crate::error::{LooperError, Result};
use crate::parameters::Parameters;
use crate::results::{ResultTensor, TensorRecord};

/// Version of the cache entry format. Bumping it invalidates every entry.
pub const CACHE_FORMAT_VERSION: u32 = 2;

/// Storage for completed sweep results.
pub trait CacheStore: Send + Sync {
    /// Look up the tensor stored under `key`.
    ///
    /// Returns `None` on a miss, including unreadable or outdated entries.
    fn load(&self, key: &CacheKey) -> Option<ResultTensor>;

    /// Persist a complete entry, replacing any previous one with the same key.
    fn store(&self, entry: CacheEntry) -> Result<()>;

    /// Remove the entry stored under `key`, if any.
    fn invalidate(&self, key: &CacheKey) -> Result<()>;
}

/// Hex-encoded SHA-256 identifying one sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key of a sweep.
    pub fn derive(signature: &SweepSignature<'_>) -> Result<Self> {
        let canonical = serde_json::to_vec(signature)?;
        let digest = Sha256::digest(&canonical);
        Ok(Self(hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a cached result depends on.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSignature<'a> {
    pub format_version: u32,
    pub function: &'a str,
    pub axes: &'a [AxisSpec],
    #[serde(serialize_with = "parameter_bits::serialize")]
    pub base_parameters: &'a Parameters,
    pub grad: bool,
}

impl<'a> SweepSignature<'a> {
    pub fn new(
        function: &'a str,
        axes: &'a [AxisSpec],
        base_parameters: &'a Parameters,
        grad: bool,
    ) -> Self {
        Self {
            format_version: CACHE_FORMAT_VERSION,
            function,
            axes,
            base_parameters,
            grad,
        }
    }
}

/// A persisted sweep result together with what it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    format_version: u32,
    key: CacheKey,
    function: String,
    axes: Vec<AxisSpec>,
    #[serde(with = "parameter_bits")]
    base_parameters: Parameters,
    grad: bool,
    result: TensorRecord,
}

impl CacheEntry {
    pub fn new(key: CacheKey, signature: &SweepSignature<'_>, tensor: &ResultTensor) -> Self {
        Self {
            format_version: signature.format_version,
            key,
            function: signature.function.to_string(),
            axes: signature.axes.to_vec(),
            base_parameters: signature.base_parameters.clone(),
            grad: signature.grad,
            result: tensor.to_record(),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    pub fn base_parameters(&self) -> &Parameters {
        &self.base_parameters
    }

    /// Decode the stored tensor if the entry matches `key` and the current format.
    pub fn into_tensor(self, key: &CacheKey) -> Result<ResultTensor> {
        if self.format_version != CACHE_FORMAT_VERSION {
            return Err(LooperError::Cache(format!(
                "Entry has format version {}, expected {}",
                self.format_version, CACHE_FORMAT_VERSION
            )));
        }
        if &self.key != key {
            return Err(LooperError::Cache(format!(
                "Entry key {} does not match requested key {}",
                self.key, key
            )));
        }
        ResultTensor::from_record(self.result)
    }
}

/// Bit-exact serialization of parameter values.
mod parameter_bits {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    use crate::parameters::{ParamValue, Parameters};

    #[derive(Serialize, Deserialize)]
    #[serde(tag = "kind", content = "value", rename_all = "lowercase")]
    enum ValueRecord {
        Scalar(String),
        Vector(String),
        Text(String),
    }

    fn encode(values: &[f64]) -> String {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        hex::encode(bytes)
    }

    fn decode(data: &str) -> std::result::Result<Vec<f64>, String> {
        let bytes = hex::decode(data).map_err(|e| e.to_string())?;
        if bytes.len() % 8 != 0 {
            return Err(format!("{} bytes is not a whole number of f64 values", bytes.len()));
        }
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                f64::from_le_bytes(buf)
            })
            .collect())
    }

    pub fn serialize<S>(params: &Parameters, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let records: BTreeMap<&str, ValueRecord> = params
            .iter()
            .map(|(name, value)| {
                let record = match value {
                    ParamValue::Scalar(v) => ValueRecord::Scalar(encode(&[*v])),
                    ParamValue::Vector(v) => ValueRecord::Vector(encode(v)),
                    ParamValue::Text(s) => ValueRecord::Text(s.clone()),
                };
                (name.as_str(), record)
            })
            .collect();
        records.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Parameters, D::Error>
    where
        D: Deserializer<'de>,
    {
        let records = BTreeMap::<String, ValueRecord>::deserialize(deserializer)?;
        let mut params = Parameters::new();
        for (name, record) in records {
            let value = match record {
                ValueRecord::Scalar(data) => {
                    let values = decode(&data).map_err(D::Error::custom)?;
                    if values.len() != 1 {
                        return Err(D::Error::custom(format!(
                            "Scalar parameter '{}' holds {} values",
                            name,
                            values.len()
                        )));
                    }
                    ParamValue::Scalar(values[0])
                }
                ValueRecord::Vector(data) => {
                    ParamValue::Vector(decode(&data).map_err(D::Error::custom)?)
                }
                ValueRecord::Text(s) => ParamValue::Text(s),
            };
            params.insert(&name, value);
        }
        Ok(params)
    }
}

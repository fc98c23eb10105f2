//! Parameter values
//!
//! System parameters handed to a swept function are scalars, strings
//! (model switches such as `"cubic"`), or fixed-length vectors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value of a single named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A real number
    Scalar(f64),

    /// A fixed-length vector whose elements can be swept individually
    Vector(Vec<f64>),

    /// A string option
    Text(String),
}

impl ParamValue {
    /// Short name of the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Scalar(_) => "scalar",
            ParamValue::Vector(_) => "vector",
            ParamValue::Text(_) => "text",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            ParamValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Scalar(f64::from(v))
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::Vector(v)
    }
}

impl From<&[f64]> for ParamValue {
    fn from(v: &[f64]) -> Self {
        ParamValue::Vector(v.to_vec())
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(v) => write!(f, "{}", v),
            ParamValue::Vector(v) => write!(f, "{:?}", v),
            ParamValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

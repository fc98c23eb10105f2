//! The value returned by one evaluation of the swept function.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Output of a single evaluation: a scalar (shape `()`) or a fixed-length
/// vector (shape `(m,)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Output {
    /// Shape of this output within the result tensor.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Output::Scalar(_) => Vec::new(),
            Output::Vector(v) => vec![v.len()],
        }
    }

    /// The output's numbers in row-major order.
    pub fn values(&self) -> &[f64] {
        match self {
            Output::Scalar(v) => std::slice::from_ref(v),
            Output::Vector(v) => v,
        }
    }
}

impl From<f64> for Output {
    fn from(v: f64) -> Self {
        Output::Scalar(v)
    }
}

impl From<Vec<f64>> for Output {
    fn from(v: Vec<f64>) -> Self {
        Output::Vector(v)
    }
}

impl<const N: usize> From<[f64; N]> for Output {
    fn from(v: [f64; N]) -> Self {
        Output::Vector(v.to_vec())
    }
}

impl From<Array1<f64>> for Output {
    fn from(v: Array1<f64>) -> Self {
        Output::Vector(v.to_vec())
    }
}

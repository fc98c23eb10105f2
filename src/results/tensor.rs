//! Result tensor assembly and reductions
//!
//! A result tensor has shape `(sweep shape..., output shape...)`. The sweep
//! part follows the grid layout, outermost axis first; the output part is
//! empty for scalar outputs and `(m,)` for vector outputs.

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{LooperError, Result};
use crate::results::output::Output;

/// Reduction applied along one sweep axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Min,
    Max,
    Mean,
}

/// Shape-consistent results of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTensor {
    data: ArrayD<f64>,
    sweep_ndim: usize,
}

impl ResultTensor {
    /// Wrap an array whose leading `sweep_ndim` axes are sweep axes.
    pub fn from_array(data: ArrayD<f64>, sweep_ndim: usize) -> Result<Self> {
        if sweep_ndim > data.ndim() {
            return Err(LooperError::Shape(format!(
                "Array of dimension {} cannot hold {} sweep axes",
                data.ndim(),
                sweep_ndim
            )));
        }
        Ok(Self { data, sweep_ndim })
    }

    /// Assemble per-point outputs, given in grid order, into a tensor.
    ///
    /// Every output must have the same shape as the first one.
    ///
    /// # Examples
    ///
    /// ```
    /// use looper_rs::results::{Output, ResultTensor};
    ///
    /// let raw = vec![Output::Vector(vec![1.0, 2.0]), Output::Vector(vec![3.0, 4.0])];
    /// let tensor = ResultTensor::aggregate(raw, &[2]).unwrap();
    /// assert_eq!(tensor.shape(), &[2, 2]);
    ///
    /// let mixed = vec![Output::Scalar(1.0), Output::Vector(vec![2.0, 3.0])];
    /// assert!(ResultTensor::aggregate(mixed, &[2]).is_err());
    /// ```
    pub fn aggregate(raw: Vec<Output>, grid_shape: &[usize]) -> Result<Self> {
        let expected: usize = grid_shape.iter().product();
        if raw.len() != expected {
            return Err(LooperError::Shape(format!(
                "Got {} outputs for a grid of {} points",
                raw.len(),
                expected
            )));
        }

        let output_shape = raw
            .first()
            .map(Output::shape)
            .ok_or_else(|| LooperError::Shape("Cannot aggregate an empty sweep".to_string()))?;

        let mut data = Vec::with_capacity(raw.len() * output_shape.iter().product::<usize>());
        for (i, output) in raw.iter().enumerate() {
            let shape = output.shape();
            if shape != output_shape {
                return Err(LooperError::Shape(format!(
                    "Grid point {} produced an output of shape {:?}, expected {:?}",
                    i, shape, output_shape
                )));
            }
            data.extend_from_slice(output.values());
        }

        let mut shape = grid_shape.to_vec();
        shape.extend_from_slice(&output_shape);
        let data = ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| LooperError::Shape(e.to_string()))?;

        Ok(Self {
            data,
            sweep_ndim: grid_shape.len(),
        })
    }

    /// Full shape, sweep axes first.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn sweep_ndim(&self) -> usize {
        self.sweep_ndim
    }

    pub fn sweep_shape(&self) -> &[usize] {
        &self.data.shape()[..self.sweep_ndim]
    }

    /// Shape of a single evaluation's output.
    pub fn output_shape(&self) -> &[usize] {
        &self.data.shape()[self.sweep_ndim..]
    }

    pub fn view(&self) -> ArrayViewD<'_, f64> {
        self.data.view()
    }

    pub fn as_array(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn into_array(self) -> ArrayD<f64> {
        self.data
    }

    /// Element at a full index (sweep indices then output indices).
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.data.get(index).copied()
    }

    fn check_sweep_axis(&self, axis: usize) -> Result<Axis> {
        if axis >= self.sweep_ndim {
            return Err(LooperError::Config(format!(
                "Axis {} is not a sweep axis of a {}-axis result",
                axis, self.sweep_ndim
            )));
        }
        Ok(Axis(axis))
    }

    /// Collapse sweep axis `axis` with the given reduction.
    ///
    /// NaN entries are ignored by `Min` and `Max`.
    pub fn reduce(&self, axis: usize, op: Reduction) -> Result<ResultTensor> {
        let ax = self.check_sweep_axis(axis)?;
        let data = match op {
            Reduction::Min => self
                .data
                .map_axis(ax, |lane| lane.iter().copied().fold(f64::NAN, f64::min)),
            Reduction::Max => self
                .data
                .map_axis(ax, |lane| lane.iter().copied().fold(f64::NAN, f64::max)),
            Reduction::Mean => self
                .data
                .mean_axis(ax)
                .ok_or_else(|| LooperError::Shape(format!("Axis {} is empty", axis)))?,
        };

        Ok(Self {
            data,
            sweep_ndim: self.sweep_ndim - 1,
        })
    }

    /// Index along sweep axis `axis` at which the minimum or maximum occurs.
    ///
    /// Ties resolve to the first index; NaN entries are skipped.
    pub fn argreduce(&self, axis: usize, op: Reduction) -> Result<ArrayD<usize>> {
        let ax = self.check_sweep_axis(axis)?;
        let better: fn(f64, f64) -> bool = match op {
            Reduction::Min => |v, best| v < best,
            Reduction::Max => |v, best| v > best,
            Reduction::Mean => {
                return Err(LooperError::Config(
                    "argreduce supports only Min and Max".to_string(),
                ))
            }
        };

        Ok(self.data.map_axis(ax, |lane| {
            let mut best: Option<(usize, f64)> = None;
            for (i, &v) in lane.iter().enumerate() {
                if v.is_nan() {
                    continue;
                }
                match best {
                    Some((_, b)) if !better(v, b) => {}
                    _ => best = Some((i, v)),
                }
            }
            best.map(|(i, _)| i).unwrap_or(0)
        }))
    }

    pub(crate) fn to_record(&self) -> TensorRecord {
        let bytes: Vec<u8> = self.data.iter().flat_map(|v| v.to_le_bytes()).collect();
        TensorRecord {
            shape: self.data.shape().to_vec(),
            sweep_ndim: self.sweep_ndim,
            data: hex::encode(bytes),
        }
    }

    pub(crate) fn from_record(record: TensorRecord) -> Result<Self> {
        let bytes = hex::decode(&record.data)
            .map_err(|e| LooperError::Cache(format!("Undecodable tensor data: {}", e)))?;
        if bytes.len() % 8 != 0 {
            return Err(LooperError::Cache(format!(
                "Tensor data has {} bytes, not a whole number of f64 values",
                bytes.len()
            )));
        }
        let values: Vec<f64> = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();

        let data = ArrayD::from_shape_vec(IxDyn(&record.shape), values)
            .map_err(|e| LooperError::Cache(format!("Tensor shape mismatch: {}", e)))?;
        Self::from_array(data, record.sweep_ndim)
    }
}

/// Serialized form of a result tensor.
///
/// Values are stored as little-endian f64 bytes in hex so NaN and infinities
/// survive a JSON round trip bit for bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TensorRecord {
    pub shape: Vec<usize>,
    pub sweep_ndim: usize,
    pub data: String,
}

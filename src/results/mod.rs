//! # Sweep results
//!
//! [`ResultTensor`] holds one output per grid point in a regular array and
//! [`LooperResults`] pairs it with the coordinates of each sweep axis. That
//! pair is everything downstream reduction and plotting code needs.

pub mod output;
pub mod tensor;

pub use output::Output;
pub use tensor::{Reduction, ResultTensor};
pub(crate) use tensor::TensorRecord;

use ndarray::{ArrayD, IxDyn};
use std::collections::BTreeMap;

use crate::axis::{AxisRole, Grid};
use crate::error::{LooperError, Result};

/// One axis of a completed sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepAxis {
    /// Name of the swept parameter
    pub var: String,

    /// Vector element overridden, if any
    pub index: Option<usize>,

    /// Coordinate values in sweep order
    pub values: Vec<f64>,
}

/// Axes and results of a completed sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct LooperResults {
    /// Axis role to axis description
    pub axes: BTreeMap<AxisRole, SweepAxis>,

    /// Result tensor laid out `(Z, Y, X, output...)`
    pub results: ResultTensor,

    /// Whether the tensor was served from the cache
    pub from_cache: bool,
}

impl LooperResults {
    /// Pair a tensor with the grid it was computed on.
    pub fn new(grid: &Grid, results: ResultTensor, from_cache: bool) -> Result<Self> {
        if results.sweep_shape() != grid.shape() {
            return Err(LooperError::Shape(format!(
                "Result sweep shape {:?} does not match grid shape {:?}",
                results.sweep_shape(),
                grid.shape()
            )));
        }

        let axes = AxisRole::layout(grid.ndim())
            .iter()
            .zip(grid.axes().iter())
            .map(|(role, spec)| {
                (
                    *role,
                    SweepAxis {
                        var: spec.var().to_string(),
                        index: spec.index(),
                        values: spec.values().to_vec(),
                    },
                )
            })
            .collect();

        Ok(Self {
            axes,
            results,
            from_cache,
        })
    }

    /// Number of sweep axes
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// Position of an axis in the tensor layout.
    pub fn layout_position(&self, role: AxisRole) -> Result<usize> {
        AxisRole::layout(self.ndim())
            .iter()
            .position(|r| *r == role)
            .ok_or_else(|| {
                LooperError::Config(format!(
                    "Axis {} is not part of this {}-axis sweep",
                    role,
                    self.ndim()
                ))
            })
    }

    /// Coordinate values of an axis.
    pub fn axis_values(&self, role: AxisRole) -> Option<&[f64]> {
        self.axes.get(&role).map(|axis| axis.values.as_slice())
    }

    /// Collapse an axis with a reduction.
    pub fn reduce(&self, role: AxisRole, op: Reduction) -> Result<ResultTensor> {
        self.results.reduce(self.layout_position(role)?, op)
    }

    /// Index along an axis at which the minimum or maximum occurs.
    pub fn argreduce(&self, role: AxisRole, op: Reduction) -> Result<ArrayD<usize>> {
        self.results.argreduce(self.layout_position(role)?, op)
    }

    /// Coordinate value along an axis at which the minimum or maximum occurs.
    pub fn argreduce_values(&self, role: AxisRole, op: Reduction) -> Result<ArrayD<f64>> {
        let indices = self.argreduce(role, op)?;
        let values = self.axis_values(role).unwrap_or(&[]);
        Ok(indices.mapv(|i| values[i]))
    }

    /// The values of one axis broadcast over the sweep shape.
    ///
    /// Entry `[k, j, i]` of the X mesh of a 3-axis sweep is `X[i]`.
    pub fn coordinates(&self, role: AxisRole) -> Result<ArrayD<f64>> {
        let position = self.layout_position(role)?;
        let values = self.axis_values(role).unwrap_or(&[]);
        Ok(ArrayD::from_shape_fn(
            IxDyn(self.results.sweep_shape()),
            |index| values[index[position]],
        ))
    }
}

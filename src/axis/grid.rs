//! Cartesian grid over 1 to 3 axes
//!
//! Axes are laid out outermost first and the grid is enumerated in row-major
//! order, so the last axis varies fastest. Every value of the first axis
//! therefore owns a contiguous block of grid points, which is the unit of
//! work for parallel dispatch.

use std::ops::Range;

use crate::axis::spec::AxisSpec;
use crate::error::{LooperError, Result};

/// Largest number of axes a sweep may have.
pub const MAX_AXES: usize = 3;

/// The ordered set of grid points of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    axes: Vec<AxisSpec>,
    shape: Vec<usize>,
    len: usize,
}

impl Grid {
    /// Expand the given axes, outermost first, into a grid.
    ///
    /// # Examples
    ///
    /// ```
    /// use looper_rs::axis::{AxisSpec, Grid, Scale};
    ///
    /// let y = AxisSpec::explicit("P_lc", vec![1.0, 2.0]).unwrap();
    /// let x = AxisSpec::range("delta", -0.5, 0.5, 3, Scale::Linear).unwrap();
    /// let grid = Grid::build(&[y, x]).unwrap();
    /// assert_eq!(grid.shape(), &[2, 3]);
    /// assert_eq!(grid.coordinate(1), vec![1.0, 0.0]);
    /// ```
    pub fn build(axes: &[AxisSpec]) -> Result<Self> {
        if axes.is_empty() || axes.len() > MAX_AXES {
            return Err(LooperError::Config(format!(
                "A sweep needs between 1 and {} axes, got {}",
                MAX_AXES,
                axes.len()
            )));
        }

        let shape: Vec<usize> = axes.iter().map(AxisSpec::len).collect();
        let len = shape.iter().product();

        Ok(Self {
            axes: axes.to_vec(),
            shape,
            len,
        })
    }

    /// Axes in layout order
    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    /// Number of values along each axis
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of grid points
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Per-axis indices of the grid point at position `flat`.
    pub fn unravel(&self, flat: usize) -> Vec<usize> {
        let mut index = vec![0; self.shape.len()];
        let mut rest = flat;
        for (slot, &n) in index.iter_mut().zip(self.shape.iter()).rev() {
            *slot = rest % n;
            rest /= n;
        }
        index
    }

    /// Axis values of the grid point at position `flat`, outermost first.
    pub fn coordinate(&self, flat: usize) -> Vec<f64> {
        self.unravel(flat)
            .into_iter()
            .zip(self.axes.iter())
            .map(|(i, axis)| axis.values()[i])
            .collect()
    }

    /// All coordinates in grid order.
    pub fn iter(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        (0..self.len).map(move |flat| self.coordinate(flat))
    }

    /// Number of values of the outermost axis.
    pub fn outer_len(&self) -> usize {
        self.shape[0]
    }

    /// Number of grid points sharing one outermost value.
    pub fn inner_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Flat positions of the block belonging to outermost value `outer`.
    pub fn outer_block(&self, outer: usize) -> Range<usize> {
        let inner = self.inner_len();
        outer * inner..(outer + 1) * inner
    }
}

//! Merging grid coordinates into the base parameters
//!
//! Each grid point gets a private copy of the base parameters with the axis
//! values written into it. An axis with an index overrides a single element
//! of a vector parameter and leaves the other elements as they were.

use crate::axis::AxisSpec;
use crate::error::{LooperError, Result};
use crate::parameters::parameter::ParamValue;
use crate::parameters::parameters::Parameters;

/// Materialize the parameters of one grid point.
///
/// `coord` holds one value per axis, in the same order as `axes`.
///
/// # Examples
///
/// ```
/// use looper_rs::axis::AxisSpec;
/// use looper_rs::parameters::{materialize, Parameters};
///
/// let base = Parameters::new().with("Omegas", vec![2.0, 2.0, 2.0]);
/// let axis = AxisSpec::explicit("Omegas", vec![1.9, 2.1]).unwrap().with_index(1);
///
/// let params = materialize(&base, &[1.9], &[axis]).unwrap();
/// assert_eq!(params.vector("Omegas").unwrap(), &[2.0, 1.9, 2.0]);
/// assert_eq!(base.vector("Omegas").unwrap(), &[2.0, 2.0, 2.0]);
/// ```
pub fn materialize(base: &Parameters, coord: &[f64], axes: &[AxisSpec]) -> Result<Parameters> {
    if coord.len() != axes.len() {
        return Err(LooperError::Config(format!(
            "Coordinate has {} values but the sweep has {} axes",
            coord.len(),
            axes.len()
        )));
    }

    let mut params = base.clone();
    for (&value, axis) in coord.iter().zip(axes.iter()) {
        match axis.index() {
            None => {
                params.insert(axis.var(), value);
            }
            Some(index) => match params.get_mut(axis.var()) {
                Some(ParamValue::Vector(elements)) => {
                    let len = elements.len();
                    let slot = elements.get_mut(index).ok_or_else(|| {
                        LooperError::Config(format!(
                            "Index {} is out of bounds for parameter '{}' of length {}",
                            index,
                            axis.var(),
                            len
                        ))
                    })?;
                    *slot = value;
                }
                Some(other) => {
                    return Err(LooperError::Config(format!(
                        "Parameter '{}' is a {} and cannot be indexed",
                        axis.var(),
                        other.kind()
                    )))
                }
                None => {
                    return Err(LooperError::Config(format!(
                        "Indexed axis targets parameter '{}' which is not in the base parameters",
                        axis.var()
                    )))
                }
            },
        }
    }

    Ok(params)
}

/// Materializes grid points against a fixed base and axis list.
///
/// Construction checks every axis target against the base parameters, so
/// configuration mistakes are reported before any evaluation starts.
#[derive(Debug, Clone, Copy)]
pub struct ParameterMaterializer<'a> {
    base: &'a Parameters,
    axes: &'a [AxisSpec],
}

impl<'a> ParameterMaterializer<'a> {
    pub fn new(base: &'a Parameters, axes: &'a [AxisSpec]) -> Result<Self> {
        for (i, axis) in axes.iter().enumerate() {
            if axes[..i]
                .iter()
                .any(|other| other.var() == axis.var() && other.index() == axis.index())
            {
                return Err(LooperError::Config(format!(
                    "Parameter '{}' is swept by more than one axis",
                    axis.var()
                )));
            }

            match (axis.index(), base.get(axis.var())) {
                (None, Some(value @ (ParamValue::Vector(_) | ParamValue::Text(_)))) => {
                    return Err(LooperError::Config(format!(
                        "Axis over '{}' has no index but the parameter is a {}",
                        axis.var(),
                        value.kind()
                    )))
                }
                (None, _) => {}
                (Some(index), Some(ParamValue::Vector(elements))) => {
                    if index >= elements.len() {
                        return Err(LooperError::Config(format!(
                            "Index {} is out of bounds for parameter '{}' of length {}",
                            index,
                            axis.var(),
                            elements.len()
                        )));
                    }
                }
                (Some(_), Some(other)) => {
                    return Err(LooperError::Config(format!(
                        "Parameter '{}' is a {} and cannot be indexed",
                        axis.var(),
                        other.kind()
                    )))
                }
                (Some(_), None) => {
                    return Err(LooperError::Config(format!(
                        "Indexed axis targets parameter '{}' which is not in the base parameters",
                        axis.var()
                    )))
                }
            }
        }

        Ok(Self { base, axes })
    }

    pub fn base(&self) -> &Parameters {
        self.base
    }

    pub fn axes(&self) -> &[AxisSpec] {
        self.axes
    }

    /// Parameters of the grid point with the given coordinate.
    pub fn materialize(&self, coord: &[f64]) -> Result<Parameters> {
        materialize(self.base, coord, self.axes)
    }
}

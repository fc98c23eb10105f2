//! Finite difference derivative of sweep results along the X axis.
//!
//! This module differentiates a completed result tensor with respect to its
//! innermost sweep axis, holding every other sweep axis and every output
//! component fixed. It works on any monotonic X grid, uniform or not.

use ndarray::{ArrayD, ArrayView1, ArrayViewMut1, Axis, Zip};

use crate::error::{LooperError, Result};
use crate::results::ResultTensor;

/// Differentiate one lane of values sampled at `x`.
///
/// Interior points use the second-order central difference for non-uniform
/// spacing:
///
/// f'(x_i) ≈ (h_s² f_{i+1} + (h_d² - h_s²) f_i - h_d² f_{i-1}) / (h_s h_d (h_s + h_d))
///
/// with `h_s = x_i - x_{i-1}` and `h_d = x_{i+1} - x_i`. The end points use
/// one-sided first-order differences.
fn differentiate_lane(f: ArrayView1<f64>, x: &[f64], mut out: ArrayViewMut1<f64>) {
    let n = x.len();

    out[0] = (f[1] - f[0]) / (x[1] - x[0]);
    out[n - 1] = (f[n - 1] - f[n - 2]) / (x[n - 1] - x[n - 2]);

    for i in 1..n - 1 {
        let hs = x[i] - x[i - 1];
        let hd = x[i + 1] - x[i];
        out[i] = (hs * hs * f[i + 1] + (hd * hd - hs * hs) * f[i] - hd * hd * f[i - 1])
            / (hs * hd * (hs + hd));
    }
}

pub(crate) fn check_x_values(x: &[f64], lane_len: usize) -> Result<()> {
    if x.len() != lane_len {
        return Err(LooperError::Config(format!(
            "Gradient axis has {} values but the results have {} points along it",
            x.len(),
            lane_len
        )));
    }
    if x.len() < 2 {
        return Err(LooperError::Config(
            "Gradient needs at least two X values".to_string(),
        ));
    }

    // Spacing must be strictly monotonic, in either direction
    let increasing = x[1] > x[0];
    let monotonic = x
        .windows(2)
        .all(|w| if increasing { w[1] > w[0] } else { w[1] < w[0] });
    if !monotonic {
        return Err(LooperError::Config(
            "Gradient X values must be strictly monotonic".to_string(),
        ));
    }
    Ok(())
}

/// Differentiate an array along `axis` with respect to the coordinates `x`.
///
/// # Arguments
///
/// * `values` - The sampled values
/// * `axis` - The axis along which `x` varies
/// * `x` - Coordinates of the samples along `axis`
///
/// # Returns
///
/// * `Result<ArrayD<f64>>` - The derivative, same shape as `values`
pub fn gradient_along(values: &ArrayD<f64>, axis: usize, x: &[f64]) -> Result<ArrayD<f64>> {
    if axis >= values.ndim() {
        return Err(LooperError::Config(format!(
            "Cannot differentiate along axis {} of a {}-dimensional array",
            axis,
            values.ndim()
        )));
    }
    check_x_values(x, values.len_of(Axis(axis)))?;

    let mut grad = ArrayD::zeros(values.raw_dim());
    Zip::from(values.lanes(Axis(axis)))
        .and(grad.lanes_mut(Axis(axis)))
        .for_each(|f, out| differentiate_lane(f, x, out));

    Ok(grad)
}

/// Estimate the derivative of a result tensor along its X axis.
///
/// The X axis is the last sweep axis of the tensor; `x_values` are its
/// coordinates. The returned tensor has exactly the input's shape.
///
/// # Examples
///
/// ```
/// use looper_rs::gradient::estimate;
/// use looper_rs::results::{Output, ResultTensor};
///
/// let x = [0.0, 1.0, 2.0, 3.0];
/// let raw = x.iter().map(|v| Output::Scalar(3.0 * v)).collect();
/// let tensor = ResultTensor::aggregate(raw, &[4]).unwrap();
///
/// let grad = estimate(&tensor, &x).unwrap();
/// assert!(grad.as_array().iter().all(|g| (g - 3.0).abs() < 1e-12));
/// ```
pub fn estimate(tensor: &ResultTensor, x_values: &[f64]) -> Result<ResultTensor> {
    if tensor.sweep_ndim() == 0 {
        return Err(LooperError::Config(
            "Cannot differentiate a result with no sweep axes".to_string(),
        ));
    }
    let axis = tensor.sweep_ndim() - 1;
    let grad = gradient_along(tensor.as_array(), axis, x_values)?;
    ResultTensor::from_array(grad, tensor.sweep_ndim())
}

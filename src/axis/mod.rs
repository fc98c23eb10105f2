//! # Sweep axes
//!
//! A sweep declares an X axis and optionally Y and Z axes. Each axis is an
//! [`AxisSpec`]: a parameter name, its values (explicit or generated) and an
//! optional vector index. The axes are expanded into a [`Grid`] whose layout
//! is outermost first, `(Z, Y, X)`, so X is the innermost, fastest varying
//! axis.

pub mod grid;
pub mod spec;

pub use grid::{Grid, MAX_AXES};
pub use spec::{AxisConfig, AxisSpec, AxisValues, Scale};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an axis within a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AxisRole {
    X,
    Y,
    Z,
}

impl AxisRole {
    /// Roles of an `n`-axis sweep in layout order, outermost first.
    pub fn layout(n: usize) -> &'static [AxisRole] {
        match n {
            1 => &[AxisRole::X],
            2 => &[AxisRole::Y, AxisRole::X],
            _ => &[AxisRole::Z, AxisRole::Y, AxisRole::X],
        }
    }
}

impl fmt::Display for AxisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisRole::X => write!(f, "X"),
            AxisRole::Y => write!(f, "Y"),
            AxisRole::Z => write!(f, "Z"),
        }
    }
}

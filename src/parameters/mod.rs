//! # Parameter System
//!
//! Base parameters describe the physical system being swept. They are an
//! ordered, serializable map from names to [`ParamValue`]s. For every grid
//! point the [`ParameterMaterializer`] writes the axis values into a private
//! copy of the base parameters before the swept function sees them.
//!
//! ## Example Usage
//!
//! ```rust
//! use looper_rs::axis::AxisSpec;
//! use looper_rs::parameters::{ParameterMaterializer, Parameters};
//!
//! let base = Parameters::new()
//!     .with("delta", 0.0)
//!     .with("A_ls", vec![100.0, 10.0, 10.0]);
//!
//! let axes = vec![
//!     AxisSpec::explicit("A_ls", vec![5.0, 50.0]).unwrap().with_index(0),
//!     AxisSpec::explicit("delta", vec![-0.5, 0.5]).unwrap(),
//! ];
//! let materializer = ParameterMaterializer::new(&base, &axes).unwrap();
//!
//! let params = materializer.materialize(&[50.0, 0.5]).unwrap();
//! assert_eq!(params.scalar("delta").unwrap(), 0.5);
//! assert_eq!(params.vector("A_ls").unwrap(), &[50.0, 10.0, 10.0]);
//! ```

pub mod materialize;
pub mod parameter;
pub mod parameters;


// Re-export key types
pub use materialize::{materialize, ParameterMaterializer};
pub use parameter::ParamValue;
pub use parameters::Parameters;

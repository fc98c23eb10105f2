//! # looper-rs
//!
//! `looper-rs` runs parameter sweeps: it walks a 1-, 2- or 3-dimensional grid
//! of input parameters, evaluates a function at every grid point, optionally
//! in parallel, optionally differentiates the results along the X axis, and
//! caches completed sweeps so they are never computed twice.
//!
//! The library provides:
//! - Axis specifications with explicit, linear or logarithmic values
//! - Scalar and vector-element parameter overrides per grid point
//! - Serial and worker-pool dispatch with fail-fast errors and interruption
//! - Content-addressed result caching on disk or in memory
//! - Result tensors with min/max/mean and argmin/argmax reductions
//!
//! ## Basic Usage
//!
//! ```
//! use looper_rs::{AxisRole, AxisSpec, FnSweep, Looper, LooperConfig, Output, Parameters, Reduction, Scale};
//!
//! let config = LooperConfig::new(AxisSpec::range("delta", -1.0, 1.0, 21, Scale::Linear).unwrap())
//!     .with_y(AxisSpec::explicit("P", vec![1.0, 2.0]).unwrap())
//!     .with_cache(false);
//!
//! let well = FnSweep::new("well", |p: &Parameters| {
//!     let delta = p.scalar("delta")?;
//!     let power = p.scalar("P")?;
//!     Ok(Output::Scalar(power * (delta - 0.5).powi(2)))
//! });
//!
//! let looper = Looper::new(well, config, Parameters::new()).unwrap();
//! let results = looper.run().unwrap();
//!
//! let minimum_at = results.argreduce_values(AxisRole::X, Reduction::Min).unwrap();
//! assert!(minimum_at.iter().all(|&d| (d - 0.5).abs() < 1e-12));
//! ```

// Public modules
pub mod error;

// Sweep description
pub mod axis;
pub mod config;
pub mod parameters;

// Execution
pub mod dispatch;
pub mod function;
pub mod looper;

// Results
pub mod cache;
pub mod gradient;
pub mod results;

pub mod logging;

// Re-exports for convenience
pub use axis::{AxisRole, AxisSpec, AxisValues, Grid, Scale};
pub use cache::{CacheKey, CacheStore, FileCacheStore, MemoryCacheStore};
pub use config::LooperConfig;
pub use dispatch::{Dispatcher, Interrupt, SweepProgress};
pub use error::{LooperError, Result};
pub use function::{FnSweep, SweepFunction};
pub use looper::{wrap_looper, Looper, LooperKind};
pub use parameters::{ParamValue, Parameters};
pub use results::{LooperResults, Output, Reduction, ResultTensor};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

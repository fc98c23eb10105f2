//! The function being swept.
//!
//! A sweep treats its function as opaque: it hands over one materialized
//! [`Parameters`] mapping per grid point and receives an [`Output`]. The
//! function's identity string is part of the cache key, so two functions
//! that compute different things must never share one.

use std::fmt;

use crate::error::Result;
use crate::parameters::Parameters;
use crate::results::Output;

/// A function evaluated at every point of a sweep.
///
/// Implementations must be safe to call concurrently from worker threads and
/// must not rely on state mutated by other evaluations.
pub trait SweepFunction: Sync {
    /// Stable identity used for cache keys, e.g. `"transmission@2"`.
    fn identity(&self) -> String;

    /// Evaluate the function for one parameter mapping.
    fn eval(&self, params: &Parameters) -> Result<Output>;
}

impl<T: SweepFunction + ?Sized> SweepFunction for &T {
    fn identity(&self) -> String {
        (**self).identity()
    }

    fn eval(&self, params: &Parameters) -> Result<Output> {
        (**self).eval(params)
    }
}

impl<T: SweepFunction + ?Sized> SweepFunction for Box<T> {
    fn identity(&self) -> String {
        (**self).identity()
    }

    fn eval(&self, params: &Parameters) -> Result<Output> {
        (**self).eval(params)
    }
}

/// Adapter turning a closure into a [`SweepFunction`].
///
/// # Examples
///
/// ```
/// use looper_rs::function::{FnSweep, SweepFunction};
/// use looper_rs::parameters::Parameters;
/// use looper_rs::results::Output;
///
/// let square = FnSweep::new("square", |p: &Parameters| Ok(Output::Scalar(p.scalar("x")?.powi(2))))
///     .with_version("2");
///
/// assert_eq!(square.identity(), "square@2");
/// let out = square.eval(&Parameters::new().with("x", 3.0)).unwrap();
/// assert_eq!(out, Output::Scalar(9.0));
/// ```
pub struct FnSweep<F> {
    name: String,
    version: Option<String>,
    func: F,
}

impl<F> FnSweep<F>
where
    F: Fn(&Parameters) -> Result<Output> + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            version: None,
            func,
        }
    }

    /// Tag the function with a version. Bump it whenever the computation
    /// changes so older cache entries stop matching.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F> SweepFunction for FnSweep<F>
where
    F: Fn(&Parameters) -> Result<Output> + Sync,
{
    fn identity(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.name, version),
            None => self.name.clone(),
        }
    }

    fn eval(&self, params: &Parameters) -> Result<Output> {
        (self.func)(params)
    }
}

impl<F> fmt::Debug for FnSweep<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSweep")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish()
    }
}

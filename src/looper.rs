//! # Looper
//!
//! A [`Looper`] ties the pieces of a sweep together:
//!
//! 1. the configured axes are expanded into a [`Grid`],
//! 2. the cache is consulted and a hit is returned as is,
//! 3. otherwise the [`Dispatcher`] evaluates the function at every grid point,
//! 4. the outputs are aggregated into a [`ResultTensor`],
//! 5. with `grad` set, the tensor is replaced by its derivative along X,
//! 6. the result is stored in the cache and returned as [`LooperResults`].
//!
//! Configuration problems are reported before the first evaluation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::axis::{AxisRole, Grid};
use crate::cache::{CacheEntry, CacheKey, CacheStore, FileCacheStore, MemoryCacheStore, SweepSignature};
use crate::config::LooperConfig;
use crate::dispatch::{Dispatcher, Interrupt, SweepProgress};
use crate::error::{LooperError, Result};
use crate::function::SweepFunction;
use crate::gradient;
use crate::parameters::materialize::ParameterMaterializer;
use crate::parameters::Parameters;
use crate::results::{LooperResults, ResultTensor};

/// Named sweep shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LooperKind {
    /// Sweep over X
    XLooper,
    /// Sweep over Y and X
    XYLooper,
    /// Sweep over Z, Y and X
    XYZLooper,
}

impl LooperKind {
    /// Number of axes the kind sweeps.
    pub fn ndim(&self) -> usize {
        match self {
            LooperKind::XLooper => 1,
            LooperKind::XYLooper => 2,
            LooperKind::XYZLooper => 3,
        }
    }

    pub fn from_ndim(ndim: usize) -> Result<Self> {
        match ndim {
            1 => Ok(LooperKind::XLooper),
            2 => Ok(LooperKind::XYLooper),
            3 => Ok(LooperKind::XYZLooper),
            n => Err(LooperError::Config(format!(
                "No looper sweeps {} axes",
                n
            ))),
        }
    }
}

impl FromStr for LooperKind {
    type Err = LooperError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "XLooper" => Ok(LooperKind::XLooper),
            "XYLooper" => Ok(LooperKind::XYLooper),
            "XYZLooper" => Ok(LooperKind::XYZLooper),
            other => Err(LooperError::Config(format!(
                "Unknown looper '{}', expected XLooper, XYLooper or XYZLooper",
                other
            ))),
        }
    }
}

impl fmt::Display for LooperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LooperKind::XLooper => write!(f, "XLooper"),
            LooperKind::XYLooper => write!(f, "XYLooper"),
            LooperKind::XYZLooper => write!(f, "XYZLooper"),
        }
    }
}

/// Parameter sweep over a function with result caching.
pub struct Looper<F> {
    func: F,
    config: LooperConfig,
    base: Parameters,
    kind: LooperKind,
    store: Option<Arc<dyn CacheStore>>,
    interrupt: Interrupt,
    dispatcher: Dispatcher,
}

impl<F: SweepFunction> Looper<F> {
    /// Create a looper.
    ///
    /// # Arguments
    ///
    /// * `func` - The function evaluated at every grid point
    /// * `config` - Axes and sweep options
    /// * `base` - Parameters shared by every grid point
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The looper, or a configuration error
    pub fn new(func: F, config: LooperConfig, base: Parameters) -> Result<Self> {
        config.validate()?;
        let kind = LooperKind::from_ndim(config.axes()?.len())?;

        let store: Option<Arc<dyn CacheStore>> = match (config.cache, &config.file_path_prefix) {
            (false, _) => None,
            (true, Some(prefix)) => Some(Arc::new(FileCacheStore::new(prefix))),
            (true, None) => Some(Arc::new(MemoryCacheStore::new())),
        };

        let interrupt = Interrupt::new();
        let mut dispatcher = Dispatcher::new()
            .with_parallel(config.parallel)
            .with_show_progress(config.show_progress)
            .with_interrupt(interrupt.clone());
        if let Some(workers) = config.num_workers {
            dispatcher = dispatcher.with_num_workers(workers);
        }

        Ok(Self {
            func,
            config,
            base,
            kind,
            store,
            interrupt,
            dispatcher,
        })
    }

    /// Use a specific cache store. Ignored when caching is disabled.
    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        if self.config.cache {
            self.store = Some(store);
        }
        self
    }

    /// Receive a progress update after every completed point (serial) or
    /// outer-axis block (parallel).
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: Fn(SweepProgress) + Send + Sync + 'static,
    {
        self.dispatcher = self.dispatcher.with_observer(observer);
        self
    }

    pub fn kind(&self) -> LooperKind {
        self.kind
    }

    pub fn config(&self) -> &LooperConfig {
        &self.config
    }

    pub fn base(&self) -> &Parameters {
        &self.base
    }

    pub fn function(&self) -> &F {
        &self.func
    }

    /// Handle for stopping a running sweep from another thread.
    ///
    /// An interrupted [`run`](Self::run) clears the flag before returning,
    /// so a later run on the same looper proceeds normally.
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// Key under which this sweep's results are cached.
    pub fn cache_key(&self) -> Result<CacheKey> {
        let axes = self.config.axes()?;
        let identity = self.func.identity();
        CacheKey::derive(&SweepSignature::new(
            &identity,
            &axes,
            &self.base,
            self.config.grad,
        ))
    }

    /// Drop any cached result of this sweep.
    pub fn invalidate_cache(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.invalidate(&self.cache_key()?),
            None => Ok(()),
        }
    }

    /// Run the sweep, or return its cached result.
    pub fn run(&self) -> Result<LooperResults> {
        let axes = self.config.axes()?;
        let grid = Grid::build(&axes)?;
        let materializer = ParameterMaterializer::new(&self.base, grid.axes())?;

        let x_values = grid
            .axes()
            .last()
            .map(|axis| axis.values().to_vec())
            .unwrap_or_default();
        if self.config.grad {
            gradient::check_x_values(&x_values, x_values.len())?;
        }

        let identity = self.func.identity();
        let signature = SweepSignature::new(&identity, &axes, &self.base, self.config.grad);
        let key = CacheKey::derive(&signature)?;

        if let Some(tensor) = self.load_cached(&key, &grid) {
            info!(looper = %self.kind, function = %identity, key = %key, "Loaded sweep from cache");
            return LooperResults::new(&grid, tensor, true);
        }

        info!(
            looper = %self.kind,
            function = %identity,
            points = grid.len(),
            parallel = self.config.parallel,
            "Starting sweep"
        );

        let raw = match self.dispatcher.run(&grid, &materializer, &self.func) {
            Err(LooperError::Interrupted) => {
                // Consumed, so the next run starts clean
                self.interrupt.reset();
                info!(looper = %self.kind, function = %identity, "Sweep interrupted");
                return Err(LooperError::Interrupted);
            }
            other => other?,
        };
        let mut tensor = ResultTensor::aggregate(raw, grid.shape())?;
        if self.config.grad {
            tensor = gradient::estimate(&tensor, &x_values)?;
        }

        if let Some(store) = &self.store {
            match store.store(CacheEntry::new(key.clone(), &signature, &tensor)) {
                Ok(()) => debug!(key = %key, "Cached sweep results"),
                Err(e) => warn!(key = %key, error = %e, "Failed to cache sweep results"),
            }
        }

        info!(looper = %self.kind, function = %identity, "Sweep complete");
        LooperResults::new(&grid, tensor, false)
    }

    fn load_cached(&self, key: &CacheKey, grid: &Grid) -> Option<ResultTensor> {
        let store = self.store.as_ref()?;
        let tensor = store.load(key)?;
        if tensor.sweep_shape() != grid.shape() {
            warn!(
                key = %key,
                cached = ?tensor.sweep_shape(),
                expected = ?grid.shape(),
                "Ignoring cached sweep with mismatched shape"
            );
            return None;
        }
        Some(tensor)
    }
}

/// Run a sweep by looper name.
///
/// The number of axes declared in `config` must match the named kind.
///
/// # Arguments
///
/// * `looper_name` - `"XLooper"`, `"XYLooper"` or `"XYZLooper"`
/// * `func` - The function evaluated at every grid point
/// * `config` - Axes and sweep options
/// * `base` - Parameters shared by every grid point
///
/// # Examples
///
/// ```
/// use looper_rs::axis::AxisSpec;
/// use looper_rs::config::LooperConfig;
/// use looper_rs::function::FnSweep;
/// use looper_rs::looper::wrap_looper;
/// use looper_rs::parameters::Parameters;
/// use looper_rs::results::Output;
///
/// let config = LooperConfig::new(AxisSpec::explicit("x", vec![1.0, 2.0, 3.0]).unwrap())
///     .with_cache(false);
/// let double = FnSweep::new("double", |p: &Parameters| Ok(Output::Scalar(2.0 * p.scalar("x")?)));
///
/// let looper = wrap_looper("XLooper", double, config, Parameters::new()).unwrap();
/// assert_eq!(looper.results.as_array().iter().copied().collect::<Vec<_>>(), vec![2.0, 4.0, 6.0]);
/// ```
pub fn wrap_looper<F: SweepFunction>(
    looper_name: &str,
    func: F,
    config: LooperConfig,
    base: Parameters,
) -> Result<LooperResults> {
    let kind: LooperKind = looper_name.parse()?;
    let declared = config.axes()?;
    if declared.len() != kind.ndim() {
        let roles: Vec<String> = AxisRole::layout(declared.len())
            .iter()
            .map(|r| r.to_string())
            .collect();
        return Err(LooperError::Config(format!(
            "{} sweeps {} axes but the configuration declares {} ({})",
            kind,
            kind.ndim(),
            declared.len(),
            roles.join(", ")
        )));
    }

    Looper::new(func, config, base)?.run()
}

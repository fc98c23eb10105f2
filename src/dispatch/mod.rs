//! # Sweep dispatch
//!
//! The dispatcher evaluates a function at every point of a [`Grid`] and
//! returns the outputs in grid order.
//!
//! In serial mode points are evaluated one after another on the calling
//! thread. In parallel mode there is one task per value of the outermost
//! axis; each task sweeps its contiguous block of inner points serially on a
//! dedicated `rayon` pool and sends the finished block back over a channel.
//! Blocks are placed by task index, so the output order never depends on
//! which task finishes first.
//!
//! The first failing point aborts the sweep: tasks that have not started skip
//! their block and running tasks stop before their next point.

pub mod progress;

pub use progress::{Interrupt, ProgressObserver, SweepProgress};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::axis::Grid;
use crate::error::{LooperError, Result};
use crate::function::SweepFunction;
use crate::parameters::materialize::ParameterMaterializer;
use crate::results::Output;
use progress::ProgressReporter;

/// Outcome of one outer-axis task.
enum BlockOutcome {
    Done(Vec<Output>),
    Failed(LooperError),
    Skipped,
}

/// Executes a function over every point of a grid.
#[derive(Clone, Default)]
pub struct Dispatcher {
    parallel: bool,
    num_workers: Option<usize>,
    show_progress: bool,
    interrupt: Interrupt,
    observer: Option<ProgressObserver>,
}

impl Dispatcher {
    /// Create a serial dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate outer-axis blocks concurrently.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fix the worker count instead of using the available parallelism.
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = Some(num_workers.max(1));
        self
    }

    /// Log progress updates at `info` level.
    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Share an interrupt handle with the caller.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Receive every progress update.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(SweepProgress) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Number of worker threads used for a grid with `outer_len` outer values.
    pub fn worker_count(&self, outer_len: usize) -> usize {
        let available = self.num_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        available.min(outer_len).max(1)
    }

    /// Evaluate `func` at every grid point.
    ///
    /// # Arguments
    ///
    /// * `grid` - The grid to sweep
    /// * `materializer` - Builds the parameters of each grid point
    /// * `func` - The function to evaluate
    ///
    /// # Returns
    ///
    /// * `Result<Vec<Output>>` - One output per grid point, in grid order
    pub fn run<F>(
        &self,
        grid: &Grid,
        materializer: &ParameterMaterializer<'_>,
        func: &F,
    ) -> Result<Vec<Output>>
    where
        F: SweepFunction + ?Sized,
    {
        if self.interrupt.is_triggered() {
            return Err(LooperError::Interrupted);
        }

        if self.parallel && grid.outer_len() > 1 {
            self.run_parallel(grid, materializer, func)
        } else {
            self.run_serial(grid, materializer, func)
        }
    }

    fn run_serial<F>(
        &self,
        grid: &Grid,
        materializer: &ParameterMaterializer<'_>,
        func: &F,
    ) -> Result<Vec<Output>>
    where
        F: SweepFunction + ?Sized,
    {
        debug!(points = grid.len(), "Dispatching sweep serially");

        let mut reporter =
            ProgressReporter::new(grid.len(), self.show_progress, self.observer.as_deref());
        let mut outputs = Vec::with_capacity(grid.len());

        for flat in 0..grid.len() {
            if self.interrupt.is_triggered() {
                return Err(LooperError::Interrupted);
            }
            outputs.push(evaluate_point(grid, materializer, func, flat)?);
            reporter.advance(1);
        }

        Ok(outputs)
    }

    fn run_parallel<F>(
        &self,
        grid: &Grid,
        materializer: &ParameterMaterializer<'_>,
        func: &F,
    ) -> Result<Vec<Output>>
    where
        F: SweepFunction + ?Sized,
    {
        let outer_len = grid.outer_len();
        let workers = self.worker_count(outer_len);
        debug!(
            points = grid.len(),
            tasks = outer_len,
            workers,
            "Dispatching sweep in parallel"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("looper-worker-{}", i))
            .build()
            .map_err(|e| LooperError::ThreadPool(e.to_string()))?;

        let abort = AtomicBool::new(false);
        let interrupt = &self.interrupt;
        let mut slots: Vec<Option<Vec<Output>>> = (0..outer_len).map(|_| None).collect();
        let mut first_error: Option<LooperError> = None;
        let mut reporter =
            ProgressReporter::new(grid.len(), self.show_progress, self.observer.as_deref());

        pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel();

            for task in 0..outer_len {
                let tx = tx.clone();
                let abort = &abort;
                scope.spawn(move |_| {
                    let outcome = run_block(grid, materializer, func, task, abort, interrupt);
                    // The receiver only hangs up once every task has reported
                    let _ = tx.send((task, outcome));
                });
            }
            drop(tx);

            for (task, outcome) in rx {
                match outcome {
                    BlockOutcome::Done(block) => {
                        reporter.advance(block.len());
                        slots[task] = Some(block);
                    }
                    BlockOutcome::Failed(e) => {
                        abort.store(true, Ordering::SeqCst);
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                    BlockOutcome::Skipped => {}
                }
            }
        });

        if let Some(e) = first_error {
            return Err(e);
        }
        if interrupt.is_triggered() || slots.iter().any(Option::is_none) {
            return Err(LooperError::Interrupted);
        }

        Ok(slots.into_iter().flatten().flatten().collect())
    }
}

/// Sweep the inner block of one outer-axis value.
fn run_block<F>(
    grid: &Grid,
    materializer: &ParameterMaterializer<'_>,
    func: &F,
    task: usize,
    abort: &AtomicBool,
    interrupt: &Interrupt,
) -> BlockOutcome
where
    F: SweepFunction + ?Sized,
{
    let range = grid.outer_block(task);
    let mut block = Vec::with_capacity(range.len());

    for flat in range {
        if abort.load(Ordering::SeqCst) || interrupt.is_triggered() {
            return BlockOutcome::Skipped;
        }
        match evaluate_point(grid, materializer, func, flat) {
            Ok(output) => block.push(output),
            Err(e) => {
                abort.store(true, Ordering::SeqCst);
                return BlockOutcome::Failed(e);
            }
        }
    }

    BlockOutcome::Done(block)
}

fn evaluate_point<F>(
    grid: &Grid,
    materializer: &ParameterMaterializer<'_>,
    func: &F,
    flat: usize,
) -> Result<Output>
where
    F: SweepFunction + ?Sized,
{
    let coordinate = grid.coordinate(flat);
    let params = materializer.materialize(&coordinate)?;
    func.eval(&params).map_err(|e| LooperError::Evaluation {
        coordinate,
        source: Box::new(e),
    })
}

//! Progress reporting and cancellation for running sweeps.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

/// Completed and total grid points of a running sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepProgress {
    pub completed: usize,
    pub total: usize,
}

impl SweepProgress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

impl fmt::Display for SweepProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.1}%)",
            self.completed,
            self.total,
            100.0 * self.fraction()
        )
    }
}

/// Callback invoked with every progress update.
pub type ProgressObserver = Arc<dyn Fn(SweepProgress) + Send + Sync>;

/// Handle for interrupting a sweep from another thread.
///
/// Clones share the same flag. Once triggered, a running sweep stops issuing
/// work and returns [`LooperError::Interrupted`](crate::error::LooperError::Interrupted).
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the sweep stop.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the handle can be reused for the next sweep.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Counts completed points. Only the thread collecting results owns one.
///
/// The observer sees every update; the log only sees whole-percent steps.
pub(crate) struct ProgressReporter<'a> {
    progress: SweepProgress,
    show_progress: bool,
    logged_percent: usize,
    observer: Option<&'a (dyn Fn(SweepProgress) + Send + Sync)>,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(
        total: usize,
        show_progress: bool,
        observer: Option<&'a (dyn Fn(SweepProgress) + Send + Sync)>,
    ) -> Self {
        Self {
            progress: SweepProgress {
                completed: 0,
                total,
            },
            show_progress,
            logged_percent: 0,
            observer,
        }
    }

    /// Percent reached by the last update, if it has not been logged yet.
    fn next_log_step(&mut self) -> Option<usize> {
        let percent = (100 * self.progress.completed)
            .checked_div(self.progress.total)
            .unwrap_or(100);
        if percent > self.logged_percent {
            self.logged_percent = percent;
            Some(percent)
        } else {
            None
        }
    }

    pub(crate) fn advance(&mut self, points: usize) {
        self.progress.completed += points;
        if self.show_progress && self.next_log_step().is_some() {
            info!(
                completed = self.progress.completed,
                total = self.progress.total,
                "Sweep progress {}",
                self.progress
            );
        }
        if let Some(observer) = self.observer {
            observer(self.progress);
        }
    }

    #[cfg(test)]
    pub(crate) fn progress(&self) -> SweepProgress {
        self.progress
    }
}

//! Order-preserving parallel execution of homogeneous task batches.
//!
//! A [`WorkerPool`] runs every task of a batch on a fresh thread pool sized
//! to the available hardware concurrency. Results come back in submission
//! order, not completion order, and the first task error aborts the batch.
//! No state is shared between batches.

use std::sync::Arc;
use std::thread;

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Best-effort scheduling-priority adjustment applied to each worker.
///
/// Implementations must swallow platform errors: priority is advisory and
/// has zero effect on correctness.
pub trait PriorityHook: Send + Sync {
    /// Lower the calling worker's scheduling priority.
    fn lower(&self);
}

/// Hook that leaves worker priority untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepPriority;

impl PriorityHook for KeepPriority {
    fn lower(&self) {}
}

/// Lowers each worker below normal priority where the platform supports it.
#[derive(Debug, Default, Clone, Copy)]
pub struct BelowNormal;

impl PriorityHook for BelowNormal {
    #[allow(unsafe_code)]
    fn lower(&self) {
        #[cfg(unix)]
        // SAFETY: nice(2) takes no pointers; a -1 result is indistinguishable
        // from a legal niceness and is ignored along with errno.
        unsafe {
            let _ = libc::nice(10);
        }
    }
}

/// Fixed-size pool of workers for one batch at a time.
pub struct WorkerPool {
    threads: usize,
    hook: Arc<dyn PriorityHook>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool {
    /// Create a pool sized to the available hardware concurrency, with
    /// workers dropped below normal priority.
    #[must_use]
    pub fn new() -> Self {
        Self {
            threads: thread::available_parallelism().map_or(1, |n| n.get()),
            hook: Arc::new(BelowNormal),
        }
    }

    /// Replace the priority hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn PriorityHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Override the worker count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Run a batch of independent tasks, returning results in submission
    /// order. A fresh thread pool is built per call; the priority hook runs
    /// in each worker before any task executes. The first task error aborts
    /// the batch and propagates.
    pub fn run<I, O, F>(&self, inputs: Vec<I>, task: F) -> Result<Vec<O>>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> Result<O> + Send + Sync,
    {
        let hook = Arc::clone(&self.hook);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .start_handler(move |_| hook.lower())
            .build()
            .map_err(|e| Error::Pool(e.to_string()))?;

        pool.install(|| inputs.into_par_iter().map(task).collect())
    }
}

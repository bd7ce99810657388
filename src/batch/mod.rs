//! Batch scheduling for the parallel codecs.
//!
//! An index range `[0, N)` is cut into half-open batches of a fixed size
//! `B`: `[i*B, min((i+1)*B, N))`. Each batch runs as one task on a rayon
//! worker pool, either rayon's global pool or a dedicated pool with a fixed
//! number of workers.
//!
//! Two shapes of work are supported:
//!
//! - [`BatchScheduler::fill`] hands every batch the `&mut` chunk of a
//!   pre-sized output slice that matches its index range. The chunks come
//!   from `par_chunks_mut`, so disjointness is guaranteed by the borrow
//!   checker.
//! - [`BatchScheduler::map`] collects one value per batch and returns them in
//!   ascending batch order, which is what the encoders need to concatenate
//!   their byte/text segments deterministically.
//!
//! Every batch produces a result or an error. Panics are caught per batch.
//! When any batch fails, the call returns [`Error::Batch`] listing every
//! failed batch and no partial output.

use crate::config::CodecConfig;
use crate::{Error, Result};
use rayon::prelude::*;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Default number of items per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Partition `[0, total)` into half-open ranges of at most `batch_size` items.
///
/// Returns `ceil(total / batch_size)` non-empty ranges, or none when `total`
/// is zero. `batch_size` must be non-zero.
pub fn batch_ranges(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    debug_assert!(batch_size > 0, "batch size must be non-zero");
    (0..total.div_ceil(batch_size))
        .map(|i| i * batch_size..((i + 1) * batch_size).min(total))
        .collect()
}

/// One failed batch of a scheduler call.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the batch in the partition.
    pub batch: usize,
    /// Item indices covered by the batch.
    pub range: Range<usize>,
    /// What went wrong.
    pub error: Error,
}

/// Every failed batch of one scheduler call, in ascending batch order.
#[derive(Debug)]
pub struct BatchErrors {
    /// Number of batches the call was split into.
    pub total_batches: usize,
    /// The failures, never empty.
    pub failures: Vec<BatchFailure>,
}

impl BatchErrors {
    /// Number of failed batches.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether no batch failed. Always false for errors returned by the scheduler.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failure of the lowest-indexed batch.
    pub fn first(&self) -> Option<&BatchFailure> {
        self.failures.first()
    }
}

impl fmt::Display for BatchErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} batches failed",
            self.failures.len(),
            self.total_batches
        )?;
        if let Some(first) = self.failures.first() {
            write!(
                f,
                " (batch {} [{}..{}): {})",
                first.batch, first.range.start, first.range.end, first.error
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| &f.error as &(dyn std::error::Error + 'static))
    }
}

/// Runs batched work on a bounded rayon pool.
pub struct BatchScheduler {
    batch_size: usize,
    pool: Option<Arc<rayon::ThreadPool>>,
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    if threads == 0 {
        return Err(Error::Config("worker thread count must be greater than zero".into()));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("stl-batch-{}", i))
        .build()
        .map_err(|e| Error::Config(format!("failed to build worker pool: {}", e)))
}

/// Process-wide pool for `threads` workers, built on first use.
fn shared_pool(threads: usize) -> Result<Arc<rayon::ThreadPool>> {
    static POOLS: OnceLock<Mutex<HashMap<usize, Arc<rayon::ThreadPool>>>> = OnceLock::new();

    let mut pools = POOLS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = pools.get(&threads) {
        return Ok(Arc::clone(pool));
    }
    let pool = Arc::new(build_pool(threads)?);
    tracing::debug!(threads, "built shared worker pool");
    pools.insert(threads, Arc::clone(&pool));
    Ok(pool)
}

impl BatchScheduler {
    /// Create a scheduler using rayon's global pool.
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Config("batch size must be greater than zero".into()));
        }
        Ok(Self {
            batch_size,
            pool: None,
        })
    }

    /// Create a scheduler with a dedicated pool of `threads` workers.
    pub fn with_threads(batch_size: usize, threads: usize) -> Result<Self> {
        let mut scheduler = Self::new(batch_size)?;
        scheduler.pool = Some(Arc::new(build_pool(threads)?));
        Ok(scheduler)
    }

    /// Create a scheduler from the batching settings of a codec config.
    ///
    /// Configs with the same thread count share one pool for the life of the
    /// process, so repeated codec calls do not respawn workers.
    pub fn from_config(config: &CodecConfig) -> Result<Self> {
        let mut scheduler = Self::new(config.batch_size)?;
        if let Some(threads) = config.threads {
            scheduler.pool = Some(shared_pool(threads)?);
        }
        Ok(scheduler)
    }

    /// Items per batch.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches needed for `total` items.
    #[inline]
    pub fn batch_count(&self, total: usize) -> usize {
        total.div_ceil(self.batch_size)
    }

    /// The batch ranges for `total` items.
    pub fn ranges(&self, total: usize) -> Vec<Range<usize>> {
        batch_ranges(total, self.batch_size)
    }

    /// Run `task` once per batch over disjoint chunks of `output`.
    ///
    /// The task receives the batch's index range within `output` and the
    /// mutable chunk covering exactly that range.
    pub fn fill<T, F>(&self, output: &mut [T], task: F) -> Result<()>
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T]) -> Result<()> + Sync,
    {
        let total = output.len();
        let batch_size = self.batch_size;
        tracing::debug!(
            items = total,
            batches = self.batch_count(total),
            batch_size,
            "dispatching fill batches"
        );

        let outcomes: Vec<std::result::Result<(), BatchFailure>> = self.install(|| {
            output
                .par_chunks_mut(batch_size)
                .enumerate()
                .map(|(batch, chunk)| {
                    let start = batch * batch_size;
                    let range = start..start + chunk.len();
                    run_batch(batch, range, |range| task(range, chunk))
                })
                .collect()
        });

        collect_outcomes(outcomes).map(|_| ())
    }

    /// Run `task` once per batch of `total` items and return the per-batch
    /// values in ascending batch order.
    pub fn map<U, F>(&self, total: usize, task: F) -> Result<Vec<U>>
    where
        U: Send,
        F: Fn(Range<usize>) -> Result<U> + Sync,
    {
        let ranges = self.ranges(total);
        tracing::debug!(
            items = total,
            batches = ranges.len(),
            batch_size = self.batch_size,
            "dispatching map batches"
        );

        let outcomes: Vec<std::result::Result<U, BatchFailure>> = self.install(|| {
            ranges
                .into_par_iter()
                .enumerate()
                .map(|(batch, range)| run_batch(batch, range, &task))
                .collect()
        });

        collect_outcomes(outcomes)
    }

    fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pool: None,
        }
    }
}

impl fmt::Debug for BatchScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("batch_size", &self.batch_size)
            .field(
                "threads",
                &self.pool.as_ref().map(|pool| pool.current_num_threads()),
            )
            .finish()
    }
}

/// Run one batch, turning an error or a panic into a [`BatchFailure`].
fn run_batch<U, F>(
    batch: usize,
    range: Range<usize>,
    task: F,
) -> std::result::Result<U, BatchFailure>
where
    F: FnOnce(Range<usize>) -> Result<U>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(range.clone())));
    let error = match outcome {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => error,
        Err(payload) => Error::WorkerPanic(panic_message(payload.as_ref())),
    };
    Err(BatchFailure {
        batch,
        range,
        error,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Aggregate ordered per-batch outcomes into values or a single error.
fn collect_outcomes<U>(outcomes: Vec<std::result::Result<U, BatchFailure>>) -> Result<Vec<U>> {
    let total_batches = outcomes.len();
    let mut values = Vec::with_capacity(total_batches);
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(failure) => failures.push(failure),
        }
    }

    if failures.is_empty() {
        Ok(values)
    } else {
        tracing::warn!(
            failed = failures.len(),
            total_batches,
            "batch scheduler call failed"
        );
        Err(Error::Batch(BatchErrors {
            total_batches,
            failures,
        }))
    }
}

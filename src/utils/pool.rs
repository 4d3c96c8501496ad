//! Local worker pool for chunked stage evaluation.
//!
//! Stages hand over a slice of inputs, a per-chunk function and a commutative
//! combine. Results never depend on the chunk size or the worker count.

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Default number of sequences per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid chunk size: {0} (must be at least 1)")]
    InvalidChunkSize(usize),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),
}

/// How chunked work is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Number of items per chunk
    pub chunk_size: usize,
    /// Worker threads; 0 uses every available core
    pub n_workers: usize,
    /// Run everything on the calling thread
    pub debug: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            n_workers: 0,
            debug: false,
        }
    }
}

impl ExecutionConfig {
    /// Single-threaded execution with default chunking
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            debug: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = n_workers;
        self
    }

    /// # Errors
    ///
    /// Returns `PoolError::InvalidChunkSize` when `chunk_size` is 0.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.chunk_size == 0 {
            return Err(PoolError::InvalidChunkSize(self.chunk_size));
        }
        Ok(())
    }

    fn is_sequential(&self) -> bool {
        self.debug || self.n_workers == 1
    }
}

/// Evaluate `map` over chunks of `items` and fold the partial results.
///
/// `combine` must be commutative and associative with `identity()` as its
/// neutral element; chunks complete in any order when run in parallel.
///
/// # Errors
///
/// Returns `PoolError` if the configuration is invalid or the worker pool
/// cannot be created.
pub fn map_reduce_chunks<T, R, M, I, C>(
    items: &[T],
    exec: &ExecutionConfig,
    map: M,
    identity: I,
    combine: C,
) -> Result<R, PoolError>
where
    T: Sync,
    R: Send,
    M: Fn(&[T]) -> R + Sync + Send,
    I: Fn() -> R + Sync + Send,
    C: Fn(R, R) -> R + Sync + Send,
{
    exec.validate()?;

    if exec.is_sequential() {
        debug!(
            items = items.len(),
            chunk_size = exec.chunk_size,
            "Processing chunks sequentially"
        );
        return Ok(items
            .chunks(exec.chunk_size)
            .map(&map)
            .fold(identity(), &combine));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(exec.n_workers)
        .build()
        .map_err(|e| PoolError::ThreadPool(e.to_string()))?;

    debug!(
        items = items.len(),
        chunk_size = exec.chunk_size,
        workers = pool.current_num_threads(),
        "Processing chunks in parallel"
    );

    Ok(pool.install(|| {
        items
            .par_chunks(exec.chunk_size)
            .map(&map)
            .reduce(&identity, &combine)
    }))
}

//! Executor traits for abstracting async runtime operations.
//!
//! The observer and compositor never call Tokio directly. They suspend through
//! [`Timer`], fan out tile loads through [`ConcurrentRunner`] and push pixel
//! work through [`BlockingExecutor`], so tests can substitute a runtime-free
//! executor.
//!
//! ```text
//! ┌──────────────────────────┐
//! │   TileObserver           │  sleeps between polls        ─► Timer
//! │   RasterCompositor       │  concurrent tile loads       ─► ConcurrentRunner
//! │                          │  decode / composite          ─► BlockingExecutor
//! └────────────┬─────────────┘
//!              │ implemented by
//!              ▼
//! ┌──────────────────────────┐
//! │  TokioExecutor           │  spawn_blocking, JoinSet, time::sleep
//! └──────────────────────────┘
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Trait for executing blocking (CPU-bound) work off the async runtime.
pub trait BlockingExecutor: Send + Sync + 'static {
    /// Executes a blocking closure on a thread pool.
    fn execute_blocking<F, R>(
        &self,
        f: F,
    ) -> Pin<Box<dyn Future<Output = Result<R, ExecutorError>> + Send>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static;
}

/// Type alias for concurrent execution results to reduce type complexity.
pub type ConcurrentResults<R> = Pin<Box<dyn Future<Output = Vec<Result<R, ExecutorError>>> + Send>>;

/// Trait for running multiple futures concurrently and collecting results.
pub trait ConcurrentRunner: Send + Sync + 'static {
    /// Runs multiple futures concurrently and collects their results.
    ///
    /// Results are returned as they complete (not in submission order).
    /// Callers that care about order must tag each output and resequence.
    fn run_concurrent<F, R>(&self, futures: Vec<F>) -> ConcurrentResults<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static;
}

/// Trait for timing operations (timeouts, delays).
pub trait Timer: Send + Sync + 'static {
    /// Wraps a future with a timeout.
    ///
    /// Returns `Err(ExecutorError::Timeout)` if the future doesn't complete
    /// within the specified duration.
    fn timeout<F, R>(
        &self,
        duration: Duration,
        future: F,
    ) -> Pin<Box<dyn Future<Output = Result<R, ExecutorError>> + Send>>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static;

    /// Sleeps for the specified duration.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Errors that can occur during executor operations.
#[derive(Debug, Clone)]
pub enum ExecutorError {
    /// A spawned task panicked
    TaskPanicked(String),
    /// Operation timed out
    Timeout,
}

impl std::fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorError::TaskPanicked(msg) => write!(f, "task panicked: {}", msg),
            ExecutorError::Timeout => write!(f, "operation timed out"),
        }
    }
}

impl std::error::Error for ExecutorError {}

/// Tokio-based implementation of the executor traits.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioExecutor;

impl TokioExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl BlockingExecutor for TokioExecutor {
    fn execute_blocking<F, R>(
        &self,
        f: F,
    ) -> Pin<Box<dyn Future<Output = Result<R, ExecutorError>> + Send>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        Box::pin(async move {
            tokio::task::spawn_blocking(f)
                .await
                .map_err(|e| ExecutorError::TaskPanicked(e.to_string()))
        })
    }
}

impl ConcurrentRunner for TokioExecutor {
    fn run_concurrent<F, R>(&self, futures: Vec<F>) -> ConcurrentResults<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        Box::pin(async move {
            use tokio::task::JoinSet;

            let mut set = JoinSet::new();
            for fut in futures {
                set.spawn(fut);
            }

            let mut results = Vec::with_capacity(set.len());
            while let Some(result) = set.join_next().await {
                results.push(result.map_err(|e| ExecutorError::TaskPanicked(e.to_string())));
            }
            results
        })
    }
}

impl Timer for TokioExecutor {
    fn timeout<F, R>(
        &self,
        duration: Duration,
        future: F,
    ) -> Pin<Box<dyn Future<Output = Result<R, ExecutorError>> + Send>>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        Box::pin(async move {
            tokio::time::timeout(duration, future)
                .await
                .map_err(|_| ExecutorError::Timeout)
        })
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            tokio::time::sleep(duration).await;
        })
    }
}

/// Runtime-free executor for unit tests.
///
/// Blocking work runs inline, concurrent futures are awaited one after
/// another in reverse submission order (to shake out ordering assumptions),
/// sleeps return immediately and are recorded.
#[cfg(test)]
#[derive(Default)]
pub struct SyncExecutor {
    pub slept: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl SyncExecutor {
    pub fn total_slept(&self) -> Duration {
        self.slept.lock().unwrap().iter().sum()
    }
}

#[cfg(test)]
impl BlockingExecutor for SyncExecutor {
    fn execute_blocking<F, R>(
        &self,
        f: F,
    ) -> Pin<Box<dyn Future<Output = Result<R, ExecutorError>> + Send>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let result = f();
        Box::pin(std::future::ready(Ok(result)))
    }
}

#[cfg(test)]
impl ConcurrentRunner for SyncExecutor {
    fn run_concurrent<F, R>(&self, futures: Vec<F>) -> ConcurrentResults<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        Box::pin(async move {
            let mut results = Vec::with_capacity(futures.len());
            for fut in futures.into_iter().rev() {
                results.push(Ok(fut.await));
            }
            results
        })
    }
}

#[cfg(test)]
impl Timer for SyncExecutor {
    fn timeout<F, R>(
        &self,
        _duration: Duration,
        future: F,
    ) -> Pin<Box<dyn Future<Output = Result<R, ExecutorError>> + Send>>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        Box::pin(async move { Ok(future.await) })
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.slept.lock().unwrap().push(duration);
        Box::pin(std::future::ready(()))
    }
}

use std::time::Duration;
use thiserror::Error;

/// Failure delivered through a completion gate when a batch cannot produce
/// results.
///
/// A batch-level failure is fanned out to every member of the batch, so the
/// type is `Clone`. Executor errors are carried as rendered strings because
/// the executor's error type is erased at the fan-out boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerateError {
    /// The model executor returned an error for the whole batch.
    #[error("executor failed: {0}")]
    Executor(String),

    /// The generate call exceeded its hard time budget.
    #[error("generation exceeded budget of {0:?}")]
    DeadlineExceeded(Duration),

    /// The scheduler worker stopped before producing an outcome.
    #[error("batch worker stopped")]
    WorkerStopped,
}

/// Error returned when a request cannot be enqueued.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmitError {
    /// The intake queue is at capacity. Callers should shed load rather
    /// than wait.
    #[error("intake queue full ({capacity} pending)")]
    QueueFull { capacity: usize },

    /// The batch worker has shut down and no longer accepts requests.
    #[error("batcher is closed")]
    Closed,
}

/// Rejected batching configuration, produced by [`BatchConfig::validate`].
///
/// [`BatchConfig::validate`]: crate::BatchConfig::validate
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    ZeroSize { field: &'static str },

    #[error("{field} must be a non-zero duration")]
    ZeroDuration { field: &'static str },
}

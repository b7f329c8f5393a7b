use std::time::Duration;

use crate::error::ConfigError;
use crate::executor::SamplingOptions;

/// Tunable parameters for the batching core.
///
/// Constructed once at startup, validated with [`BatchConfig::validate`],
/// and handed to [`BatchInference::new`]. Nothing in the core reads
/// configuration from the environment.
///
/// [`BatchInference::new`]: crate::BatchInference::new
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of requests dispatched in a single batch.
    pub max_batch_size: usize,

    /// How long the collector keeps accepting members after the first
    /// request of a cycle arrives. The wait for the first request itself is
    /// unbounded.
    pub collection_window: Duration,

    /// Hard budget for one `generate` call. Exceeding it fails the whole
    /// batch.
    pub generate_timeout: Duration,

    /// Token budget passed to the executor for each generation.
    pub max_new_tokens: usize,

    /// Intake queue capacity. Submissions beyond this fail fast with
    /// [`SubmitError::QueueFull`].
    ///
    /// [`SubmitError::QueueFull`]: crate::SubmitError::QueueFull
    pub queue_capacity: usize,

    /// Instruction slot fed to the prompt template for every request.
    pub instruction: String,

    /// Sampling options forwarded to the executor untouched.
    pub sampling: SamplingOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 5,
            collection_window: Duration::from_secs(1),
            generate_timeout: Duration::from_secs(30),
            max_new_tokens: 64,
            queue_capacity: 128,
            instruction: ".".to_string(),
            sampling: SamplingOptions::default(),
        }
    }
}

impl BatchConfig {
    /// Checks the configuration for values that would stall or break the
    /// worker loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroSize { field: "max_batch_size" });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroSize { field: "queue_capacity" });
        }
        if self.max_new_tokens == 0 {
            return Err(ConfigError::ZeroSize { field: "max_new_tokens" });
        }
        if self.collection_window.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "collection_window" });
        }
        if self.generate_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "generate_timeout" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_batch_size, 5);
        assert_eq!(config.generate_timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let config = BatchConfig {
            max_batch_size: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroSize { field: "max_batch_size" })
        );
    }

    #[test]
    fn zero_window_rejected() {
        let config = BatchConfig {
            collection_window: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration { field: "collection_window" })
        );
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let config = BatchConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

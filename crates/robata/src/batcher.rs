use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::communication::{PendingRequest, Pill, Ticket};
use crate::config::BatchConfig;
use crate::core::schedule::batch_loop;
use crate::core::worker::BatchWorkerHandle;
use crate::error::{ConfigError, SubmitError};
use crate::executor::{ModelExecutor, PromptTemplate};

/// Submission interface for batched text inference.
#[async_trait]
pub trait TextBatcher: Send + Sync {
    /// Enqueues one input and returns the ticket its result arrives on.
    ///
    /// Fails fast when the intake queue is at capacity; it never blocks the
    /// caller waiting for queue room.
    async fn submit(&self, input: &str) -> Result<Ticket, SubmitError>;
}

/// Batched inference engine: owns the intake queue and the single scheduler
/// worker that serializes all access to the model executor.
///
/// Dropping the engine shuts the worker down; tickets still in flight
/// resolve to a worker-stopped failure rather than hanging.
pub struct BatchInference {
    intake: mpsc::Sender<PendingRequest>,
    capacity: usize,
    handle: BatchWorkerHandle,
}

impl BatchInference {
    /// Validates `config` and spawns the scheduler worker around
    /// `executor`. The executor moves into the worker task; share it
    /// beforehand (e.g. behind an `Arc`) if other code needs a handle.
    pub fn new<E>(
        executor: E,
        template: PromptTemplate,
        config: BatchConfig,
    ) -> Result<Self, ConfigError>
    where
        E: ModelExecutor + 'static,
    {
        config.validate()?;

        let capacity = config.queue_capacity;
        let (intake, receiver) = mpsc::channel(capacity);

        let pill = Pill::new();
        let handle = BatchWorkerHandle::new(move |running, notifier| {
            tokio::spawn(async move {
                let _pill = pill;
                batch_loop(executor, template, config, receiver, running, notifier).await;
            })
        });

        Ok(Self {
            intake,
            capacity,
            handle,
        })
    }

    /// Stops the scheduler worker. Also happens on drop.
    pub fn shutdown(&mut self) {
        self.handle.shutdown();
    }
}

#[async_trait]
impl TextBatcher for BatchInference {
    async fn submit(&self, input: &str) -> Result<Ticket, SubmitError> {
        let (request, ticket) = PendingRequest::new(input.to_string());
        tracing::debug!(request = %request.id(), "enqueueing inference request");

        self.intake.try_send(request).map_err(|error| match error {
            TrySendError::Full(_) => SubmitError::QueueFull {
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => SubmitError::Closed,
        })?;

        Ok(ticket)
    }
}

//! The scheduling cycle: one serialized execution lane over the model
//! executor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Notify, mpsc};

use crate::communication::PendingRequest;
use crate::config::BatchConfig;
use crate::core::collector::{self, Collect};
use crate::error::GenerateError;
use crate::executor::{ModelExecutor, PromptTemplate};
use crate::outcome::Generation;

/// Long-lived worker loop. Owns the executor; nothing else may call it.
pub(crate) async fn batch_loop<E: ModelExecutor>(
    executor: E,
    template: PromptTemplate,
    config: BatchConfig,
    mut intake: mpsc::Receiver<PendingRequest>,
    running: Arc<AtomicBool>,
    notifier: Arc<Notify>,
) {
    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let collected = collector::collect_batch(
            &mut intake,
            &notifier,
            config.max_batch_size,
            config.collection_window,
        )
        .await;

        match collected {
            Collect::Batch(batch) => run_cycle(&executor, &template, &config, batch).await,
            Collect::Woken => continue,
            Collect::Closed => break,
        }
    }
    tracing::debug!("batch worker loop exiting");
}

/// Executes one batch and settles every member's gate, then releases
/// per-cycle executor resources. Infallible by design: any failure becomes
/// the outcome of every member.
async fn run_cycle<E: ModelExecutor>(
    executor: &E,
    template: &PromptTemplate,
    config: &BatchConfig,
    batch: Vec<PendingRequest>,
) {
    tracing::info!(size = batch.len(), "processing batch");

    match execute(executor, template, config, &batch).await {
        Ok(generations) => {
            for (request, generation) in batch.into_iter().zip(generations) {
                request.complete(Ok(generation));
            }
        }
        Err(error) => {
            tracing::error!(%error, "batch failed, failing all members");
            for request in batch {
                request.complete(Err(error.clone()));
            }
        }
    }

    // Runs on the failure path too; accelerator scratch must not outlive
    // the cycle.
    executor.release();
}

/// Formats, encodes, generates and decodes one batch.
///
/// The hard time budget covers only the `generate` call. Encoding and
/// decoding run in-process on short strings and are left unbounded.
async fn execute<E: ModelExecutor>(
    executor: &E,
    template: &PromptTemplate,
    config: &BatchConfig,
    batch: &[PendingRequest],
) -> Result<Vec<Generation>, GenerateError> {
    let mut encoded = Vec::with_capacity(batch.len());
    for request in batch {
        let prompt = template.format(&config.instruction, request.input(), "");
        encoded.push(executor.encode(&prompt).map_err(executor_error)?);
    }

    let outputs = tokio::time::timeout(
        config.generate_timeout,
        executor.generate(encoded, config.max_new_tokens, &config.sampling),
    )
    .await
    .map_err(|_| GenerateError::DeadlineExceeded(config.generate_timeout))?
    .map_err(executor_error)?;

    // Guard against a misbehaving executor; a short row set must fail the
    // batch rather than silently starve the tail members.
    if outputs.len() != batch.len() {
        return Err(GenerateError::Executor(format!(
            "executor returned {} rows for a batch of {}",
            outputs.len(),
            batch.len()
        )));
    }

    let mut generations = Vec::with_capacity(batch.len());
    for (request, output) in batch.iter().zip(&outputs) {
        let text = executor.decode(output).map_err(executor_error)?;
        // Counts are per member: this request's own raw input and its own
        // decoded output, in the executor's token units.
        let input_tokens = executor.encode(request.input()).map_err(executor_error)?.len();
        let output_tokens = executor.encode(&text).map_err(executor_error)?.len();
        generations.push(Generation {
            text,
            input_tokens,
            output_tokens,
        });
    }
    Ok(generations)
}

fn executor_error<E: std::error::Error>(error: E) -> GenerateError {
    GenerateError::Executor(error.to_string())
}

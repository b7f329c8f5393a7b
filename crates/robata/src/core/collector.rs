//! Window- and size-bounded batch collection.

use std::time::Duration;

use tokio::sync::{Notify, mpsc};
use tokio::time::Instant;

use crate::communication::PendingRequest;

/// What one collection attempt produced.
pub(crate) enum Collect {
    /// A non-empty batch, ready to dispatch.
    Batch(Vec<PendingRequest>),
    /// The shutdown notify fired before anything arrived; the caller should
    /// re-check its running flag.
    Woken,
    /// The intake queue is closed and drained.
    Closed,
}

/// Gathers the next batch from the intake queue.
///
/// The wait for the first member is unbounded (raced against `wake` so
/// shutdown can interrupt it); the collection window starts when the first
/// member arrives and bounds only the wait for subsequent members. Stops at
/// `max_size` members or window exhaustion, whichever comes first.
///
/// An empty batch is never returned: a cycle with no arrivals keeps waiting
/// instead of dispatching nothing.
pub(crate) async fn collect_batch(
    intake: &mut mpsc::Receiver<PendingRequest>,
    wake: &Notify,
    max_size: usize,
    window: Duration,
) -> Collect {
    let first = tokio::select! {
        received = intake.recv() => match received {
            Some(request) => request,
            None => return Collect::Closed,
        },
        _ = wake.notified() => return Collect::Woken,
    };

    let deadline = Instant::now() + window;
    let mut batch = vec![first];

    while batch.len() < max_size {
        match tokio::time::timeout_at(deadline, intake.recv()).await {
            Ok(Some(request)) => batch.push(request),
            // Queue closed mid-window: flush what we have, report Closed on
            // the next call.
            Ok(None) => break,
            // Window exhausted.
            Err(_) => break,
        }
    }

    Collect::Batch(batch)
}

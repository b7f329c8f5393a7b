use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::error::Elapsed;

use crate::error::GenerateError;
use crate::outcome::Outcome;

/// Read half of a completion gate: resolves to the one [`Outcome`] the
/// scheduler delivers for the paired request.
///
/// A ticket is single-use. Awaiting it consumes it, and so does [`wait`]:
/// a timed-out wait drops the receiver, which is how the scheduler's
/// eventual late signal learns that the waiter is gone.
///
/// If the worker stops before signaling (the write half is dropped), the
/// ticket resolves to a [`GenerateError::WorkerStopped`] failure rather than
/// surfacing a channel error.
///
/// [`wait`]: Ticket::wait
#[derive(Debug)]
pub struct Ticket {
    receiver: oneshot::Receiver<Outcome>,
}

impl Ticket {
    pub(crate) fn new(receiver: oneshot::Receiver<Outcome>) -> Self {
        Self { receiver }
    }

    /// Blocks the calling task until the gate is signaled or `limit`
    /// elapses, whichever first.
    pub async fn wait(self, limit: Duration) -> Result<Outcome, Elapsed> {
        tokio::time::timeout(limit, self).await
    }
}

impl Future for Ticket {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|received| match received {
                Ok(outcome) => outcome,
                Err(_closed) => Err(GenerateError::WorkerStopped),
            })
    }
}

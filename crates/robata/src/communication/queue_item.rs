use tokio::sync::oneshot;
use uuid::Uuid;

use crate::communication::Ticket;
use crate::outcome::Outcome;

/// One client submission paired with the write half of its completion gate.
///
/// A `PendingRequest` is created at submit time together with its [`Ticket`]
/// (the read half), travels through the intake queue, and is consumed by the
/// scheduler exactly once via [`complete`]. Because `complete` takes the
/// request by value, signaling a gate twice does not compile; there is no
/// runtime double-signal path to guard.
///
/// [`complete`]: PendingRequest::complete
pub struct PendingRequest {
    id: Uuid,
    input: String,
    gate: oneshot::Sender<Outcome>,
}

impl PendingRequest {
    /// Builds a request and the ticket its submitter will wait on.
    pub fn new(input: String) -> (Self, Ticket) {
        let (tx, rx) = oneshot::channel();
        let request = Self {
            id: Uuid::new_v4(),
            input,
            gate: tx,
        };
        (request, Ticket::new(rx))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The raw submitted text, before any prompt formatting.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Signals the gate with this request's one outcome.
    ///
    /// If the waiter already gave up (its wait timed out and the ticket was
    /// dropped), the outcome has nowhere to go and is discarded; that is the
    /// expected shape of a late signal, not an error.
    pub fn complete(self, outcome: Outcome) {
        if self.gate.send(outcome).is_err() {
            tracing::debug!(request = %self.id, "waiter gone, discarding late outcome");
        }
    }
}

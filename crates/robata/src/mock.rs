//! Deterministic executor for tests.
//!
//! Tokens are characters: `encode` maps each `char` to its scalar value and
//! `decode` reverses it, so token counts are simply character counts and
//! every row round-trips. `generate` echoes each prompt row and appends the
//! configured reply, which is the shape real causal decoding produces.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::executor::{ModelExecutor, SamplingOptions};

#[derive(Debug, Error)]
#[error("mock executor: {0}")]
pub struct MockError(pub &'static str);

pub struct MockExecutor {
    reply: String,
    /// Simulated generate latency.
    latency: Duration,
    /// Number of initial generate calls that fail outright.
    fail_first: AtomicUsize,
    /// Number of initial generate calls that never complete.
    stall_first: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
    releases: AtomicUsize,
}

impl MockExecutor {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            latency: Duration::from_millis(10),
            fail_first: AtomicUsize::new(0),
            stall_first: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
            releases: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_first(self, calls: usize) -> Self {
        self.fail_first.store(calls, Ordering::SeqCst);
        self
    }

    pub fn stalling_first(self, calls: usize) -> Self {
        self.stall_first.store(calls, Ordering::SeqCst);
        self
    }

    /// Sizes of every batch handed to `generate`, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    /// Whether two generate calls were ever in flight at once.
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    fn take_one(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Clears the in-flight flag when a generate call finishes or is dropped by
/// the scheduler's timeout.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelExecutor for MockExecutor {
    type Error = MockError;

    fn encode(&self, text: &str) -> Result<Vec<u32>, MockError> {
        Ok(text.chars().map(|c| c as u32).collect())
    }

    async fn generate(
        &self,
        batch: Vec<Vec<u32>>,
        _max_new_tokens: usize,
        _sampling: &SamplingOptions,
    ) -> Result<Vec<Vec<u32>>, MockError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        let _guard = InFlightGuard(&self.in_flight);

        self.batch_sizes.lock().unwrap().push(batch.len());

        if Self::take_one(&self.stall_first) {
            futures::future::pending::<()>().await;
            unreachable!("pending future resolved");
        }
        if Self::take_one(&self.fail_first) {
            return Err(MockError("synthetic generate failure"));
        }

        tokio::time::sleep(self.latency).await;

        let reply = self.encode(&self.reply)?;
        Ok(batch
            .into_iter()
            .map(|mut row| {
                row.extend_from_slice(&reply);
                row
            })
            .collect())
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, MockError> {
        tokens
            .iter()
            .map(|&t| char::from_u32(t).ok_or(MockError("token outside char range")))
            .collect()
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

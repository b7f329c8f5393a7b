//! # Robata
//!
//! A **ro**bust **bat**ched text-inference core for serving many concurrent
//! generation requests through one model.
//!
//! ## Overview
//!
//! This library converts a stream of independent text requests into bounded
//! batches, executes each batch through a model executor under a hard time
//! budget, and hands every request back exactly one result with per-request
//! token counts. It is designed as the engine behind an inference HTTP
//! front end: many producers enqueue, one scheduler drains.
//!
//! Key components include:
//!
//! - An opaque [`ModelExecutor`] seam (encode text, generate a batch,
//!   decode tokens) that keeps model loading and tensor handling out of the
//!   core
//! - A batch collector with a size bound and a collection window that
//!   starts at the first request of a cycle
//! - A single long-lived scheduler loop that serializes executor access and
//!   fans a batch-level failure out to every member
//! - A single-use completion gate ([`Ticket`]) carrying exactly one
//!   [`Outcome`] per request, safe against abandoned waiters
//!
//! ## Architecture
//!
//! ### Guarantees
//!
//! - Every accepted request resolves to exactly one [`Outcome`], success or
//!   failure, even when the executor errors or times out
//! - No dispatched batch exceeds the configured maximum size, and an empty
//!   batch is never dispatched; an idle window simply keeps waiting
//! - The executor's `generate` is never invoked concurrently; the one
//!   scheduler task owns it
//! - Within a batch, outcomes are delivered in submission order
//!
//! ### Backpressure
//!
//! The intake queue is bounded. When it is full, [`TextBatcher::submit`]
//! fails fast with a capacity error instead of queueing without limit;
//! callers decide whether to shed or retry.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = BatchInference::new(executor, PromptTemplate::alpaca(), BatchConfig::default())?;
//! let ticket = engine.submit("tell me about grills").await?;
//! match ticket.wait(Duration::from_secs(60)).await {
//!     Ok(Ok(generation)) => println!("{}", generation.text),
//!     Ok(Err(failure)) => eprintln!("generation failed: {failure}"),
//!     Err(_elapsed) => eprintln!("timed out waiting"),
//! }
//! ```

mod batcher;
mod communication;
mod config;
mod core;
mod error;
mod outcome;

pub mod executor;

#[cfg(test)]
pub(crate) mod mock;

pub use batcher::{BatchInference, TextBatcher};
pub use communication::Ticket;
pub use config::BatchConfig;
pub use error::{ConfigError, GenerateError, SubmitError};
pub use executor::{ModelExecutor, PromptTemplate, SamplingOptions};
pub use outcome::{Generation, Outcome};

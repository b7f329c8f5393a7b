//! Worker-loop machinery: the background task handle, the batch collector
//! and the scheduling cycle.
//!
//! Everything here is single-consumer by construction. One long-lived task
//! drains the intake queue, and that task is the only caller of the model
//! executor, which is what serializes executor access without an explicit
//! lock. If this is ever generalized to several worker loops sharing one
//! executor, the `generate` call in [`schedule`] must gain a mutual-exclusion
//! primitive; the single-loop shape is load-bearing today.

pub(crate) mod collector;
pub(crate) mod schedule;
pub(crate) mod worker;

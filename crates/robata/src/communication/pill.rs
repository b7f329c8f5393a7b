use std::thread;

/// Poison pill that surfaces a worker-task panic instead of letting waiters
/// hang on gates that will never be signaled.
///
/// The scheduler task owns one of these for its whole life. If the task
/// unwinds, the pill is dropped mid-panic and re-panics with a message that
/// names the worker, which keeps the failure visible in test harnesses and
/// panic hooks rather than manifesting as a silent stall.
pub struct Pill {}

impl Pill {
    pub fn new() -> Self {
        Self {}
    }
}

impl Drop for Pill {
    fn drop(&mut self) {
        if thread::panicking() {
            panic!("batch worker task panicked");
        }
    }
}

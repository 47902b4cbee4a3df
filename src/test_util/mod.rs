//! Test helpers: a scripted in-memory transport, and helpers for real sockets and for waiting on
//!  effects that happen on the sink's background thread.

pub mod fake_transport;
pub mod socket;

use std::time::{Duration, Instant};

/// Poll `condition` until it holds or `timeout` expires, returning the condition's final value
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

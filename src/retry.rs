//! Bounded retry with backoff
//!
//! One combinator shared by downloads, package installs and the service
//! start loop, instead of hand-rolled attempt counters at every call site.

use std::thread::sleep;
use std::time::Duration;

/// Default attempt count used across the installer
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default pause between attempts
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Run `op` up to `attempts` times, sleeping `backoff` between attempts.
///
/// The closure receives the 1-based attempt number. The last error is
/// returned when every attempt fails.
pub fn with_backoff<T, E, F>(attempts: u32, backoff: Duration, mut op: F) -> std::result::Result<T, E>
where
    F: FnMut(u32) -> std::result::Result<T, E>,
{
    let attempts = attempts.max(1);
    for attempt in 1..attempts {
        if let Ok(value) = op(attempt) {
            return Ok(value);
        }
        sleep(backoff);
    }
    op(attempts)
}

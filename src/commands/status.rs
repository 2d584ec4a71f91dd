//! Status command implementation
//!
//! Prints the idempotency report and nothing else. Pure observation; the
//! command never fails, so re-running it in scripts is always safe.

use crate::error::Result;
use crate::report;

pub fn run() -> Result<()> {
    report::run();
    Ok(())
}

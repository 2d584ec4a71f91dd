//! Log file initialization
//!
//! The console stays on the step/glyph display; full detail goes to a
//! persistent log file under the state directory for post-mortem reads.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::paths;

/// Initialize tracing: stderr at warn (debug with `--verbose`), plus a
/// non-ANSI file layer capturing everything at debug level.
///
/// Initialization failures are swallowed; a missing log file must never
/// block an install run.
pub fn init(verbose: bool) {
    let console_level = if verbose { "debug" } else { "warn" };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file_layer = paths::state_dir().ok().and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("setup.log"))
            .ok()?;
        Some(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug")),
        )
    });

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

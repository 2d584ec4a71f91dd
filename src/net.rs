//! Network reachability pre-check
//!
//! One short probe at run start gates every later network step, so an
//! offline host sees a single "no connectivity" notice instead of a slow
//! timeout per download.

use std::time::Duration;

use tracing::debug;

const PROBE_URL: &str = "https://api.github.com";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client with the timeouts every download in this crate uses
pub fn client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("voxd-setup/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

/// Probe the release API host once; any response (even an error status)
/// counts as reachable, only a transport failure means offline.
pub fn probe_reachability() -> bool {
    let client = match reqwest::blocking::Client::builder()
        .user_agent(concat!("voxd-setup/", env!("CARGO_PKG_VERSION")))
        .timeout(PROBE_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };
    match client.head(PROBE_URL).send() {
        Ok(_) => true,
        Err(err) => {
            debug!("reachability probe failed: {err}");
            false
        }
    }
}

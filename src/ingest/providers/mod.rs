pub mod rss;
pub mod social;
pub mod trends;

use std::time::Duration;

/// Shared HTTP client settings for outbound source fetches.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("buzz-lead-desk/0.1 (lead harvester)")
        .connect_timeout(Duration::from_secs(4))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "http client builder failed; using defaults");
            reqwest::Client::new()
        })
}

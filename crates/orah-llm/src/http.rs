//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

/// Create the shared HTTP client used by every provider.
///
/// Config: 30s connect timeout, 120s request timeout, rustls TLS,
/// `orah/{version}` user-agent, redirect limit 5.
///
/// The request timeout is an upper bound for a single HTTP exchange; callers
/// that need a tighter deadline per request wrap the call in
/// `tokio::time::timeout` themselves.
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(120))
        .user_agent(concat!("orah/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .expect("default HTTP client construction must not fail")
}

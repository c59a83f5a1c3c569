//! Integration tests for the stashd server.
//!
//! These tests require a running stashd server at `localhost:9292`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p stashd-integration -- --ignored
//! ```

use std::sync::Once;

mod test_transfer;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("STASHD_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:9292".to_owned())
}

/// Create an HTTP client pointing at the local server.
#[must_use]
pub fn client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Full URL for a key, unique per test run to avoid cross-test interference.
#[must_use]
pub fn object_url(prefix: &str) -> String {
    format!("{}/{}-{}", endpoint_url(), prefix, uuid::Uuid::new_v4())
}

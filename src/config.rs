//! Client configuration.
//!
//! [`ClientConfig`] controls the HTTP transport underneath every
//! [`Resource`](crate::Resource): timeouts, connection pooling and the TLS
//! verification policy. The defaults suit a local or well-behaved cluster.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `request_timeout_ms` | 30000 | Per-request timeout |
//! | `pool_max_idle_per_host` | 100 | Idle connections kept per host |
//! | `accept_invalid_certs` | false | Skip TLS certificate verification |
//!
//! ```
//! use couchdb_rs::ClientConfig;
//!
//! let config = ClientConfig {
//!     request_timeout_ms: 5000,
//!     ..Default::default()
//! };
//! assert!(!config.accept_invalid_certs);
//! ```

/// Default address of the CouchDB server when `COUCHDB_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5984";

/// Configuration for the HTTP transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum idle connections kept alive per host.
    pub pool_max_idle_per_host: usize,

    /// Disable TLS certificate verification for `https` base URLs.
    ///
    /// Verification is on by default; turning it off is an explicit,
    /// per-client decision.
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            request_timeout_ms: 30_000,
            pool_max_idle_per_host: 100,
            accept_invalid_certs: false,
        }
    }
}

/// The server base URL from the `COUCHDB_URL` environment variable, or
/// [`DEFAULT_BASE_URL`] when unset or empty.
pub fn default_server_url() -> String {
    match std::env::var("COUCHDB_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => DEFAULT_BASE_URL.to_string(),
    }
}

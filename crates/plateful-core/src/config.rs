// ── Runtime configuration ──
//
// Describes *how* to reach the remote data store and how long cached
// collections stay fresh. The embedding application constructs one and
// hands it to `Coordinator::new` — core never reads config files.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Configuration for one coordinator instance.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Store root URL (e.g. `https://xyz.supabase.co`).
    pub base_url: Url,
    /// Service key sent on every request.
    pub service_key: SecretString,
    /// How long a fetched collection counts as fresh before the next read
    /// schedules a background refetch.
    pub stale_window: Duration,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl CoreConfig {
    pub fn new(base_url: Url, service_key: SecretString) -> Self {
        Self {
            base_url,
            service_key,
            ..Self::default()
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            // Local BaaS stack default.
            base_url: Url::parse("http://127.0.0.1:54321").expect("static URL parses"),
            service_key: SecretString::from(String::new()),
            stale_window: Duration::from_secs(5 * 60),
            timeout: Duration::from_secs(30),
        }
    }
}

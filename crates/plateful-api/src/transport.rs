// Shared transport configuration for building reqwest::Client instances.
//
// The store client injects the service key on every request through
// default headers built here, keeping credential plumbing out of the
// per-endpoint code.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. Elapsed-time policy lives here, not in the
    /// coordinator: a timed-out call surfaces as a plain failure.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that authenticates with the given service key.
    ///
    /// The key is sent both as `apikey` and as a bearer token, which is what
    /// PostgREST-style stores expect for server-to-server access.
    pub fn build_client(&self, service_key: &SecretString) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();

        let mut key_value = HeaderValue::from_str(service_key.expose_secret())
            .map_err(|_| invalid_key_error())?;
        key_value.set_sensitive(true);
        headers.insert("apikey", key_value);

        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", service_key.expose_secret()))
                .map_err(|_| invalid_key_error())?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("plateful/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(Error::Network)
    }
}

fn invalid_key_error() -> Error {
    Error::Auth {
        status: 0,
        message: "service key contains non-header characters".into(),
    }
}

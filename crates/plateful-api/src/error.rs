use thiserror::Error;

/// Top-level error type for the `plateful-api` crate.
///
/// Covers every failure mode of the remote data store: transport faults,
/// auth rejection, validation rejection, server-side failure, and response
/// decoding. `plateful-core` maps these into user-facing diagnostics and
/// into its rollback decisions.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out before the store produced a response.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Store rejections ────────────────────────────────────────────
    /// The store rejected our credentials (401/403).
    #[error("Authentication rejected (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// The store rejected the request itself (other 4xx).
    #[error("Request rejected (HTTP {status}): {message}")]
    Validation {
        status: u16,
        message: String,
        /// Store-specific error code (e.g. `PGRST116`, `23505`).
        code: Option<String>,
    },

    /// The store failed server-side (5xx).
    #[error("Store error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body did not decode, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Decode { message: String, body: String },
}

/// Coarse failure classification consumed by the mutation coordinator.
///
/// Every remote failure maps to exactly one kind; the coordinator rolls
/// back on all of them and retries none of them, but callers use the kind
/// to decide whether re-submission could ever succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The call failed before or without a usable server response.
    /// Re-submission may succeed.
    Network,
    /// The store understood and rejected the request. Re-submission of
    /// the same payload will fail again.
    Validation,
    /// Credentials are bad or expired. Never worth retrying as-is.
    Auth,
}

impl Error {
    /// Classify this failure into the coordinator-facing taxonomy.
    pub fn classify(&self) -> FailureKind {
        match self {
            Self::Auth { .. } => FailureKind::Auth,
            Self::Validation { .. } | Self::InvalidUrl(_) => FailureKind::Validation,
            Self::Network(_) | Self::Timeout { .. } | Self::Remote { .. } | Self::Decode { .. } => {
                FailureKind::Network
            }
        }
    }

    /// Returns `true` if this is a transient fault a later attempt might clear.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::Remote { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if re-authentication might resolve this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Returns `true` if the store reported the target row missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Validation { status: 404, .. })
    }
}

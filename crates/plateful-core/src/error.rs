// ── Core error types ──
//
// User-facing errors from plateful-core. These are NOT transport-specific --
// consumers never see HTTP statuses or JSON parse failures directly. The
// `From<plateful_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants, and the coordinator re-raises them only
// after rollback and invalidation have completed.

use thiserror::Error;

use crate::mutation::MutationOutcome;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote store errors ──────────────────────────────────────────
    #[error("Remote store unavailable: {message}")]
    RemoteUnavailable { message: String },

    #[error("Remote call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Store rejected the request: {message}")]
    ValidationFailed {
        message: String,
        /// Store-specific error code, when one was reported.
        code: Option<String>,
    },

    #[error("Not found: {message}")]
    NotFound { message: String },

    // ── Batch errors ─────────────────────────────────────────────────
    #[error(transparent)]
    Batch(#[from] BatchError),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if re-submitting the same mutation could ever succeed.
    /// Rollback happens on every failure regardless; this only informs the
    /// caller's re-submission decision (the coordinator itself never retries).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteUnavailable { .. } | Self::Timeout { .. } => true,
            Self::Batch(batch) => batch.failures().all(CoreError::is_retryable),
            _ => false,
        }
    }
}

/// Aggregate failure of a batch mutation.
///
/// The cache was rolled back uniformly, but the per-mutation outcomes are
/// preserved in submission order so the caller can see which remote calls
/// succeeded server-side and decide what to re-submit.
#[derive(Debug, Error)]
#[error("Batch mutation failed: {}/{} remote calls failed", self.failed_count(), self.outcomes.len())]
pub struct BatchError {
    pub outcomes: Vec<Result<MutationOutcome, CoreError>>,
}

impl BatchError {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_err()).count()
    }

    /// The individual failures, in submission order.
    pub fn failures(&self) -> impl Iterator<Item = &CoreError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<plateful_api::Error> for CoreError {
    fn from(err: plateful_api::Error) -> Self {
        match err {
            plateful_api::Error::Auth { message, .. } => CoreError::AuthFailed { message },
            plateful_api::Error::Validation {
                status: 404,
                message,
                ..
            } => CoreError::NotFound { message },
            plateful_api::Error::Validation { message, code, .. } => {
                CoreError::ValidationFailed { message, code }
            }
            plateful_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            plateful_api::Error::Network(e) => CoreError::RemoteUnavailable {
                message: e.to_string(),
            },
            plateful_api::Error::Remote { status, message } => CoreError::RemoteUnavailable {
                message: format!("HTTP {status}: {message}"),
            },
            plateful_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            plateful_api::Error::Decode { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_auth_maps_to_auth_failed() {
        let err = CoreError::from(plateful_api::Error::Auth {
            status: 401,
            message: "JWT expired".into(),
        });
        assert!(matches!(err, CoreError::AuthFailed { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_404_maps_to_not_found() {
        let err = CoreError::from(plateful_api::Error::Validation {
            status: 404,
            message: "no rows".into(),
            code: None,
        });
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn server_failure_is_retryable() {
        let err = CoreError::from(plateful_api::Error::Remote {
            status: 503,
            message: "unavailable".into(),
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn batch_error_reports_partial_results() {
        let batch = BatchError {
            outcomes: vec![
                Err(CoreError::Timeout { timeout_secs: 30 }),
                Err(CoreError::ValidationFailed {
                    message: "bad".into(),
                    code: None,
                }),
            ],
        };
        assert_eq!(batch.failed_count(), 2);
        assert!(!CoreError::Batch(batch).is_retryable());
    }
}

//! Error types for s3v-probe
//!
//! Every AWS SDK failure is mapped into a [`ProbeError`] variant by
//! [`crate::classify`], so callers can branch on the kind of failure
//! (missing resource, already exists, throttled, ...) instead of on
//! service-specific error codes.

use s3v_filter::FilterError;

/// Result type alias for probe operations
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Errors that can occur while talking to S3 Vectors / STS / S3
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Credentials missing, expired, or rejected
    #[error("authentication error: {0}")]
    Auth(String),

    /// Credentials valid but the call is not allowed
    #[error("permission denied: {0}")]
    Permission(String),

    /// Bucket, index, or vector does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource already exists (create raced or was repeated)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request rejected by the service as malformed
    #[error("validation error: {0}")]
    Validation(String),

    /// Throttled or over quota
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Request timed out
    #[error("timeout: {0}")]
    Timeout(String),

    /// Network / transport failure or service-side outage
    #[error("connection error: {0}")]
    Connection(String),

    /// Response could not be parsed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Similarity threshold could not be applied to the result set
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Results came back that do not satisfy the metadata filter
    #[error("filter validation failed ({filter}); non-matching vectors returned: {keys:?}")]
    FilterViolation { filter: String, keys: Vec<String> },

    /// Internal / unexpected error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProbeError {
    /// Whether the failure is transient and the call may succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProbeError::RateLimited(_) | ProbeError::Timeout(_) | ProbeError::Connection(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProbeError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ProbeError::Conflict(_))
    }

    /// Prefix the message with the operation that failed, keeping the
    /// variant intact
    pub fn context(self, op: &str) -> Self {
        match self {
            ProbeError::Config(m) => ProbeError::Config(format!("{op}: {m}")),
            ProbeError::Auth(m) => ProbeError::Auth(format!("{op}: {m}")),
            ProbeError::Permission(m) => ProbeError::Permission(format!("{op}: {m}")),
            ProbeError::NotFound(m) => ProbeError::NotFound(format!("{op}: {m}")),
            ProbeError::Conflict(m) => ProbeError::Conflict(format!("{op}: {m}")),
            ProbeError::Validation(m) => ProbeError::Validation(format!("{op}: {m}")),
            ProbeError::RateLimited(m) => ProbeError::RateLimited(format!("{op}: {m}")),
            ProbeError::Timeout(m) => ProbeError::Timeout(format!("{op}: {m}")),
            ProbeError::Connection(m) => ProbeError::Connection(format!("{op}: {m}")),
            ProbeError::Serialization(m) => ProbeError::Serialization(format!("{op}: {m}")),
            ProbeError::Internal(m) => ProbeError::Internal(format!("{op}: {m}")),
            other @ (ProbeError::Filter(_) | ProbeError::FilterViolation { .. }) => other,
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ProbeError {
    fn from(err: validator::ValidationErrors) -> Self {
        ProbeError::Config(err.to_string())
    }
}

//! AWS SDK error classification
//!
//! All `SdkError` variants are explicitly handled:
//!
//! - `SdkError::ServiceError`: mapped by service error code, then by HTTP
//!   status, then by message substrings
//!   - `AccessDeniedException` → `ProbeError::Permission`
//!   - `UnrecognizedClientException`, `ExpiredToken*`,
//!     `InvalidClientTokenId`, `SignatureDoesNotMatch` → `ProbeError::Auth`
//!   - `ValidationException` → `ProbeError::Validation`
//!   - `NotFoundException`, `ResourceNotFoundException`, `NoSuchBucket`,
//!     `NotFound` → `ProbeError::NotFound`
//!   - `ConflictException`, `ResourceAlreadyExistsException`,
//!     `AlreadyExists` → `ProbeError::Conflict`
//!   - `TooManyRequestsException`, `ThrottlingException`,
//!     `ServiceQuotaExceededException` → `ProbeError::RateLimited`
//!   - `InternalServerException`, `ServiceUnavailableException` →
//!     `ProbeError::Connection` (retryable)
//! - `SdkError::TimeoutError` → `ProbeError::Timeout`
//! - `SdkError::DispatchFailure` → `ProbeError::Connection`
//! - `SdkError::ConstructionFailure` → `ProbeError::Config`
//! - `SdkError::ResponseError` → `ProbeError::Serialization`
//!
//! STS, S3 and S3 Vectors share the same smithy `SdkError` type, so one
//! classifier serves all three clients.

use crate::error::ProbeError;
use aws_sdk_s3vectors::error::{ProvideErrorMetadata, SdkError};

/// Maximum error message length to prevent log amplification.
const MAX_ERROR_LEN: usize = 512;

/// Truncate a message to `MAX_ERROR_LEN` bytes respecting UTF-8.
#[inline]
pub(crate) fn truncated(msg: &str) -> String {
    if msg.len() <= MAX_ERROR_LEN {
        msg.to_string()
    } else {
        let mut end = MAX_ERROR_LEN;
        while end > 0 && !msg.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &msg[..end])
    }
}

/// Classify any smithy `SdkError` into a typed [`ProbeError`].
pub fn classify_sdk_error<E>(err: &SdkError<E>) -> ProbeError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    match err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.err();
            let code = service_err.code();
            let msg = truncated(&match (code, service_err.message()) {
                (Some(code), Some(message)) => format!("{code}: {message}"),
                (Some(code), None) => code.to_string(),
                (None, Some(message)) => message.to_string(),
                (None, None) => format!("{service_err:?}"),
            });
            classify_service_error(code, ctx.raw().status().as_u16(), &msg)
        }
        SdkError::TimeoutError(_) => ProbeError::Timeout("operation timed out".to_string()),
        SdkError::DispatchFailure(e) => {
            ProbeError::Connection(truncated(&format!("dispatch failure: {:?}", e)))
        }
        SdkError::ConstructionFailure(e) => {
            ProbeError::Config(truncated(&format!("request construction failure: {:?}", e)))
        }
        SdkError::ResponseError(e) => {
            ProbeError::Serialization(truncated(&format!("response error: {:?}", e)))
        }
        _ => ProbeError::Internal(truncated(&format!("unknown SDK error: {:?}", err))),
    }
}

/// Classify a service error by its error code, falling back to the HTTP
/// status and then to the message text.
pub fn classify_service_error(code: Option<&str>, status: u16, msg: &str) -> ProbeError {
    let code = code.unwrap_or_default().to_ascii_lowercase();
    match code.as_str() {
        "accessdeniedexception" | "accessdenied" => ProbeError::Permission(msg.to_string()),
        "unrecognizedclientexception"
        | "invalidclienttokenid"
        | "expiredtoken"
        | "expiredtokenexception"
        | "signaturedoesnotmatch" => ProbeError::Auth(msg.to_string()),
        "validationexception" | "invalidrequestexception" => {
            ProbeError::Validation(msg.to_string())
        }
        "notfoundexception" | "resourcenotfoundexception" | "nosuchbucket" | "notfound" => {
            ProbeError::NotFound(msg.to_string())
        }
        "conflictexception" | "resourcealreadyexistsexception" | "alreadyexists" => {
            ProbeError::Conflict(msg.to_string())
        }
        "toomanyrequestsexception" | "throttlingexception" | "servicequotaexceededexception" => {
            ProbeError::RateLimited(msg.to_string())
        }
        "internalserverexception" | "internalfailure" | "serviceunavailableexception" => {
            ProbeError::Connection(msg.to_string())
        }
        _ => match status {
            401 => ProbeError::Auth(msg.to_string()),
            403 => ProbeError::Permission(msg.to_string()),
            404 => ProbeError::NotFound(msg.to_string()),
            409 => ProbeError::Conflict(msg.to_string()),
            429 => ProbeError::RateLimited(msg.to_string()),
            500..=599 => ProbeError::Connection(msg.to_string()),
            _ => classify_error_message(msg),
        },
    }
}

/// Fallback classification based on error message substrings.
pub fn classify_error_message(msg: &str) -> ProbeError {
    let lower = msg.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        ProbeError::Timeout(msg.to_string())
    } else if lower.contains("throttl") || lower.contains("rate") || lower.contains("too many") {
        ProbeError::RateLimited(msg.to_string())
    } else if lower.contains("access denied")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
    {
        ProbeError::Auth(msg.to_string())
    } else if lower.contains("not found") || lower.contains("does not exist") {
        ProbeError::NotFound(msg.to_string())
    } else if lower.contains("already exists") {
        ProbeError::Conflict(msg.to_string())
    } else if lower.contains("validation")
        || lower.contains("invalid")
        || lower.contains("malformed")
    {
        ProbeError::Validation(msg.to_string())
    } else if lower.contains("connection")
        || lower.contains("unavailable")
        || lower.contains("refused")
        || lower.contains("reset")
    {
        ProbeError::Connection(msg.to_string())
    } else {
        ProbeError::Internal(msg.to_string())
    }
}

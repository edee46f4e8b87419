//! Error taxonomy and retry classification for the locking API.
//!
//! [`ApiError`] names the phase a call failed in. A transport reports its
//! failures through these variants so callers can react the same way whatever
//! transport is in use.
//!
//! [`RetryPolicy`] is a hint for callers that compose retry above the
//! [`crate::Client`]. The client itself performs exactly one attempt.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SchemaViolation;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: connectivity failures, timeouts, `429` and `5xx`
///   status responses.
/// - `NonRetryable` errors: invalid endpoint, malformed request, undecodable
///   body, schema violations, `4xx` status responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt (from `Retry-After`).
        /// `None` means apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried unchanged.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while constructing a client, driving a call through a
/// [`crate::Lifecycle`], or validating a payload.
///
/// Any error returned from [`crate::Client::call`] means the call did not take
/// effect as far as the caller is concerned: the decode target is left empty.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base endpoint could not be parsed, or the transport could not be
    /// configured. No client is produced.
    #[error("Invalid endpoint '{endpoint}': {message}")]
    Construction {
        /// The endpoint string as supplied by the caller. Empty when a
        /// transport rejected its own configuration before any endpoint was
        /// known.
        endpoint: String,
        /// Description of the parse failure.
        message: String,
    },

    /// The request descriptor cannot be expressed in the transport's
    /// addressing or encoding scheme.
    ///
    /// Produced by: [`crate::Lifecycle::build`].
    #[error("Cannot build {method} {path}: {message}")]
    Build {
        /// Method of the offending descriptor.
        method: crate::Method,
        /// Path of the offending descriptor.
        path: String,
        /// Description of what could not be expressed.
        message: String,
    },

    /// The round trip did not complete (connection refused, reset, timeout).
    ///
    /// Produced by: [`crate::Lifecycle::execute`].
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the failure, as reported by the transport.
        message: String,
        /// `true` if the failure was a timeout.
        timed_out: bool,
    },

    /// The server answered with a failure status.
    ///
    /// Produced by: [`crate::Lifecycle::execute`].
    #[error("Server responded with status {status}: {message}")]
    Status {
        /// Numeric status code (HTTP semantics).
        status: u16,
        /// Server-supplied message, or a summary of the response body.
        message: String,
        /// Back-off requested by the server, if any.
        retry_after: Option<Duration>,
    },

    /// The response body did not match the shape of the decode target.
    ///
    /// Produced by: [`crate::DecodeTarget::decode`] during
    /// [`crate::Lifecycle::execute`].
    #[error("Cannot decode response into {target}: {message}")]
    Decode {
        /// Type name of the decode target.
        target: &'static str,
        /// Description of the shape mismatch.
        message: String,
    },

    /// Releasing the resources held by a response failed.
    ///
    /// Produced by: [`crate::Lifecycle::cleanup`].
    #[error("Cleanup failed: {message}")]
    Cleanup {
        /// Description of the failure.
        message: String,
    },

    /// A payload broke a structural rule.
    ///
    /// Produced at validation boundaries, never inside [`crate::Client::call`].
    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}

impl ApiError {
    /// Classifies this error for callers that implement their own retry.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Status {
                status,
                retry_after,
                ..
            } if *status == 408 || *status == 429 || *status >= 500 => RetryPolicy::Retryable {
                after: *retry_after,
            },
            _ => RetryPolicy::NonRetryable,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn status(status: u16, retry_after: Option<Duration>) -> ApiError {
        ApiError::Status {
            status,
            message: "nope".to_string(),
            retry_after,
        }
    }

    #[rstest]
    #[case(status(429, Some(Duration::from_secs(3))), RetryPolicy::Retryable { after: Some(Duration::from_secs(3)) })]
    #[case(status(503, None), RetryPolicy::Retryable { after: None })]
    #[case(status(408, None), RetryPolicy::Retryable { after: None })]
    #[case(status(404, None), RetryPolicy::NonRetryable)]
    #[case(status(409, Some(Duration::from_secs(1))), RetryPolicy::NonRetryable)]
    #[case(ApiError::Transport { message: "reset".to_string(), timed_out: false }, RetryPolicy::Retryable { after: None })]
    #[case(ApiError::Cleanup { message: "double release".to_string() }, RetryPolicy::NonRetryable)]
    #[case(ApiError::Decode { target: "LockResponse", message: "eof".to_string() }, RetryPolicy::NonRetryable)]
    fn classifies_retryability(#[case] err: ApiError, #[case] expected: RetryPolicy) {
        assert_eq!(err.retry_policy(), expected);
    }

    #[test]
    fn schema_violations_convert_and_display_transparently() {
        let violation = SchemaViolation::MutuallyExclusive {
            payload: "LockResponse",
            first: "err",
            second: "commit_needed",
        };
        let err = ApiError::from(violation.clone());
        assert_eq!(err.to_string(), violation.to_string());
    }
}

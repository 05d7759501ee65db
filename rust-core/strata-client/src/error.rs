// SPDX-License-Identifier: PMPL-1.0-or-later
//! Transport error types.

use thiserror::Error;

/// Errors reported by an attribute store client.
///
/// The mapping layer treats these as opaque: it propagates them unchanged
/// and never retries. Retry policy lives in
/// [`RetryStore`](crate::retry::RetryStore) alone.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The addressed domain does not exist.
    #[error("no such domain: {0}")]
    NoSuchDomain(String),

    /// The select expression could not be parsed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The supplied pagination token was not produced by this store.
    #[error("invalid pagination token: {0}")]
    InvalidNextToken(String),

    /// The service rejected the request due to throttling.
    #[error("request throttled: {0}")]
    Throttled(String),

    /// A server-side failure with an HTTP-style status code.
    #[error("service error ({status}): {message}")]
    Service {
        /// Status code reported by the service.
        status: u16,
        /// Human-readable failure description.
        message: String,
    },

    /// A network-level failure with no server response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Whether retrying the operation can reasonably succeed.
    ///
    /// Only throttling and server-side (5xx) failures qualify; client
    /// errors and raw network failures are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Throttled(_) => true,
            ClientError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

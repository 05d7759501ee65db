// SPDX-License-Identifier: PMPL-1.0-or-later
//! Mapper error types.

use thiserror::Error;

use strata_client::ClientError;
use strata_format::FormatError;

/// Errors reported by the record mapper.
#[derive(Debug, Error)]
pub enum MapperError {
    /// The record's key field is missing, null, or empty.
    ///
    /// Raised before any store call is made, so a failed `put` never
    /// leaves a half-written item behind.
    #[error("record has no usable value for key field `{0}`")]
    InvalidIdentifier(String),

    /// Flattening or value codec failure.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Transport failure from the underlying store client.
    #[error(transparent)]
    Client(#[from] ClientError),
}

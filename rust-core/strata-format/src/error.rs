// SPDX-License-Identifier: PMPL-1.0-or-later
//! Format error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding attribute values.
#[derive(Debug, Error)]
pub enum FormatError {
    /// A stored value could not be parsed under the JSON encoding.
    ///
    /// Never raised under [`Encoding::Text`](crate::Encoding::Text), where
    /// unparseable input falls back to a literal string.
    #[error("failed to decode attribute value {text:?}: {source}")]
    Decode {
        /// The raw attribute text that failed to parse.
        text: String,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The record did not serialize to a JSON object.
    ///
    /// Only maps and structs with named fields can be flattened into
    /// attribute paths; scalars and sequences at the top level cannot.
    #[error("record did not serialize to an object (got {0})")]
    NotAnObject(String),

    /// Serialization to or reconstruction from `serde_json::Value` failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

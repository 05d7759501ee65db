// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Scalar value codec for Strata.
//
// Every attribute stored in the backing store is a string. This module
// defines the two supported encodings for mapping typed values onto those
// strings and back. The same codec is used by the flatten engine (storage)
// and the select builder (queries), so predicate literals are always
// byte-identical to stored attributes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FormatError;

/// How scalar values are written to, and read from, attribute strings.
///
/// The default `Json` encoding serializes every value, including strings,
/// as self-describing JSON so type information survives the round trip.
/// The cost is that stored strings are double-quoted (`"\"abc\""`), which
/// makes hand-written queries against the domain awkward.
///
/// The `Text` encoding stores strings as bare literals instead. Decoding
/// still attempts a JSON parse first and only falls back to the raw string
/// when the parse fails, which imposes two documented limitations:
///
/// 1. String fields holding pure-numeric content (house numbers, zip
///    codes) decode as numbers. Countermeasure: type numbers as numbers,
///    or guarantee at least one non-numeric character.
/// 2. String fields that happen to contain valid JSON (`"{}"`, `"[1]"`)
///    decode as that value. Countermeasure: prefix such strings with a
///    character that makes the parse fail.
///
/// These are contracts to design around, not defects: callers that rule
/// them out a priori get unquoted values and far friendlier queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Self-describing JSON for every value. Type-faithful, strings quoted.
    #[default]
    Json,
    /// Strings stored as bare literals; everything else as JSON.
    Text,
}

/// Encode a single value into its attribute string representation.
pub fn encode(value: &Value, encoding: Encoding) -> String {
    match (encoding, value) {
        (Encoding::Text, Value::String(text)) => text.clone(),
        _ => value.to_string(),
    }
}

/// Decode an attribute string back into a value.
///
/// A JSON parse is attempted first regardless of encoding. On failure,
/// `Text` recovers the raw input as a string, while `Json` surfaces a
/// [`FormatError::Decode`].
pub fn decode(text: &str, encoding: Encoding) -> Result<Value, FormatError> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(source) => match encoding {
            Encoding::Text => Ok(Value::String(text.to_string())),
            Encoding::Json => Err(FormatError::Decode {
                text: text.to_string(),
                source,
            }),
        },
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Strata Attribute Format
//
// This crate converts typed records into the flat attribute-name/value
// representation used by sparse key/attribute stores, and back. It holds
// no state and performs no I/O: every call is a pure computation over its
// inputs.
//
// # Modules
//
// - [`encoding`] -- The scalar value codec and the `Encoding` policy enum.
// - [`flatten`] -- The flatten/unflatten engine over dot-path attributes.
// - [`error`] -- The `FormatError` enum.
//
// # Example
//
// ```rust
// use strata_format::{flatten, unflatten_value, FormatOptions};
// use serde_json::json;
//
// let record = json!({"name": "gear", "spec": {"teeth": 42}});
// let options = FormatOptions::default();
//
// let attrs = flatten(&record, &options).unwrap();
// assert_eq!(attrs["spec.teeth"], strata_format::AttrValue::Single("42".into()));
//
// let back = unflatten_value(&attrs, &options).unwrap();
// assert_eq!(back, record);
// ```

pub mod encoding;
pub mod error;
pub mod flatten;

// Re-export the most commonly used types at the crate root for convenience.
pub use encoding::{decode, encode, Encoding};
pub use error::FormatError;
pub use flatten::{flatten, unflatten, unflatten_value, AttrValue, AttributeMap, FormatOptions};

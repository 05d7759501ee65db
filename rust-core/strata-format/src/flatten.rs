// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Flatten/unflatten engine for Strata.
//
// Converts arbitrarily nested records into flat attribute maps and back.
// Nested structure fields become dot-joined attribute paths (`a.b.c`);
// array fields either expand into one attribute entry per element under a
// `[]`-suffixed name, or serialize as a single JSON value, depending on
// the configured multi-attribute mode. All leaf values pass through the
// scalar codec in `crate::encoding`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::encoding::{decode, encode, Encoding};
use crate::error::FormatError;

/// Marker suffix for attribute names holding one entry per array element.
const ARRAY_SUFFIX: &str = "[]";

/// An encoded attribute value: a single string, or an ordered list of
/// strings for multi-valued (`name[]`) attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// One encoded value under a plain attribute name.
    Single(String),
    /// One encoded value per array element, under a `name[]` attribute.
    Multi(Vec<String>),
}

/// A flat mapping from attribute name to encoded value(s).
///
/// Names for nested fields are dot-joined paths. A name ending in `[]`
/// always maps to [`AttrValue::Multi`]; every other name maps to
/// [`AttrValue::Single`]. Iteration order is deterministic (sorted by
/// name) but carries no semantic meaning.
pub type AttributeMap = BTreeMap<String, AttrValue>;

/// Options controlling how records are flattened and unflattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Scalar value encoding policy.
    #[serde(default)]
    pub encoding: Encoding,
    /// When enabled (the default), arrays expand into one attribute entry
    /// per element under a `[]`-suffixed name. When disabled, the whole
    /// array is stored as a single JSON value under the plain name.
    #[serde(default = "default_multiple")]
    pub multiple: bool,
}

fn default_multiple() -> bool {
    true
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            multiple: true,
        }
    }
}

/// Flatten a record into an attribute map.
///
/// The record must serialize to a JSON object. The input is borrowed and
/// never mutated; an empty record produces an empty map.
pub fn flatten<T: Serialize>(
    record: &T,
    options: &FormatOptions,
) -> Result<AttributeMap, FormatError> {
    let value = serde_json::to_value(record)?;
    let object = match value {
        Value::Object(object) => object,
        other => return Err(FormatError::NotAnObject(json_kind(&other).to_string())),
    };
    let mut attrs = AttributeMap::new();
    flatten_object(&object, options, &mut Vec::new(), &mut attrs);
    Ok(attrs)
}

fn flatten_object(
    object: &Map<String, Value>,
    options: &FormatOptions,
    path: &mut Vec<String>,
    attrs: &mut AttributeMap,
) {
    for (name, value) in object {
        match value {
            // Recurse on nested objects, extending the dot path.
            Value::Object(inner) => {
                path.push(name.clone());
                flatten_object(inner, options, path, attrs);
                path.pop();
            }
            // Expand arrays element-wise under the `[]`-suffixed name.
            // An empty array keeps its (empty) entry so it round-trips
            // instead of being dropped.
            Value::Array(items) if options.multiple => {
                let encoded = items
                    .iter()
                    .map(|item| encode(item, options.encoding))
                    .collect();
                attrs.insert(
                    join_path(path, &format!("{name}{ARRAY_SUFFIX}")),
                    AttrValue::Multi(encoded),
                );
            }
            // Everything else, including whole arrays when multi-attribute
            // mode is off, encodes as one value via the codec.
            other => {
                attrs.insert(
                    join_path(path, name),
                    AttrValue::Single(encode(other, options.encoding)),
                );
            }
        }
    }
}

fn join_path(path: &[String], name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path.join("."), name)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Unflatten an attribute map into a typed record.
pub fn unflatten<T: DeserializeOwned>(
    attrs: &AttributeMap,
    options: &FormatOptions,
) -> Result<T, FormatError> {
    let value = unflatten_value(attrs, options)?;
    Ok(serde_json::from_value(value)?)
}

/// Unflatten an attribute map into a JSON object.
///
/// This is the untyped half of [`unflatten`], used for partial reads
/// where only a subset of attribute paths is present.
pub fn unflatten_value(
    attrs: &AttributeMap,
    options: &FormatOptions,
) -> Result<Value, FormatError> {
    let mut root = Map::new();
    for (name, value) in attrs {
        let (name, decoded) = match value {
            AttrValue::Multi(items) => {
                let decoded = items
                    .iter()
                    .map(|item| decode(item, options.encoding))
                    .collect::<Result<Vec<_>, _>>()?;
                (
                    name.strip_suffix(ARRAY_SUFFIX).unwrap_or(name),
                    Value::Array(decoded),
                )
            }
            AttrValue::Single(text) => match name.strip_suffix(ARRAY_SUFFIX) {
                // A lone `[]` attribute still reconstructs as an array.
                Some(stripped) => (
                    stripped,
                    Value::Array(vec![decode(text, options.encoding)?]),
                ),
                None => (name.as_str(), decode(text, options.encoding)?),
            },
        };
        assign(&mut root, &mut name.split('.'), decoded);
    }
    Ok(Value::Object(root))
}

/// Assign `value` into `object` at the dot-split path, merging shared
/// prefixes into the same nested object. Path segments are always field
/// names, never positional indices, so numeric-looking segments create
/// object keys.
fn assign<'a>(
    object: &mut Map<String, Value>,
    segments: &mut dyn Iterator<Item = &'a str>,
    value: Value,
) {
    // An AttributeMap name always has at least one segment.
    let Some(head) = segments.next() else {
        return;
    };
    let mut segments = segments.peekable();
    if segments.peek().is_none() {
        object.insert(head.to_string(), value);
        return;
    }
    let slot = object
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        // A leaf and a nested path collided on the same name; the nested
        // structure wins.
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(inner) = slot {
        assign(inner, &mut segments, value);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
//! Strata Select
//!
//! Query builder for the restricted SQL dialect spoken by sparse
//! key/attribute stores (SELECT over one domain, conjoined WHERE
//! predicates, a single ORDER BY attribute, LIMIT). Predicate arguments
//! are serialized through the `strata-format` codec so literals compare
//! byte-for-byte against stored attributes.

pub mod builder;
pub mod expr;

pub use builder::{Direction, Select, SelectArg};
pub use expr::Expr;

// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Select query builder for Strata.
//
// Accumulates WHERE/ORDER BY/LIMIT state against one domain and renders
// the store's SQL-subset text form. Predicate arguments are serialized
// through the same codec rules as stored attributes: a literal that is
// not byte-identical to the stored encoding would silently match nothing,
// so the builder and the flatten engine must never diverge.

use std::fmt;

use serde_json::Value;
use strata_format::{encode, Encoding};

use crate::expr::Expr;

/// A positional argument for `?` placeholders in a filter template.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectArg {
    /// A concrete value, serialized under the builder's encoding.
    Value(Value),
    /// An absent value. Renders as the word `'undefined'` under the JSON
    /// encoding; dropped from substitution entirely under the text
    /// encoding. Placeholders beyond the supplied argument list behave
    /// the same way.
    Undefined,
}

impl<T: Into<Value>> From<T> for SelectArg {
    fn from(value: T) -> Self {
        SelectArg::Value(value.into())
    }
}

/// Sort direction for the single ORDER BY clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (the default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "ASC"),
            Direction::Desc => write!(f, "DESC"),
        }
    }
}

/// An accumulating builder for one select query against one domain.
///
/// Builders are single-use: build up the state from one caller, render
/// with [`Select::to_sql`] or `to_string()`, and discard. Filters added
/// through [`Select::filter`] and [`Select::filter_expr`] are conjoined
/// with AND.
///
/// # Example
///
/// ```rust
/// use strata_select::{Direction, Select};
/// use strata_format::Encoding;
///
/// let query = Select::new("inventory", Encoding::Json)
///     .filter("`kind` = ?", &["gear".into()])
///     .order("`name`", Direction::Asc)
///     .limit(20);
/// assert_eq!(
///     query.to_sql(),
///     "SELECT * FROM `inventory` WHERE (`kind` = '\"gear\"') ORDER BY `name` ASC LIMIT 20"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    domain: String,
    encoding: Encoding,
    clauses: Vec<String>,
    order: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl Select {
    /// Create a builder selecting all attributes from `domain`.
    pub fn new(domain: &str, encoding: Encoding) -> Self {
        Self {
            domain: domain.to_string(),
            encoding,
            clauses: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Seed the builder with a mandatory record-type equality filter.
    ///
    /// The filter becomes the first WHERE clause; everything added later
    /// AND-combines after it. The tag value is encoded with the builder's
    /// codec rules so it matches the stored discriminator attribute.
    pub fn with_record_type(mut self, attr: &str, tag: &str) -> Self {
        let rendered = render_arg(&SelectArg::from(tag), false, self.encoding)
            .unwrap_or_else(|| "''".to_string());
        self.clauses
            .insert(0, format!("{} = {}", quote_ident(attr), rendered));
        self
    }

    /// Add a WHERE clause, binding `?` placeholders to `args`.
    ///
    /// Each argument is serialized through the codec for this builder's
    /// encoding. A template containing a case-insensitive ` LIKE ` is the
    /// one special case: its string argument keeps its `%` wildcard
    /// markers and only the non-wildcard boundaries are quote-wrapped,
    /// since JSON-quoting the whole pattern would corrupt it.
    pub fn filter(mut self, template: &str, args: &[SelectArg]) -> Self {
        self.clauses.push(substitute(template, args, self.encoding));
        self
    }

    /// Merge a composed [`Expr`] as one parenthesized WHERE clause.
    ///
    /// The expression's internal AND/OR structure is preserved, but the
    /// group always joins the previously accumulated clauses with AND,
    /// regardless of its own leading combinator.
    pub fn filter_expr(mut self, expr: &Expr) -> Self {
        if let Some(text) = expr.render(self.encoding) {
            self.clauses.push(text);
        }
        self
    }

    /// Set the ORDER BY clause.
    ///
    /// The store dialect supports at most one sort attribute, so a later
    /// call replaces the earlier clause.
    pub fn order(mut self, field: &str, direction: Direction) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    /// Shorthand for ascending [`Select::order`].
    pub fn order_asc(self, field: &str) -> Self {
        self.order(field, Direction::Asc)
    }

    /// Cap the result page size.
    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Render the accumulated state as query text.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", quote_ident(&self.domain));
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            let conjunction = self
                .clauses
                .iter()
                .map(|clause| format!("({clause})"))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(&conjunction);
        }
        if let Some((field, direction)) = &self.order {
            sql.push_str(&format!(" ORDER BY {} {}", quote_ident(field), direction));
        }
        if let Some(count) = self.limit {
            sql.push_str(&format!(" LIMIT {count}"));
        }
        sql
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Backtick-quote an identifier unless the caller already quoted it.
fn quote_ident(ident: &str) -> String {
    if ident.len() >= 2 && ident.starts_with('`') && ident.ends_with('`') {
        ident.to_string()
    } else {
        format!("`{ident}`")
    }
}

/// Substitute `?` placeholders in `template` with rendered arguments.
///
/// Placeholders without a matching argument are treated as
/// [`SelectArg::Undefined`].
pub(crate) fn substitute(template: &str, args: &[SelectArg], encoding: Encoding) -> String {
    let like = template.to_ascii_lowercase().contains(" like ");
    let mut out = String::with_capacity(template.len());
    let mut next = 0usize;
    for ch in template.chars() {
        if ch == '?' {
            let arg = args.get(next).unwrap_or(&SelectArg::Undefined);
            next += 1;
            if let Some(rendered) = render_arg(arg, like, encoding) {
                out.push_str(&rendered);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Render one argument as a single-quoted literal, or `None` when the
/// argument is dropped (undefined under the text encoding).
fn render_arg(arg: &SelectArg, like: bool, encoding: Encoding) -> Option<String> {
    let body = match (arg, encoding) {
        (SelectArg::Undefined, Encoding::Json) => "undefined".to_string(),
        (SelectArg::Undefined, Encoding::Text) => return None,
        (SelectArg::Value(Value::String(pattern)), Encoding::Json) if like => {
            quote_like_boundaries(pattern)
        }
        (SelectArg::Value(value), encoding) => encode(value, encoding),
    };
    // The store dialect escapes embedded quotes by doubling them.
    Some(format!("'{}'", body.replace('\'', "''")))
}

/// Quote-wrap only the non-wildcard boundaries of a LIKE pattern.
///
/// A leading `"` is added unless the pattern starts with `%`; a trailing
/// `"` is added unless it ends with an unescaped `%`. The wildcards
/// themselves stay untouched so prefix/suffix/infix matches still work
/// against JSON-encoded string attributes.
fn quote_like_boundaries(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('%') {
        out.push('"');
    }
    out.push_str(pattern);
    let ends_with_wildcard = pattern.ends_with('%') && !pattern.ends_with("\\%");
    if !ends_with_wildcard {
        out.push('"');
    }
    out
}

// SPDX-License-Identifier: PMPL-1.0-or-later
//! Composable predicate expressions.

use strata_format::Encoding;

use crate::builder::{substitute, SelectArg};

/// How a clause combines with the clause before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn keyword(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// A group of predicate clauses with explicit AND/OR combinators.
///
/// Expressions exist to build disjunctions: the plain
/// [`Select::filter`](crate::Select::filter) conjoins every clause, so an
/// OR between conditions has to be assembled here and merged with
/// [`Select::filter_expr`](crate::Select::filter_expr).
///
/// When merged, the combinators between an expression's clauses are
/// preserved, but the combinator of its first clause is ignored: the
/// group as a whole always joins the builder's earlier filters with AND,
/// even if it opens with `or`.
#[derive(Debug, Clone, Default)]
pub struct Expr {
    clauses: Vec<(Combinator, String, Vec<SelectArg>)>,
}

impl Expr {
    /// Create an empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause joined to the previous one with AND.
    pub fn and(mut self, template: &str, args: &[SelectArg]) -> Self {
        self.clauses
            .push((Combinator::And, template.to_string(), args.to_vec()));
        self
    }

    /// Append a clause joined to the previous one with OR.
    pub fn or(mut self, template: &str, args: &[SelectArg]) -> Self {
        self.clauses
            .push((Combinator::Or, template.to_string(), args.to_vec()));
        self
    }

    /// Render the expression body, substituting arguments under the given
    /// encoding. Returns `None` for an empty expression.
    pub(crate) fn render(&self, encoding: Encoding) -> Option<String> {
        let mut clauses = self.clauses.iter();
        let (_, template, args) = clauses.next()?;
        let mut out = substitute(template, args, encoding);
        for (combinator, template, args) in clauses {
            out.push(' ');
            out.push_str(combinator.keyword());
            out.push(' ');
            out.push_str(&substitute(template, args, encoding));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_expr_renders_nothing() {
        assert_eq!(Expr::new().render(Encoding::Json), None);
    }

    #[test]
    fn test_internal_combinators_preserved() {
        let expr = Expr::new()
            .and("`x` = ?", &["a".into()])
            .or("`y` = ?", &["b".into()]);
        assert_eq!(
            expr.render(Encoding::Json).unwrap(),
            "`x` = '\"a\"' OR `y` = '\"b\"'"
        );
    }

    #[test]
    fn test_leading_combinator_ignored() {
        let expr = Expr::new().or("`x` = ?", &["a".into()]).or("`y` = ?", &["b".into()]);
        assert_eq!(
            expr.render(Encoding::Json).unwrap(),
            "`x` = '\"a\"' OR `y` = '\"b\"'"
        );
    }
}

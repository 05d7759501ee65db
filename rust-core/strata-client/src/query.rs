// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Select-expression evaluator for the in-memory store.
//
// Parses and evaluates exactly the dialect the Strata select builder
// renders: `SELECT * FROM domain`, a WHERE tree of comparisons combined
// with AND/OR (AND binding tighter) and parenthesized groups, one
// optional ORDER BY attribute, and LIMIT. This is deliberately not a SQL
// engine; anything outside that grammar is rejected as an invalid query.
//
// Comparisons follow the store's semantics: attribute values compare as
// strings (lexicographically), a multi-valued attribute matches when any
// of its values matches, and a missing attribute never matches.

use strata_format::{AttrValue, AttributeMap};

use crate::error::ClientError;

/// Comparison operators supported by the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    fn apply(self, value: &str, rhs: &str) -> bool {
        match self {
            CompareOp::Eq => value == rhs,
            CompareOp::Ne => value != rhs,
            CompareOp::Lt => value < rhs,
            CompareOp::Le => value <= rhs,
            CompareOp::Gt => value > rhs,
            CompareOp::Ge => value >= rhs,
            CompareOp::Like => like_match(value, rhs),
        }
    }
}

/// A parsed WHERE tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Condition {
    Compare {
        attr: String,
        op: CompareOp,
        value: String,
    },
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    /// Whether an item with these attributes satisfies the condition.
    pub(crate) fn matches(&self, attrs: &AttributeMap) -> bool {
        match self {
            Condition::Compare { attr, op, value } => {
                values_of(attrs, attr).iter().any(|v| op.apply(v, value))
            }
            Condition::All(conditions) => conditions.iter().all(|c| c.matches(attrs)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.matches(attrs)),
        }
    }
}

fn values_of<'a>(attrs: &'a AttributeMap, name: &str) -> &'a [String] {
    match attrs.get(name) {
        Some(AttrValue::Single(value)) => std::slice::from_ref(value),
        Some(AttrValue::Multi(values)) => values.as_slice(),
        None => &[],
    }
}

/// Match a LIKE pattern where `%` is a multi-character wildcard.
fn like_match(value: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('%').collect();
    if parts.len() == 1 {
        return value == pattern;
    }
    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !value.starts_with(first) || !value.ends_with(last) {
        return false;
    }
    let mut pos = first.len();
    let end = value.len() - last.len();
    if pos > end {
        return false;
    }
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match value[pos..end].find(part) {
            Some(idx) => pos += idx + part.len(),
            None => return false,
        }
    }
    true
}

/// A fully parsed select expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedQuery {
    pub(crate) domain: String,
    pub(crate) condition: Option<Condition>,
    /// ORDER BY attribute and whether the sort is ascending.
    pub(crate) order: Option<(String, bool)>,
    pub(crate) limit: Option<usize>,
}

impl ParsedQuery {
    pub(crate) fn parse(query: &str) -> Result<Self, ClientError> {
        let tokens = tokenize(query)?;
        Parser { tokens, pos: 0 }.parse_query()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// A backtick-quoted or bare identifier/keyword.
    Word(String),
    /// A single-quoted string literal.
    Str(String),
    Number(usize),
    Symbol(&'static str),
}

fn invalid(message: impl Into<String>) -> ClientError {
    ClientError::InvalidQuery(message.into())
}

fn tokenize(query: &str) -> Result<Vec<Token>, ClientError> {
    let mut tokens = Vec::new();
    let mut chars = query.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '`' => {
                chars.next();
                let mut word = String::new();
                loop {
                    match chars.next() {
                        Some('`') => break,
                        Some(c) => word.push(c),
                        None => return Err(invalid("unterminated quoted identifier")),
                    }
                }
                tokens.push(Token::Word(word));
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        // A doubled quote is an escaped literal quote.
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            text.push('\'');
                        }
                        Some('\'') => break,
                        Some(c) => text.push(c),
                        None => return Err(invalid("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(text));
            }
            '(' => {
                chars.next();
                tokens.push(Token::Symbol("("));
            }
            ')' => {
                chars.next();
                tokens.push(Token::Symbol(")"));
            }
            '*' => {
                chars.next();
                tokens.push(Token::Symbol("*"));
            }
            '=' => {
                chars.next();
                tokens.push(Token::Symbol("="));
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::Symbol("!=")),
                    _ => return Err(invalid("expected `=` after `!`")),
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Symbol("<="));
                } else {
                    tokens.push(Token::Symbol("<"));
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Symbol(">="));
                } else {
                    tokens.push(Token::Symbol(">"));
                }
            }
            c if c.is_ascii_digit() => {
                let mut number = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        number.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = number
                    .parse()
                    .map_err(|_| invalid(format!("bad number: {number}")))?;
                tokens.push(Token::Number(value));
            }
            _ => {
                // Bare words: identifiers (with dots and `[]` suffixes) and
                // keywords.
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '-') {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if word.is_empty() {
                    return Err(invalid(format!("unexpected character: {ch:?}")));
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if let Some(Token::Word(word)) = self.peek() {
            if word.eq_ignore_ascii_case(keyword) {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ClientError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(invalid(format!("expected {keyword}")))
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<(), ClientError> {
        match self.next() {
            Some(Token::Symbol(s)) if s == symbol => Ok(()),
            _ => Err(invalid(format!("expected `{symbol}`"))),
        }
    }

    fn expect_word(&mut self) -> Result<String, ClientError> {
        match self.next() {
            Some(Token::Word(word)) => Ok(word),
            _ => Err(invalid("expected identifier")),
        }
    }

    fn parse_query(mut self) -> Result<ParsedQuery, ClientError> {
        self.expect_keyword("SELECT")?;
        self.expect_symbol("*")?;
        self.expect_keyword("FROM")?;
        let domain = self.expect_word()?;

        let condition = if self.eat_keyword("WHERE") {
            Some(self.parse_or()?)
        } else {
            None
        };

        let order = if self.eat_keyword("ORDER") {
            self.expect_keyword("BY")?;
            let field = self.expect_word()?;
            let ascending = if self.eat_keyword("DESC") {
                false
            } else {
                // Explicit or implied ASC.
                self.eat_keyword("ASC");
                true
            };
            Some((field, ascending))
        } else {
            None
        };

        let limit = if self.eat_keyword("LIMIT") {
            match self.next() {
                Some(Token::Number(count)) => Some(count),
                _ => return Err(invalid("expected number after LIMIT")),
            }
        } else {
            None
        };

        if let Some(token) = self.peek() {
            return Err(invalid(format!("trailing input: {token:?}")));
        }

        Ok(ParsedQuery {
            domain,
            condition,
            order,
            limit,
        })
    }

    fn parse_or(&mut self) -> Result<Condition, ClientError> {
        let mut conditions = vec![self.parse_and()?];
        while self.eat_keyword("OR") {
            conditions.push(self.parse_and()?);
        }
        Ok(if conditions.len() == 1 {
            conditions.pop().unwrap_or(Condition::All(Vec::new()))
        } else {
            Condition::Any(conditions)
        })
    }

    fn parse_and(&mut self) -> Result<Condition, ClientError> {
        let mut conditions = vec![self.parse_primary()?];
        while self.eat_keyword("AND") {
            conditions.push(self.parse_primary()?);
        }
        Ok(if conditions.len() == 1 {
            conditions.pop().unwrap_or(Condition::All(Vec::new()))
        } else {
            Condition::All(conditions)
        })
    }

    fn parse_primary(&mut self) -> Result<Condition, ClientError> {
        if let Some(Token::Symbol("(")) = self.peek() {
            self.pos += 1;
            let condition = self.parse_or()?;
            self.expect_symbol(")")?;
            return Ok(condition);
        }
        let attr = self.expect_word()?;
        let op = match self.next() {
            Some(Token::Symbol("=")) => CompareOp::Eq,
            Some(Token::Symbol("!=")) => CompareOp::Ne,
            Some(Token::Symbol("<")) => CompareOp::Lt,
            Some(Token::Symbol("<=")) => CompareOp::Le,
            Some(Token::Symbol(">")) => CompareOp::Gt,
            Some(Token::Symbol(">=")) => CompareOp::Ge,
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("LIKE") => CompareOp::Like,
            other => return Err(invalid(format!("expected comparison operator, got {other:?}"))),
        };
        let value = match self.next() {
            Some(Token::Str(value)) => value,
            other => return Err(invalid(format!("expected string literal, got {other:?}"))),
        };
        Ok(Condition::Compare { attr, op, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(entries: &[(&str, &str)]) -> AttributeMap {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), AttrValue::Single(value.to_string())))
            .collect()
    }

    #[test]
    fn test_parse_bare_select() {
        let parsed = ParsedQuery::parse("SELECT * FROM `domain`").unwrap();
        assert_eq!(parsed.domain, "domain");
        assert_eq!(parsed.condition, None);
        assert_eq!(parsed.order, None);
        assert_eq!(parsed.limit, None);
    }

    #[test]
    fn test_parse_full_query() {
        let parsed = ParsedQuery::parse(
            "SELECT * FROM `d` WHERE (`x` = '\"y\"') AND (`n` > '5') ORDER BY `x` DESC LIMIT 3",
        )
        .unwrap();
        assert_eq!(parsed.domain, "d");
        assert_eq!(parsed.order, Some(("x".to_string(), false)));
        assert_eq!(parsed.limit, Some(3));
        let condition = parsed.condition.unwrap();
        assert!(matches!(condition, Condition::All(ref cs) if cs.len() == 2));
    }

    #[test]
    fn test_parse_rejects_unknown_grammar() {
        assert!(ParsedQuery::parse("DELETE FROM `d`").is_err());
        assert!(ParsedQuery::parse("SELECT * FROM").is_err());
        assert!(ParsedQuery::parse("SELECT * FROM `d` WHERE `x`").is_err());
        assert!(ParsedQuery::parse("SELECT * FROM `d` LIMIT x").is_err());
        assert!(ParsedQuery::parse("SELECT * FROM `d` garbage").is_err());
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let parsed =
            ParsedQuery::parse("SELECT * FROM `d` WHERE `a` = '1' OR `b` = '2' AND `c` = '3'")
                .unwrap();
        // a=1 OR (b=2 AND c=3)
        let items = attrs(&[("a", "1")]);
        assert!(parsed.condition.as_ref().unwrap().matches(&items));
        let items = attrs(&[("b", "2")]);
        assert!(!parsed.condition.as_ref().unwrap().matches(&items));
        let items = attrs(&[("b", "2"), ("c", "3")]);
        assert!(parsed.condition.as_ref().unwrap().matches(&items));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let parsed = ParsedQuery::parse("SELECT * FROM `d` WHERE `x` != '\"y\"'").unwrap();
        let condition = parsed.condition.unwrap();
        assert!(!condition.matches(&attrs(&[("other", "\"y\"")])));
        assert!(condition.matches(&attrs(&[("x", "\"z\"")])));
    }

    #[test]
    fn test_multi_valued_attribute_matches_any() {
        let parsed = ParsedQuery::parse("SELECT * FROM `d` WHERE `tags[]` = '\"b\"'").unwrap();
        let condition = parsed.condition.unwrap();
        let mut items = AttributeMap::new();
        items.insert(
            "tags[]".to_string(),
            AttrValue::Multi(vec!["\"a\"".to_string(), "\"b\"".to_string()]),
        );
        assert!(condition.matches(&items));
        let mut items = AttributeMap::new();
        items.insert("tags[]".to_string(), AttrValue::Multi(vec!["\"c\"".to_string()]));
        assert!(!condition.matches(&items));
    }

    #[test]
    fn test_string_escapes_in_literals() {
        let parsed = ParsedQuery::parse("SELECT * FROM `d` WHERE `x` = 'it''s'").unwrap();
        let condition = parsed.condition.unwrap();
        assert!(condition.matches(&attrs(&[("x", "it's")])));
    }

    #[test]
    fn test_lexicographic_comparison() {
        let parsed = ParsedQuery::parse("SELECT * FROM `d` WHERE `x` >= '10'").unwrap();
        let condition = parsed.condition.unwrap();
        // String comparison: "9" >= "10" lexicographically.
        assert!(condition.matches(&attrs(&[("x", "9")])));
        assert!(!condition.matches(&attrs(&[("x", "0")])));
    }

    #[test]
    fn test_like_prefix_suffix_infix() {
        assert!(like_match("\"yellow\"", "\"y%"));
        assert!(!like_match("\"blue\"", "\"y%"));
        assert!(like_match("\"gray\"", "%y\""));
        assert!(like_match("\"xyz\"", "%y%"));
        assert!(!like_match("\"abc\"", "%y%"));
        assert!(like_match("abc", "abc"));
        assert!(like_match("anything", "%"));
        assert!(like_match("a-b-c", "a%b%c"));
        assert!(!like_match("a-c", "a%b%c"));
    }

    #[test]
    fn test_like_boundaries_do_not_overlap() {
        // Pattern needs "ab" then trailing "b"; the single "b" cannot
        // satisfy both.
        assert!(!like_match("ab", "ab%b"));
        assert!(like_match("abb", "ab%b"));
    }
}

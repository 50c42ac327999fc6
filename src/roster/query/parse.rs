//! Turns search text into plain terms and typed predicates.
//!
//! Each `field:value` token is tried against its field's accepted kinds in a
//! fixed order: bool, then string, then date. The first kind that reads the
//! value wins. Tokens naming an unknown or unavailable field, or carrying a
//! value no kind accepts, are dropped without an error.

use super::date::PartialDate;
use super::predicate::{Operator, Predicate, Query};
use super::tokenizer::{tokenize_spanned, Token};
use crate::fields::FieldRegistry;
use tracing::trace;

/// Settings that affect how values are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseContext {
    /// UTC offset, in minutes, that typed dates are expressed in.
    pub utc_offset_minutes: i32,
}

/// Plain search terms plus typed predicates. An implicit conjunction.
pub struct ParsedQuery<T> {
    pub terms: Vec<String>,
    pub queries: Vec<Query<T>>,
}

impl<T> Default for ParsedQuery<T> {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            queries: Vec::new(),
        }
    }
}

impl<T> Clone for ParsedQuery<T> {
    fn clone(&self) -> Self {
        Self {
            terms: self.terms.clone(),
            queries: self.queries.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ParsedQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedQuery")
            .field("terms", &self.terms)
            .field("queries", &self.queries)
            .finish()
    }
}

impl<T> ParsedQuery<T> {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.queries.is_empty()
    }
}

/// Tokenizes and parses raw search text.
pub fn parse_query<T>(
    text: &str,
    registry: &FieldRegistry<T>,
    ctx: &ParseContext,
) -> ParsedQuery<T> {
    parse_tokens(&tokenize_spanned(text), registry, ctx)
}

/// Turns tokens into plain terms and predicates.
///
/// Tokens without a `:` become lower-cased terms. `field:value` tokens become a
/// predicate when the field is known and available and the value fits one of
/// the field's classes, tried in the order bool, string, date. Anything else is
/// dropped without error.
pub fn parse_tokens<T>(
    tokens: &[Token],
    registry: &FieldRegistry<T>,
    ctx: &ParseContext,
) -> ParsedQuery<T> {
    let mut parsed = ParsedQuery::default();

    for token in tokens {
        let Some((name, value)) = token.text.split_once(':') else {
            parsed.terms.push(token.text.to_lowercase());
            continue;
        };

        let Some(field) = registry.lookup(name) else {
            trace!(field = name, "dropping filter on unknown field");
            continue;
        };
        let qt = &field.query_type;
        let lowered = value.to_lowercase();

        if qt.bool {
            if let Some(state) = parse_bool(&lowered) {
                parsed
                    .queries
                    .push(Query::new(field, Predicate::Bool(state), value, token.span.clone()));
                continue;
            }
        }

        if qt.string {
            parsed
                .queries
                .push(Query::new(field, Predicate::Text(lowered), value, token.span.clone()));
            continue;
        }

        if qt.date {
            let (operator, rest) = split_operator(value);
            match PartialDate::parse(rest) {
                Some(date) => {
                    let predicate = Predicate::Date {
                        operator,
                        date: date.with_offset(ctx.utc_offset_minutes),
                    };
                    parsed
                        .queries
                        .push(Query::new(field, predicate, rest.trim(), token.span.clone()));
                }
                None => trace!(field = name, value = rest, "dropping unparsable date"),
            }
            continue;
        }

        trace!(field = name, value, "dropping filter with no matching class");
    }

    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "yes" | "t" | "y" => Some(true),
        "false" | "no" | "f" | "n" => Some(false),
        _ => None,
    }
}

fn split_operator(value: &str) -> (Operator, &str) {
    let mut chars = value.chars();
    match chars.next().and_then(Operator::from_char) {
        Some(op) => (op, chars.as_str()),
        None => (Operator::Equal, value),
    }
}

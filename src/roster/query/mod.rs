//! # The Query Language
//!
//! Search text is an implicit conjunction of tokens:
//!
//! ```text
//! alice admin:true last_active:>2024-01 name:"van der"
//! ```
//!
//! - A token without `:` is a plain term, matched case-insensitively against
//!   every searchable text of an item.
//! - A `field:value` token becomes a typed predicate when the field is known:
//!   `Bool` (`true/yes/t/y`, `false/no/f/n`), `String` (substring) or `Date`
//!   (optional `<`, `>` or `=`, then a partial date).
//! - Anything that does not fit is dropped silently. Malformed input is never
//!   an error.
//!
//! The pipeline is [`tokenizer`] → [`parse`] → [`predicate`], with partial dates
//! in [`date`].

pub mod date;
pub mod parse;
pub mod predicate;
pub mod tokenizer;

pub use date::PartialDate;
pub use parse::{parse_query, parse_tokens, ParseContext, ParsedQuery};
pub use predicate::{
    ChipTone, FilterChip, Operator, Predicate, Query, QueryClass, QueryDescriptor, QueryValue,
};
pub use tokenizer::{tokenize, tokenize_spanned, Token};

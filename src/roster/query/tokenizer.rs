//! Splits raw search-box text into tokens.
//!
//! Tokens are separated by unquoted whitespace. A `"` or `'` opens a quoted run
//! that only the same character closes; inside it whitespace and the other quote
//! character are literal. Quote characters are stripped, and a quoted run may sit
//! in the middle of a token (`name:"ali ce"` becomes `name:ali ce`). An
//! unterminated quote runs to the end of the input.
//!
//! Each token remembers the byte span it came from, so a filter chip can later
//! cut its own text back out of the search box.

use std::ops::Range;

/// One token plus the byte range of the raw text it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub span: Range<usize>,
}

/// Tokenizes `input`, discarding spans.
pub fn tokenize(input: &str) -> Vec<String> {
    tokenize_spanned(input)
        .into_iter()
        .map(|token| token.text)
        .collect()
}

/// Tokenizes `input`, keeping the source span of every token.
///
/// Never fails. Tokens that are empty after quote stripping are dropped.
pub fn tokenize_spanned(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (idx, ch) in input.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => text.push(ch),
            None if ch == '"' || ch == '\'' => {
                start.get_or_insert(idx);
                quote = Some(ch);
            }
            None if ch.is_whitespace() => {
                if let Some(begin) = start.take() {
                    push_token(&mut tokens, &mut text, begin..idx);
                }
            }
            None => {
                start.get_or_insert(idx);
                text.push(ch);
            }
        }
    }

    if let Some(begin) = start {
        push_token(&mut tokens, &mut text, begin..input.len());
    }
    tokens
}

fn push_token(tokens: &mut Vec<Token>, text: &mut String, span: Range<usize>) {
    let text = std::mem::take(text);
    if !text.is_empty() {
        tokens.push(Token { text, span });
    }
}

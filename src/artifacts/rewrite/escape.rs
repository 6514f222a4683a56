//! Quoting of user text inside filter fragments
//!
//! A fragment travels through two shells. The command line wraps it in double
//! quotes (outer layer); `git filter-branch` then evaluates it, where every value
//! sits between single quotes (inner layer). Escaping is a fixed sequence of
//! replacements whose order matters: later steps introduce backslashes and quotes
//! that earlier steps must not touch again.

use crate::errors::{ChiselError, Result};

type EscapeStep = fn(&str) -> String;

/// Replacements, applied in order
const ESCAPE_STEPS: [(&str, EscapeStep); 5] = [
    ("backslash", escape_backslashes),
    ("expansion", escape_expansions),
    ("double quote", escape_double_quotes),
    ("single quote", escape_single_quotes),
    ("parenthesis", escape_parentheses),
];

fn escape_backslashes(value: &str) -> String {
    value.replace('\\', "\\\\")
}

fn escape_expansions(value: &str) -> String {
    value.replace('$', "\\$").replace('`', "\\`")
}

fn escape_double_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Close the single quote, emit a double-quoted quote, reopen
fn escape_single_quotes(value: &str) -> String {
    value.replace('\'', "'\\\"'\\\"'")
}

/// Close the single quote, emit an escaped parenthesis, reopen
fn escape_parentheses(value: &str) -> String {
    value.replace('(', "'\\('").replace(')', "'\\)'")
}

/// Escape `value` for a single-quoted slot of a fragment, then check it decodes back
pub fn escape(value: &str) -> Result<String> {
    let escaped = escape_unchecked(value);

    match decode(&escaped) {
        Some(decoded) if decoded == value => Ok(escaped),
        decoded => Err(ChiselError::EscapeInvariantViolation {
            input: value.to_string(),
            decoded,
        }),
    }
}

pub(crate) fn escape_unchecked(value: &str) -> String {
    ESCAPE_STEPS
        .iter()
        .fold(value.to_string(), |acc, (_, step)| step(&acc))
}

/// What both shell layers turn an escaped value back into
///
/// `None` when the text would trigger an expansion or leave its quotes unbalanced.
pub fn decode(escaped: &str) -> Option<String> {
    decode_single_quoted(&decode_double_quoted(escaped)?)
}

/// Single-quote a word for a plain `sh` command line
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Outer layer: content of a `"..."` argument
fn decode_double_quoted(text: &str) -> Option<String> {
    let mut decoded = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next @ ('$' | '`' | '"' | '\\')) => {
                    decoded.push(next);
                    chars.next();
                }
                // line continuation
                Some('\n') => {
                    chars.next();
                }
                _ => decoded.push('\\'),
            },
            '"' | '$' | '`' => return None,
            _ => decoded.push(c),
        }
    }

    Some(decoded)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quoting {
    Single,
    Double,
    Bare,
}

/// Inner layer: text following an opening `'`, up to the matching closing one
fn decode_single_quoted(text: &str) -> Option<String> {
    let mut decoded = String::with_capacity(text.len());
    let mut state = Quoting::Single;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (state, c) {
            (Quoting::Single, '\'') => state = Quoting::Bare,
            (Quoting::Single, _) => decoded.push(c),

            (Quoting::Bare, '\'') => state = Quoting::Single,
            (Quoting::Bare, '"') => state = Quoting::Double,
            (Quoting::Bare, '\\') => decoded.push(chars.next()?),
            (Quoting::Bare, _) => return None,

            (Quoting::Double, '"') => state = Quoting::Bare,
            (Quoting::Double, '$' | '`') => return None,
            (Quoting::Double, '\\') => match chars.peek() {
                Some(&next @ ('$' | '`' | '"' | '\\')) => {
                    decoded.push(next);
                    chars.next();
                }
                _ => decoded.push('\\'),
            },
            (Quoting::Double, _) => decoded.push(c),
        }
    }

    (state == Quoting::Single).then_some(decoded)
}

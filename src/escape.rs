//! Escaped-quote placeholders.
//!
//! The row decoder splits tuples with a quote-aware CSV reader that uses `'`
//! as its quote character, so a MySQL-escaped quote (`\'`) inside a string
//! would be read as the end of the field. Before splitting, escaped quotes are
//! swapped for placeholder tokens; once the converter has produced its output
//! file the tokens are swapped back (see [`Placeholders::restore`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SINGLE_QUOTE_PLACEHOLDER: &str = "@SINGLE_placeholder";
pub const DEFAULT_DOUBLE_QUOTE_PLACEHOLDER: &str = "@DOUBLE_placeholder";

/// Characters a placeholder may never contain: they are either quote or
/// escape characters for the decoder, or part of the `),(` tuple separator.
const FORBIDDEN_CHARS: &[char] = &['\'', '"', '\\', ',', '(', ')'];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EscapeError {
    #[error("{name} placeholder must not be empty")]
    Empty { name: &'static str },

    #[error("{name} placeholder {value:?} contains reserved character {ch:?}")]
    ReservedChar {
        name: &'static str,
        value: String,
        ch: char,
    },

    #[error("single and double quote placeholders must differ (both are {0:?})")]
    Identical(String),

    #[error("placeholder {inner:?} occurs inside placeholder {outer:?}")]
    Overlapping { inner: String, outer: String },
}

/// Tokens substituted for escaped quotes while decoding rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    /// Replaces `\'`
    pub single_quote: String,
    /// Replaces `\"`
    pub double_quote: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            single_quote: DEFAULT_SINGLE_QUOTE_PLACEHOLDER.to_string(),
            double_quote: DEFAULT_DOUBLE_QUOTE_PLACEHOLDER.to_string(),
        }
    }
}

impl Placeholders {
    pub fn new(single_quote: impl Into<String>, double_quote: impl Into<String>) -> Self {
        Self {
            single_quote: single_quote.into(),
            double_quote: double_quote.into(),
        }
    }

    /// Check that both tokens survive the decoder untouched and can be told
    /// apart when restoring.
    pub fn validate(&self) -> Result<(), EscapeError> {
        for (name, value) in [
            ("single quote", &self.single_quote),
            ("double quote", &self.double_quote),
        ] {
            if value.is_empty() {
                return Err(EscapeError::Empty { name });
            }
            if let Some(ch) = value.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
                return Err(EscapeError::ReservedChar {
                    name,
                    value: value.clone(),
                    ch,
                });
            }
        }

        if self.single_quote == self.double_quote {
            return Err(EscapeError::Identical(self.single_quote.clone()));
        }

        // restore() replaces one token before the other
        for (inner, outer) in [
            (&self.single_quote, &self.double_quote),
            (&self.double_quote, &self.single_quote),
        ] {
            if outer.contains(inner.as_str()) {
                return Err(EscapeError::Overlapping {
                    inner: inner.clone(),
                    outer: outer.clone(),
                });
            }
        }

        Ok(())
    }

    /// Replace every `\'` and `\"` whose backslash is not itself preceded by
    /// another backslash.
    ///
    /// `\\'` is left alone: there the backslash is escaped and the quote that
    /// follows is a real string delimiter.
    pub fn protect(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut prev: Option<char> = None;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\\' && prev != Some('\\') {
                match chars.peek() {
                    Some('\'') => {
                        chars.next();
                        out.push_str(&self.single_quote);
                        prev = Some('\'');
                        continue;
                    }
                    Some('"') => {
                        chars.next();
                        out.push_str(&self.double_quote);
                        prev = Some('"');
                        continue;
                    }
                    _ => {}
                }
            }
            out.push(c);
            prev = Some(c);
        }

        out
    }

    /// Undo [`protect`](Self::protect) on converter output.
    ///
    /// Single quotes come back bare, double quotes come back escaped (the
    /// output is JSON-ish), and finally every doubled backslash collapses to a
    /// single one.
    pub fn restore(&self, input: &str) -> String {
        input
            .replace(&self.single_quote, "'")
            .replace(&self.double_quote, "\\\"")
            .replace("\\\\", "\\")
    }
}

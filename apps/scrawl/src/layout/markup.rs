//! Single-pass tokenizer for the document text and its lightweight markup.
//!
//! Token classes, in priority order:
//! - `' '`, `'\t'`, `'\n'` → whitespace tokens
//! - maximal run of alphabetic characters → [`Token::Word`]
//! - `*word*`, `_word_`, `~word~` → [`Token::Span`] (bold / underline / strikethrough)
//! - anything else → [`Token::Symbol`]
//!
//! A span is recognized only when the same delimiter reappears before any whitespace
//! or the end of text, with at least one character in between. Otherwise the opening
//! delimiter is an ordinary symbol. Spans do not nest: the first matching delimiter
//! closes the span. The scan never looks further ahead than that closing delimiter.

use serde::{Deserialize, Serialize};

/// Inline emphasis selected by a span's delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkupStyle {
    Bold,
    Underline,
    Strikethrough,
}

impl MarkupStyle {
    pub fn from_delimiter(c: char) -> Option<Self> {
        match c {
            '*' => Some(MarkupStyle::Bold),
            '_' => Some(MarkupStyle::Underline),
            '~' => Some(MarkupStyle::Strikethrough),
            _ => None,
        }
    }

    /// Underline and strikethrough add a connecting stroke across the word.
    pub fn draws_connector(&self) -> bool {
        !matches!(self, MarkupStyle::Bold)
    }
}

pub fn is_delimiter(c: char) -> bool {
    MarkupStyle::from_delimiter(c).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Space,
    Tab,
    Newline,
    Word(&'a str),
    Span { style: MarkupStyle, word: &'a str },
    Symbol(char),
}

impl Token<'_> {
    /// Number of source characters the token covers, delimiters included.
    pub fn char_len(&self) -> usize {
        match self {
            Token::Space | Token::Tab | Token::Newline | Token::Symbol(_) => 1,
            Token::Word(w) => w.chars().count(),
            Token::Span { word, .. } => word.chars().count() + 2,
        }
    }
}

/// Forward-only iterator over the tokens of `text`.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Length in bytes of the run of alphabetic characters at the cursor.
    fn word_len(&self) -> usize {
        self.rest()
            .char_indices()
            .find(|(_, c)| !c.is_alphabetic())
            .map_or(self.rest().len(), |(i, _)| i)
    }

    /// Looks for the closing delimiter of a span opened by `delim` at the cursor.
    /// Returns the enclosed word when the span is well formed.
    fn span_body(&self, delim: char) -> Option<&'a str> {
        let after = &self.rest()[delim.len_utf8()..];
        for (i, c) in after.char_indices() {
            if c == delim {
                return if i == 0 { None } else { Some(&after[..i]) };
            }
            if c.is_whitespace() {
                return None;
            }
        }
        None
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let c = self.rest().chars().next()?;

        let (token, byte_len) = match c {
            ' ' => (Token::Space, 1),
            '\t' => (Token::Tab, 1),
            '\n' => (Token::Newline, 1),
            c if c.is_alphabetic() => {
                let len = self.word_len();
                (Token::Word(&self.rest()[..len]), len)
            }
            c => {
                let span = MarkupStyle::from_delimiter(c)
                    .and_then(|style| self.span_body(c).map(|word| (style, word)));
                match span {
                    Some((style, word)) => {
                        (Token::Span { style, word }, word.len() + 2 * c.len_utf8())
                    }
                    None => (Token::Symbol(c), c.len_utf8()),
                }
            }
        };

        self.pos += byte_len;
        Some(token)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

//! Source code to model tokens and back.
//!
//! - `tokenize` lexes one line at a time, emitting `Indent`/`Dedent`/`Newline`
//!   from the change in leading whitespace between lines.
//! - `Token::model_representation` is the bounded vocabulary the translation
//!   service speaks: `A io` for `IO`, `C exception` for `Exception`, `3 4 1`
//!   for `341`, and fixed markers for structure.
//! - `decode_model_representation` walks that vocabulary back into source,
//!   leaving indentation and cursor as placeholders for the resolver.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::contractions::sorted_for_matching;
use crate::core::escaper::unescape_word;
use crate::core::placeholder::{self, wrap_in_slot};
use crate::core::range::Range;
use crate::core::text_style::{to_all_caps, to_capitalized};
use crate::core::whitespace::is_whitespace_char;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlphaStyle {
    Caps,
    Capital,
    Lowercase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Symbol,
    Number,
    Alpha(AlphaStyle),
    Space,
    Indent,
    Dedent,
    Newline,
    Cursor,
    ContextStart,
    EnglishStart,
    AlphaSubsequenceDelimiter,
    SnippetContainer(String),
}

/// A lexed token. Structural tokens carry no code and no range.
///
/// Equality and hashing go through the model representation, so the same
/// identifier lexed at two offsets is one map key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    code: String,
    range: Option<Range>,
}

impl Token {
    pub fn structural(kind: TokenKind) -> Self {
        Token {
            kind,
            code: String::new(),
            range: None,
        }
    }

    pub fn code_token(kind: TokenKind, source: &str, range: Range) -> Self {
        Token {
            kind,
            code: range.slice(source).to_string(),
            range: Some(range),
        }
    }

    pub fn original_code(&self) -> &str {
        &self.code
    }

    pub fn range(&self) -> Option<Range> {
        self.range
    }

    pub fn alpha_style(&self) -> Option<AlphaStyle> {
        match self.kind {
            TokenKind::Alpha(style) => Some(style),
            _ => None,
        }
    }

    pub fn is_alpha(&self) -> bool {
        self.alpha_style().is_some()
    }

    /// Lowercased code of an alpha token.
    pub fn word(&self) -> String {
        self.code.to_lowercase()
    }

    pub fn model_representation(&self) -> Cow<'_, str> {
        match &self.kind {
            TokenKind::Symbol => Cow::Borrowed(&self.code),
            TokenKind::Number => {
                let spaced = self
                    .code
                    .chars()
                    .map(String::from)
                    .collect::<Vec<_>>()
                    .join(" ");
                Cow::Owned(spaced)
            }
            TokenKind::Alpha(AlphaStyle::Caps) => Cow::Owned(format!("A {}", self.word())),
            TokenKind::Alpha(AlphaStyle::Capital) => Cow::Owned(format!("C {}", self.word())),
            TokenKind::Alpha(AlphaStyle::Lowercase) => Cow::Owned(self.word()),
            TokenKind::Space => Cow::Borrowed("SP"),
            TokenKind::Indent => Cow::Borrowed("I"),
            TokenKind::Dedent => Cow::Borrowed("D"),
            TokenKind::Newline => Cow::Borrowed("NL"),
            TokenKind::Cursor => Cow::Borrowed("CRSR"),
            TokenKind::ContextStart => Cow::Borrowed("CTX"),
            TokenKind::EnglishStart => Cow::Borrowed("ENG"),
            TokenKind::AlphaSubsequenceDelimiter => Cow::Borrowed("ASD"),
            TokenKind::SnippetContainer(name) => Cow::Owned(format!("SNIP_{name}")),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.model_representation() == other.model_representation()
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model_representation().hash(state);
    }
}

static LOWERCASE: LazyLock<Regex> = LazyLock::new(|| {
    let contractions = escaped_alternation(&sorted_for_matching(false));
    Regex::new(&format!(r"^(?:(?:{contractions})\b|[a-z]+)")).expect("valid lowercase pattern")
});

static CAPITAL: LazyLock<Regex> = LazyLock::new(|| {
    let contractions = escaped_alternation(&sorted_for_matching(true));
    Regex::new(&format!(r"^(?:(?:{contractions})\b|[A-Z][a-z]+)")).expect("valid capital pattern")
});

static CAPS_PASCAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)[A-Z][a-z]").expect("valid caps pattern"));

static CAPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+").expect("valid caps pattern"));

fn escaped_alternation(words: &[String]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches(is_whitespace_char).len()
}

/// Lex `source` into tokens.
///
/// Blank lines other than the last become a single `Newline`. Every other
/// line opens with `Indent`, `Dedent` or `Newline` depending on how its
/// indentation compares to the previous line's.
pub fn tokenize(source: &str) -> Vec<Token> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut tokens = Vec::new();
    let mut previous_indentation = 0;
    let mut position = 0;
    for (i, line) in lines.iter().enumerate() {
        let last_line = i == lines.len() - 1;
        if !last_line && line.trim_matches(is_whitespace_char).is_empty() {
            position += line.len() + 1;
            tokens.push(Token::structural(TokenKind::Newline));
            continue;
        }

        let indentation = leading_whitespace(line);
        let modifier = match indentation.cmp(&previous_indentation) {
            std::cmp::Ordering::Greater => TokenKind::Indent,
            std::cmp::Ordering::Less => TokenKind::Dedent,
            std::cmp::Ordering::Equal => TokenKind::Newline,
        };
        previous_indentation = indentation;
        tokens.push(Token::structural(modifier));
        tokenize_line(source, position, line, last_line, &mut tokens);
        position += line.len() + 1;
    }
    tokens
}

fn tokenize_line(source: &str, line_start: usize, line: &str, last_line: bool, out: &mut Vec<Token>) {
    let mut position = line_start;
    let mut remaining = line;
    while let Some(first) = remaining.chars().next() {
        let consumed;
        if is_whitespace_char(first) {
            consumed = leading_whitespace(remaining);
            // Leading whitespace is indentation. Trailing whitespace only
            // survives on the last line, where the cursor may follow it.
            if position != line_start && (last_line || consumed != remaining.len()) {
                out.extend((position..position + consumed).map(|p| {
                    Token::code_token(TokenKind::Space, source, Range { start: p, stop: p + 1 })
                }));
            }
        } else if !first.is_ascii_alphanumeric() {
            consumed = first.len_utf8();
            out.push(code(TokenKind::Symbol, source, position, consumed));
        } else if first.is_ascii_digit() {
            consumed = remaining
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(remaining.len());
            out.push(code(TokenKind::Number, source, position, consumed));
        } else {
            let (style, len) = alpha_prefix(remaining);
            consumed = len;
            out.push(code(TokenKind::Alpha(style), source, position, consumed));
        }
        remaining = &remaining[consumed..];
        position += consumed;
    }
}

fn code(kind: TokenKind, source: &str, start: usize, len: usize) -> Token {
    Token::code_token(kind, source, Range { start, stop: start + len })
}

/// Style and byte length of the alpha token at the head of `s`, which starts
/// with an ASCII letter.
fn alpha_prefix(s: &str) -> (AlphaStyle, usize) {
    if let Some(m) = LOWERCASE.find(s) {
        return (AlphaStyle::Lowercase, m.end());
    }
    if let Some(m) = CAPITAL.find(s) {
        return (AlphaStyle::Capital, m.end());
    }
    if let Some(group) = CAPS_PASCAL.captures(s).and_then(|c| c.get(1)) {
        return (AlphaStyle::Caps, group.end());
    }
    let len = CAPS.find(s).map_or(1, |m| m.end());
    (AlphaStyle::Caps, len)
}

/// Model representations joined by single spaces.
pub fn model_representation(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.model_representation())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn a model sentence back into source.
///
/// Line breaks carry one indent placeholder per level of the running
/// indentation counter, and `CRSR` becomes the cursor placeholder.
pub fn decode_model_representation(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split_whitespace().map(unescape_word).collect();
    let indent = wrap_in_slot(placeholder::INDENT);
    let mut out = String::new();
    let mut level: isize = 0;
    let mut i = 0;
    while i < words.len() {
        let has_next = i + 1 < words.len();
        match words[i] {
            "SP" => out.push(' '),
            "NL" | "I" | "D" => {
                match words[i] {
                    "I" => level += 1,
                    "D" => level -= 1,
                    _ => {}
                }
                out.push('\n');
                out.push_str(&indent.repeat(level.max(0) as usize));
            }
            "CRSR" => out.push_str(&wrap_in_slot(placeholder::CURSOR)),
            "A" if has_next => {
                out.push_str(&to_all_caps(words[i + 1]));
                i += 1;
            }
            "C" if has_next => {
                out.push_str(&to_capitalized(words[i + 1]));
                i += 1;
            }
            word => out.push_str(word),
        }
        i += 1;
    }
    out
}

//! Identifier runs in a token stream.
//!
//! `alpha_prefix` measures how far each naming convention extends from the
//! first token; `alpha_numerics` chops prior context into such runs, keyed by
//! the tokens themselves, so the engine can tell the model "the words `user
//! name` were written as `userName` earlier in this file".

use indexmap::IndexMap;
use rand::Rng;

use crate::core::text_style::TextStyle;
use crate::core::tokenizer::{AlphaStyle, Token, TokenKind};

/// The winning convention and how many tokens it spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaPrefix {
    pub style: TextStyle,
    pub length: usize,
}

/// Longest naming-convention run at the head of `tokens`, or `None` when the
/// first token is not alpha.
///
/// Equal-length conventions are broken by `rng`.
pub fn alpha_prefix<R: Rng>(tokens: &[Token], rng: &mut R) -> Option<AlphaPrefix> {
    let first = tokens.first()?;
    let first_style = first.alpha_style()?;

    let mut lengths: Vec<(TextStyle, usize)> = vec![
        (TextStyle::AllCaps, delimited_length(tokens, AlphaStyle::Caps, "_", false)),
        (TextStyle::Underscores, delimited_length(tokens, AlphaStyle::Lowercase, "_", true)),
        (TextStyle::Dashes, delimited_length(tokens, AlphaStyle::Lowercase, "-", true)),
        (TextStyle::TitleCase, delimited_length(tokens, AlphaStyle::Capital, " ", true)),
    ];
    let single_capital = first_style == AlphaStyle::Caps && first.original_code().len() == 1;
    if first_style == AlphaStyle::Capital || single_capital {
        lengths.push((TextStyle::PascalCase, capitals_length(tokens)));
        lengths.push((TextStyle::Capitalized, 1));
    } else if first_style == AlphaStyle::Lowercase {
        lengths.push((TextStyle::Lowercase, 1));
        lengths.push((TextStyle::CamelCase, capitals_length(tokens)));
    }

    let max = lengths.iter().map(|&(_, len)| len).max().unwrap_or(0);
    let tied: Vec<TextStyle> = lengths
        .iter()
        .filter(|&&(_, len)| len == max)
        .map(|&(style, _)| style)
        .collect();
    let style = tied[rng.random_range(0..tied.len())];
    Some(AlphaPrefix { style, length: max })
}

/// `word delim word delim ...` with every word in `style`; digit runs may sit
/// anywhere after the first word.
fn delimited_length(tokens: &[Token], style: AlphaStyle, delimiter: &str, multiple_words: bool) -> usize {
    if tokens.first().and_then(Token::alpha_style) != Some(style) {
        return 0;
    }
    let mut i = 1;
    while i < tokens.len() {
        if tokens[i].kind == TokenKind::Number {
            i += 1;
        } else if i + 1 < tokens.len()
            && tokens[i].original_code() == delimiter
            && tokens[i + 1].alpha_style() == Some(style)
        {
            i += 2;
        } else {
            break;
        }
    }
    if multiple_words && i == 1 { 0 } else { i }
}

/// Camel/Pascal tail: capitalized or all-caps words and digit runs, with at
/// least one word.
fn capitals_length(tokens: &[Token]) -> usize {
    let mut i = 1;
    let mut found_alpha = false;
    while i < tokens.len() {
        match tokens[i].alpha_style() {
            Some(AlphaStyle::Capital | AlphaStyle::Caps) => found_alpha = true,
            _ if tokens[i].kind == TokenKind::Number => {}
            _ => break,
        }
        i += 1;
    }
    if found_alpha { i } else { 0 }
}

/// Every identifier run in `context`, mapped to its words without styling.
///
/// Keys borrow from `context`; equal runs found twice keep their first
/// position in the map.
pub fn alpha_numerics<'a, R: Rng>(context: &'a [Token], rng: &mut R) -> IndexMap<&'a [Token], Vec<String>> {
    let mut found: IndexMap<&'a [Token], Vec<String>> = IndexMap::new();
    let mut rest = context;
    while !rest.is_empty() {
        let Some(prefix) = alpha_prefix(rest, rng) else {
            rest = &rest[1..];
            continue;
        };
        let length = prefix.length.clamp(1, rest.len());
        let run = &rest[..length];
        found.entry(run).or_insert_with(|| {
            run.iter()
                .filter_map(|t| match t.kind {
                    TokenKind::Alpha(_) => Some(t.word()),
                    // Digits keep their spaced model form.
                    TokenKind::Number => Some(t.model_representation().into_owned()),
                    _ => None,
                })
                .collect()
        });
        rest = &rest[length..];
    }
    found
}

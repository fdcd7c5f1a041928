//! Identifier naming styles: detection and conversion.
//!
//! Conversions normalize first (`remove_style`): camel and Pascal boundaries
//! and `_`/`-` separators become spaces, everything is lowercased. They then
//! rebuild the target style from the plain words.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextStyle {
    Lowercase,
    Underscores,
    Dashes,
    CamelCase,
    PascalCase,
    Capitalized,
    AllCaps,
    TitleCase,
    Unknown,
}

impl TextStyle {
    pub const fn name(self) -> &'static str {
        match self {
            TextStyle::Lowercase => "LOWERCASE",
            TextStyle::Underscores => "UNDERSCORES",
            TextStyle::Dashes => "DASHES",
            TextStyle::CamelCase => "CAMEL_CASE",
            TextStyle::PascalCase => "PASCAL_CASE",
            TextStyle::Capitalized => "CAPITALIZED",
            TextStyle::AllCaps => "ALL_CAPS",
            TextStyle::TitleCase => "TITLE_CASE",
            TextStyle::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextStyle {
    type Err = String;

    /// Accepts the canonical names plus the short CLI spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let style = match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "lowercase" | "lower" => TextStyle::Lowercase,
            "underscores" | "snake" | "snake_case" => TextStyle::Underscores,
            "dashes" | "kebab" => TextStyle::Dashes,
            "camel_case" | "camel" => TextStyle::CamelCase,
            "pascal_case" | "pascal" => TextStyle::PascalCase,
            "capitalized" | "capital" => TextStyle::Capitalized,
            "all_caps" | "caps" => TextStyle::AllCaps,
            "title_case" | "title" => TextStyle::TitleCase,
            "unknown" => TextStyle::Unknown,
            other => return Err(format!("unknown text style: {other}")),
        };
        Ok(style)
    }
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect("valid style pattern"));
    };
}

pattern!(ALL_CAPS, r"^[A-Z]+(_[A-Z]+)*$");
pattern!(CAMEL_CASE, r"^[a-z][a-zA-Z]*$");
pattern!(CAPITALIZED, r"^[A-Z][a-z]*$");
pattern!(DASHES, r"^[a-z]+(-[a-z]+)*$");
pattern!(LOWERCASE, r"^[a-z ]+$");
pattern!(PASCAL_CASE, r"^[A-Z][a-zA-Z]*$");
pattern!(UNDERSCORES, r"^[a-z]+(_[a-z]+)*$");
pattern!(CAMEL_BOUNDARY, r"([a-z])([A-Z])");
pattern!(ACRONYM_BOUNDARY, r"([A-Z])([A-Z][a-z])");

/// Every style `s` satisfies; `{Unknown}` when none do.
pub fn get_style(s: &str) -> BTreeSet<TextStyle> {
    let checks: [(&Regex, TextStyle); 7] = [
        (&*LOWERCASE, TextStyle::Lowercase),
        (&*UNDERSCORES, TextStyle::Underscores),
        (&*CAMEL_CASE, TextStyle::CamelCase),
        (&*PASCAL_CASE, TextStyle::PascalCase),
        (&*CAPITALIZED, TextStyle::Capitalized),
        (&*ALL_CAPS, TextStyle::AllCaps),
        (&*DASHES, TextStyle::Dashes),
    ];

    let mut styles: BTreeSet<TextStyle> = checks
        .iter()
        .filter(|(re, _)| re.is_match(s))
        .map(|&(_, style)| style)
        .collect();
    if styles.is_empty() {
        styles.insert(TextStyle::Unknown);
    }
    styles
}

/// Convert to `style`; `Unknown` returns the input unchanged.
pub fn style(s: &str, style: TextStyle) -> String {
    match style {
        TextStyle::AllCaps => to_all_caps(s),
        TextStyle::CamelCase => to_camel_case(s),
        TextStyle::Capitalized => to_capitalized(s),
        TextStyle::Dashes => to_dashes(s),
        TextStyle::PascalCase => to_pascal_case(s),
        TextStyle::Underscores => to_underscores(s),
        TextStyle::Lowercase => to_lower_case(s),
        TextStyle::TitleCase => to_title_case(s),
        TextStyle::Unknown => s.to_string(),
    }
}

/// Plain lowercase words separated by spaces.
pub fn remove_style(s: &str, remove_contraction_quotes: bool) -> String {
    let s = CAMEL_BOUNDARY.replace_all(s, "$1 $2");
    let s = ACRONYM_BOUNDARY.replace_all(&s, "$1 $2");
    let s = s.replace(['_', '-'], " ").to_lowercase();
    if remove_contraction_quotes {
        s.replace('\'', "")
    } else {
        s
    }
}

fn words(s: &str) -> Vec<String> {
    remove_style(s, true)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fold runs of single-letter words into one word so the joined identifier
/// splits back into the same words ("a b c" would otherwise become "aBC",
/// which reads as the acronym "BC").
fn merge_single_letters(words: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(words.len());
    let mut prev_single = false;
    for word in words {
        let single = word.chars().count() == 1;
        match merged.last_mut() {
            Some(last) if single && prev_single => last.push_str(&word),
            _ => merged.push(word),
        }
        prev_single = single;
    }
    merged
}

pub fn to_all_caps(s: &str) -> String {
    to_underscores(s).to_uppercase()
}

pub fn to_capitalized(s: &str) -> String {
    capitalize(&remove_style(s, false))
}

pub fn to_camel_case(s: &str) -> String {
    let mut words = words(s);
    if words.is_empty() {
        return String::new();
    }
    let first = words.remove(0);
    let rest = merge_single_letters(words);
    std::iter::once(first)
        .chain(rest.iter().map(|w| capitalize(w)))
        .collect()
}

pub fn to_pascal_case(s: &str) -> String {
    merge_single_letters(words(s))
        .iter()
        .map(|w| capitalize(w))
        .collect()
}

pub fn to_title_case(s: &str) -> String {
    remove_style(s, false)
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn to_underscores(s: &str) -> String {
    words(s).join("_")
}

pub fn to_dashes(s: &str) -> String {
    words(s).join("-")
}

pub fn to_lower_case(s: &str) -> String {
    remove_style(s, false)
}

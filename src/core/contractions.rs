//! English contractions, as written and as a recognizer spells them.
//!
//! Transcripts arrive with apostrophes split out ("can ' t"). The tokenizer
//! needs the written forms to avoid splitting "can't" at the apostrophe, and
//! formatted text needs them to glue the spoken form back together.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

pub const ALL: &[&str] = &[
    "'cause", "I'd", "I'd've", "I'll", "I'll've", "I'm", "I've", "ain't", "aren't", "can't",
    "can't've", "could've", "couldn't", "couldn't've", "didn't", "doesn't", "don't", "hadn't",
    "hadn't've", "hasn't", "haven't", "he'd", "he'd've", "he'll", "he'll've", "he's", "here's",
    "how'd", "how'd'y", "how'll", "how's", "isn't", "it'd", "it'd've", "it'll", "it'll've",
    "it's", "let's", "ma'am", "mayn't", "might've", "mightn't", "mightn't've", "must've",
    "mustn't", "mustn't've", "needn't", "needn't've", "o'clock", "oughtn't", "oughtn't've",
    "sha'n't", "shan't", "shan't've", "she'd", "she'd've", "she'll", "she'll've", "she's",
    "should've", "shouldn't", "shouldn't've", "so's", "so've", "that'd", "that'd've", "that's",
    "there'd", "there'd've", "there's", "they'd", "they'd've", "they'll", "they'll've",
    "they're", "they've", "to've", "wasn't", "we'd", "we'd've", "we'll", "we'll've", "we're",
    "we've", "weren't", "what'll", "what'll've", "what're", "what's", "what've", "when's",
    "when've", "where'd", "where's", "where've", "who'll", "who'll've", "who's", "who've",
    "why's", "why've", "will've", "won't", "won't've", "would've", "wouldn't", "wouldn't've",
    "y'all", "y'all'd", "y'all'd've", "y'all're", "y'all've", "y'alls", "you'd", "you'd've",
    "you'll", "you'll've", "you're", "you've",
];

/// Spoken form ("can ' t") to written form ("can't").
static SPOKEN_TO_WRITTEN: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    ALL.iter()
        .map(|&c| (spoken_form(c), c))
        .collect()
});

static SPOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let mut keys: Vec<&String> = SPOKEN_TO_WRITTEN.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = keys
        .iter()
        .map(|k| {
            let open = if k.starts_with(|c: char| c.is_ascii_alphanumeric()) { r"\b" } else { "" };
            format!(r"{open}{}\b", regex::escape(k))
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("valid contraction pattern")
});

/// How a transcript spells a contraction: lowercase, apostrophe as its own word.
pub fn spoken_form(contraction: &str) -> String {
    contraction
        .to_lowercase()
        .replace('\'', " ' ")
        .trim()
        .to_string()
}

/// Contractions with their first letter forced to `upper` or lower case, in
/// reverse lexicographic order so a regex alternation prefers the longest.
pub fn sorted_for_matching(upper: bool) -> Vec<String> {
    let mut sorted: Vec<&str> = ALL.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted
        .into_iter()
        .map(|c| {
            let mut chars = c.chars();
            match chars.next() {
                Some(first) if upper => first.to_uppercase().chain(chars).collect(),
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Glue split-out apostrophes back together: "i ' m sure" becomes "I'm sure".
pub fn restore_contractions(text: &str) -> String {
    SPOKEN_PATTERN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            SPOKEN_TO_WRITTEN
                .get(&caps[0])
                .map_or_else(|| caps[0].to_string(), |w| (*w).to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoken_form() {
        assert_eq!(spoken_form("can't"), "can ' t");
        assert_eq!(spoken_form("I'd've"), "i ' d ' ve");
        assert_eq!(spoken_form("'cause"), "' cause");
    }

    #[test]
    fn test_restore_contractions() {
        assert_eq!(restore_contractions("i ' m sure you can ' t"), "I'm sure you can't");
        assert_eq!(restore_contractions("it ' ll ' ve"), "it'll've");
        assert_eq!(restore_contractions("plain words"), "plain words");
    }

    #[test]
    fn test_restore_requires_word_boundary() {
        assert_eq!(restore_contractions("scan ' t"), "scan ' t");
    }

    #[test]
    fn test_sorted_for_matching_puts_longer_first() {
        let lower = sorted_for_matching(false);
        let cant = lower.iter().position(|c| c == "can't").unwrap();
        let cant_ve = lower.iter().position(|c| c == "can't've").unwrap();
        assert!(cant_ve < cant);
        assert!(lower.contains(&"i'm".to_string()));
        assert!(sorted_for_matching(true).contains(&"Can't".to_string()));
    }
}

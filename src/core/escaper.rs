//! Escape marking for spoken words that must stay literal.
//!
//! "the word one" means the word "one", not the digit. Before the model sees
//! the transcript, the escape phrase is dropped and the following word is
//! tagged with [`PREFIX`]; decoding strips the tag again.

use crate::core::numbers::ESCAPE_PHRASES;

pub const PREFIX: &str = "ESCAPE_";

/// Replace every `<escape phrase> <word>` with `ESCAPE_<word>`.
///
/// An escape phrase at the very end (nothing left to escape) is kept as
/// ordinary words.
pub fn escape_words<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    let mut escaped = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let found = ESCAPE_PHRASES.iter().find(|phrase| {
            i + phrase.len() < words.len()
                && words[i..i + phrase.len()]
                    .iter()
                    .zip(phrase.iter())
                    .all(|(w, p)| w.as_ref() == *p)
        });
        match found {
            Some(phrase) => {
                escaped.push(format!("{PREFIX}{}", words[i + phrase.len()].as_ref()));
                i += phrase.len() + 1;
            }
            None => {
                escaped.push(words[i].as_ref().to_string());
                i += 1;
            }
        }
    }
    escaped
}

pub fn is_escaped(word: &str) -> bool {
    word.starts_with(PREFIX)
}

pub fn unescape_word(word: &str) -> &str {
    word.strip_prefix(PREFIX).unwrap_or(word)
}

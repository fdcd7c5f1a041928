//! Out-of-vocabulary substitution for the translation model.
//!
//! The model only knows the words in its lexicon. Every other word in a
//! request is swapped for `UNK<id>` on the way out and swapped back on the
//! way in. Ids come from a fixed pool; running out is an error the caller
//! handles by shrinking the request.

use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::{NoExpand, Regex};

use crate::core::error::UnknownsError;

pub const MAX_UNKNOWNS: usize = 20;
pub const PREFIX: &str = "UNK";

static UNKNOWN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bUNK(\d+)\b").expect("valid unknown pattern"));

/// Sentences with unknown words replaced, and the word-to-id map used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringsWithUnknowns {
    pub strings: Vec<String>,
    pub unknowns: IndexMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct UnknownReplacer {
    lexicon: HashSet<String>,
    deterministic: bool,
}

impl UnknownReplacer {
    /// With `deterministic`, ids are handed out in order 0, 1, 2, ...
    pub fn new(lexicon: HashSet<String>, deterministic: bool) -> Self {
        UnknownReplacer {
            lexicon,
            deterministic,
        }
    }

    pub fn lexicon(&self) -> &HashSet<String> {
        &self.lexicon
    }

    /// Replace every word outside the lexicon. The same word gets the same id
    /// across all `sentences`. Words containing an `UNK<n>` token are always
    /// replaced, so [`Self::resolve_unknowns`] restores the input exactly.
    pub fn strings_with_unknowns<S: AsRef<str>, R: Rng>(
        &self,
        sentences: &[S],
        rng: &mut R,
    ) -> Result<StringsWithUnknowns, UnknownsError> {
        let mut ids: Vec<usize> = (0..MAX_UNKNOWNS).collect();
        if !self.deterministic {
            ids.shuffle(rng);
        }
        let mut next_id = ids.into_iter();
        let mut unknowns: IndexMap<String, usize> = IndexMap::new();
        let mut strings = Vec::with_capacity(sentences.len());

        for sentence in sentences {
            let mut replaced = Vec::new();
            for word in sentence.as_ref().split(' ') {
                // a lexicon word that looks like an id would not survive resolve_unknowns
                if self.lexicon.contains(word) && !UNKNOWN_ID.is_match(word) {
                    replaced.push(word.to_string());
                    continue;
                }
                let id = match unknowns.get(word) {
                    Some(&id) => id,
                    None => {
                        let id = next_id
                            .next()
                            .ok_or(UnknownsError::HitMaxUnknowns { max: MAX_UNKNOWNS })?;
                        unknowns.insert(word.to_string(), id);
                        id
                    }
                };
                replaced.push(format!("{PREFIX}{id}"));
            }
            strings.push(replaced.join(" "));
        }

        Ok(StringsWithUnknowns { strings, unknowns })
    }

    /// Swap `UNK<id>` placeholders back to the words they stand for. Ids
    /// missing from the map are left alone.
    pub fn resolve_unknowns(&self, text: &str, unknowns: &IndexMap<String, usize>) -> String {
        UNKNOWN_ID
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let id = caps[1].parse::<usize>().ok();
                unknowns
                    .iter()
                    .find(|&(_, &v)| Some(v) == id)
                    .map_or_else(|| caps[0].to_string(), |(word, _)| word.clone())
            })
            .into_owned()
    }

    /// Replace already-mapped unknown words in `text` with their ids.
    pub fn replace_unknowns(&self, text: &str, unknowns: &IndexMap<String, usize>) -> String {
        let mut text = text.to_string();
        for (word, id) in unknowns {
            let Ok(pattern) = Regex::new(&format!(r"\b{}\b", regex::escape(word))) else {
                continue;
            };
            let replacement = format!("{PREFIX}{id}");
            text = pattern.replace_all(&text, NoExpand(&replacement)).into_owned();
        }
        text
    }

    /// Words in `text` that are neither lexicon words, mapped unknowns, nor
    /// `UNK` placeholders. A non-empty result means the model produced a
    /// token it was never given.
    pub fn additional_unknowns<'t>(&self, input: &StringsWithUnknowns, text: &'t str) -> Vec<&'t str> {
        text.split(' ')
            .filter(|w| {
                !input.unknowns.contains_key(*w) && !self.lexicon.contains(*w) && !w.starts_with(PREFIX)
            })
            .collect()
    }
}

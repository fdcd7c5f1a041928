//! Model input assembly.
//!
//! A request to the translation model is the spoken words plus two kinds of
//! context: the last few tokens before the slot, and identifiers from further
//! back whose words the user just spoke (so "user name" can come out as
//! `userName` when that is how the file spells it).

use indexmap::IndexMap;
use itertools::Itertools;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::core::alpha_numeric::alpha_numerics;
use crate::core::tokenizer::{Token, TokenKind};

/// Where a slot sits and what was said for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotContext {
    /// Whole file with the slot's generated text removed.
    pub source: String,
    pub english: String,
    /// Byte offset of the slot in `source`.
    pub slot_start: usize,
    /// Kind of syntactic container the slot fills, such as `call`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_container: Option<String>,
}

impl SlotContext {
    pub fn new(source: impl Into<String>, english: impl Into<String>, slot_start: usize) -> Self {
        SlotContext {
            source: source.into(),
            english: english.into(),
            slot_start,
            snippet_container: None,
        }
    }

    pub fn with_snippet_container(mut self, container: impl Into<String>) -> Self {
        self.snippet_container = Some(container.into());
        self
    }

    /// Everything before the slot.
    pub fn prefix(&self) -> &str {
        self.source.get(..self.slot_start).unwrap_or(&self.source)
    }
}

/// One encoded model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub alpha_subsequence_context: Vec<Vec<Token>>,
    pub leading_context: Vec<Token>,
    pub phrases: Vec<String>,
    pub snippet_container: Option<String>,
}

impl Input {
    /// `subseq ASD subseq ... CTX leading... ENG|SNIP_x phrases...`
    pub fn model_representation(&self) -> String {
        let delimiter = Token::structural(TokenKind::AlphaSubsequenceDelimiter);
        let context_start = Token::structural(TokenKind::ContextStart);
        let tail = match &self.snippet_container {
            Some(container) => Token::structural(TokenKind::SnippetContainer(container.clone())),
            None => Token::structural(TokenKind::EnglishStart),
        };

        let mut parts: Vec<String> = Vec::new();
        for (i, subsequence) in self.alpha_subsequence_context.iter().enumerate() {
            if i > 0 {
                parts.push(delimiter.model_representation().into_owned());
            }
            parts.extend(subsequence.iter().map(|t| t.model_representation().into_owned()));
        }
        parts.push(context_start.model_representation().into_owned());
        parts.extend(self.leading_context.iter().map(|t| t.model_representation().into_owned()));
        parts.push(tail.model_representation().into_owned());

        format!("{} {}", parts.join(" "), self.phrases.join(" "))
    }

    pub fn leading_context_representation(&self) -> String {
        self.leading_context
            .iter()
            .map(|t| t.model_representation())
            .join(" ")
    }
}

/// Limits for building [`Input`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConverter {
    /// Token budget for the sampled identifier context.
    pub max_subsequence_tokens: usize,
    /// How far back to search for identifiers.
    pub max_alpha_context: usize,
}

impl Default for InputConverter {
    fn default() -> Self {
        InputConverter {
            max_subsequence_tokens: 50,
            max_alpha_context: 1500,
        }
    }
}

fn capped_prior_context_start(prior: &[Token], max_context: usize) -> usize {
    prior.len().saturating_sub(max_context)
}

fn contains_sublist(words: &[String], needle: &[String]) -> bool {
    needle.is_empty() || words.windows(needle.len()).any(|w| w == needle)
}

impl InputConverter {
    /// Identifier runs in the part of `prior` that the model will not see
    /// directly.
    pub fn alpha_numerics<'a, R: Rng>(
        &self,
        prior: &'a [Token],
        max_context: usize,
        rng: &mut R,
    ) -> IndexMap<&'a [Token], Vec<String>> {
        let mut searched = &prior[..capped_prior_context_start(prior, max_context)];
        if searched.len() >= self.max_alpha_context {
            searched = &searched[searched.len() - self.max_alpha_context..];
            // Don't start in the middle of an identifier.
            let skip = searched
                .iter()
                .take_while(|t| t.is_alpha() || t.kind == TokenKind::Number)
                .count();
            searched = &searched[skip..];
        }
        alpha_numerics(searched, rng)
    }

    /// Identifier runs whose words were spoken, shuffled, thinned to
    /// `keep_proportion` and capped at the token budget.
    fn alpha_subsequences_context<R: Rng>(
        &self,
        alpha_numerics: &IndexMap<&[Token], Vec<String>>,
        words: &[String],
        keep_proportion: f64,
        rng: &mut R,
    ) -> Vec<Vec<Token>> {
        let mut matching: Vec<&[Token]> = alpha_numerics
            .iter()
            .filter(|(_, spoken)| contains_sublist(words, spoken))
            .map(|(&tokens, _)| tokens)
            .collect();
        matching.shuffle(rng);

        let mut sampled = Vec::new();
        let mut total = 0;
        for tokens in matching {
            if rng.random::<f64>() > keep_proportion {
                continue;
            }
            let count: usize = tokens
                .iter()
                .map(|t| t.model_representation().split(' ').count())
                .sum();
            if total + count + 1 > self.max_subsequence_tokens {
                break;
            }
            total += count;
            sampled.push(tokens.to_vec());
        }
        sampled
    }

    #[allow(clippy::too_many_arguments)]
    pub fn convert<R: Rng>(
        &self,
        prior: &[Token],
        alpha_numerics: &IndexMap<&[Token], Vec<String>>,
        words: &[String],
        max_context: usize,
        keep_proportion: f64,
        snippet_container: Option<String>,
        rng: &mut R,
    ) -> Input {
        let alpha_subsequence_context = self.alpha_subsequences_context(alpha_numerics, words, keep_proportion, rng);
        Input {
            alpha_subsequence_context,
            leading_context: prior[capped_prior_context_start(prior, max_context)..].to_vec(),
            phrases: words.to_vec(),
            snippet_container,
        }
    }
}

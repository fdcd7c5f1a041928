//! Client for the code translation service.
//!
//! - Builds one model sentence per slot from the file prefix and the spoken
//!   words, gated through the language's lexicon so the model never sees a
//!   word outside its vocabulary.
//! - Sends translate and rescore requests through a [`ModelTransport`]; the
//!   transport owns networking, timeouts and retries.
//! - Filters low-scoring and degenerate alternatives, restores unknown words
//!   and decodes the model representation back to code.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use indexmap::IndexMap;
use moka::sync::Cache;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::core::conversion_map::Language;
use crate::core::error::{EngineError, VoxError};
use crate::core::escaper::escape_words;
use crate::core::input::{InputConverter, SlotContext};
use crate::core::tokenizer::{Token, decode_model_representation, tokenize};
use crate::core::unknowns::{StringsWithUnknowns, UnknownReplacer};

/// Which model a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    AutoStyle,
    ContextualLanguageModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub model: Model,
    pub language: Language,
    pub input_sentences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationAlternative {
    pub sentence: String,
    /// Log probability; higher is better.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslationOutput {
    pub alternatives: Vec<TranslationAlternative>,
}

/// One output per input sentence, in request order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub outputs: Vec<TranslationOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescoringAlternative {
    pub input_sentence: String,
    pub output_sentence: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescoringRequest {
    pub model: Model,
    pub language: Language,
    pub alternatives: Vec<RescoringAlternative>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RescoringResponse {
    pub alternatives: Vec<RescoringAlternative>,
}

/// The wire to the translation service.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn translate(&self, request: TranslationRequest) -> Result<TranslationResponse, EngineError>;

    async fn rescore(&self, request: RescoringRequest) -> Result<RescoringResponse, EngineError>;
}

/// Tunables for [`CodeEngineClient`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_prior_context: usize,
    pub alternative_threshold: f64,
    pub deterministic_unknowns: bool,
    pub input: InputConverter,
    /// Seed for tie-breaking and sampling; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_prior_context: 35,
            alternative_threshold: -4.5,
            deterministic_unknowns: false,
            input: InputConverter::default(),
            seed: None,
        }
    }
}

const DEGENERATE_PATTERNS: [&str; 2] = ["NL NL NL NL", "SP SP SP SP SP SP SP SP"];

pub struct CodeEngineClient {
    transport: Arc<dyn ModelTransport>,
    options: EngineOptions,
    replacers: HashMap<Language, UnknownReplacer>,
    prefixes: Cache<String, Arc<Vec<Token>>>,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for CodeEngineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeEngineClient")
            .field("options", &self.options)
            .field("lexicons", &self.replacers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// One sentence per slot, ready to send.
struct PreparedTranslation {
    request: TranslationRequest,
    inputs: Vec<StringsWithUnknowns>,
}

impl CodeEngineClient {
    /// `lexicons` maps each language to its in-vocabulary words. Languages
    /// without a lexicon are sent unmodified.
    pub fn new(
        transport: Arc<dyn ModelTransport>,
        lexicons: HashMap<Language, HashSet<String>>,
        options: EngineOptions,
    ) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let replacers = lexicons
            .into_iter()
            .map(|(language, words)| (language, UnknownReplacer::new(words, options.deterministic_unknowns)))
            .collect();
        CodeEngineClient {
            transport,
            options,
            replacers,
            prefixes: Cache::new(256),
            rng: Mutex::new(rng),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn prior_context(&self, context: &SlotContext) -> Arc<Vec<Token>> {
        let prefix = context.prefix();
        self.prefixes
            .get_with(prefix.to_string(), || Arc::new(tokenize(prefix)))
    }

    fn prepare_translation(
        &self,
        language: Language,
        contexts: &[SlotContext],
    ) -> Result<PreparedTranslation, VoxError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let replacer = self.replacers.get(&language);
        let max_context = self.options.max_prior_context;

        let mut inputs = Vec::with_capacity(contexts.len());
        for context in contexts {
            let prior = self.prior_context(context);
            let alpha_numerics = self.options.input.alpha_numerics(&prior, max_context, &mut *rng);
            let words: Vec<&str> = context.english.split(' ').collect();
            let sentence = self
                .options
                .input
                .convert(
                    &prior,
                    &alpha_numerics,
                    &escape_words(&words),
                    max_context,
                    1.0,
                    context.snippet_container.clone(),
                    &mut *rng,
                )
                .model_representation();

            let gated = match replacer {
                Some(replacer) => replacer.strings_with_unknowns(&[sentence], &mut *rng)?,
                None => StringsWithUnknowns {
                    strings: vec![sentence],
                    unknowns: IndexMap::new(),
                },
            };
            inputs.push(gated);
        }

        let request = TranslationRequest {
            model: Model::AutoStyle,
            language,
            input_sentences: inputs.iter().flat_map(|s| s.strings.first().cloned()).collect(),
        };
        Ok(PreparedTranslation { request, inputs })
    }

    fn keep_alternative(&self, alternative: &TranslationAlternative) -> bool {
        alternative.score > self.options.alternative_threshold
            && !DEGENERATE_PATTERNS.iter().any(|p| alternative.sentence.contains(p))
    }

    /// Decoded alternatives for each slot, in input order.
    #[instrument(level = "debug", skip_all, fields(%language, slots = contexts.len()))]
    pub async fn translate(
        &self,
        language: Language,
        contexts: &[SlotContext],
    ) -> Result<Vec<Vec<TranslationAlternative>>, VoxError> {
        if contexts.is_empty() {
            return Ok(Vec::new());
        }

        let PreparedTranslation { request, inputs } = self.prepare_translation(language, contexts)?;
        let response = self.transport.translate(request).await?;
        if response.outputs.len() != inputs.len() {
            return Err(EngineError::MismatchedBatch {
                expected: inputs.len(),
                got: response.outputs.len(),
            }
            .into());
        }

        let results = response
            .outputs
            .into_iter()
            .zip(&inputs)
            .map(|(output, input)| {
                output
                    .alternatives
                    .into_iter()
                    .filter(|a| self.keep_alternative(a))
                    .map(|a| {
                        let resolved = match self.replacers.get(&language) {
                            Some(replacer) => replacer.resolve_unknowns(&a.sentence, &input.unknowns),
                            None => a.sentence,
                        };
                        TranslationAlternative {
                            sentence: decode_model_representation(&resolved),
                            score: a.score,
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            kept = results.iter().map(Vec::len).sum::<usize>(),
            "translation alternatives"
        );
        Ok(results)
    }

    /// Contextual language model scores for the spoken words given the text
    /// just before each slot.
    #[instrument(level = "debug", skip_all, fields(%language, slots = contexts.len()))]
    pub async fn rescore(
        &self,
        language: Language,
        contexts: &[SlotContext],
    ) -> Result<Vec<RescoringAlternative>, VoxError> {
        if contexts.is_empty() {
            return Ok(Vec::new());
        }

        let alternatives = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            contexts
                .iter()
                .map(|context| {
                    let prior = self.prior_context(context);
                    let input_sentence = self
                        .options
                        .input
                        .convert(
                            &prior,
                            &IndexMap::new(),
                            &[],
                            self.options.max_prior_context,
                            1.0,
                            context.snippet_container.clone(),
                            &mut *rng,
                        )
                        .leading_context_representation();
                    RescoringAlternative {
                        input_sentence,
                        output_sentence: context.english.clone(),
                        score: 0.0,
                    }
                })
                .collect()
        };

        let request = RescoringRequest {
            model: Model::ContextualLanguageModel,
            language,
            alternatives,
        };
        let response = self.transport.rescore(request).await?;
        Ok(response.alternatives)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Transport that answers from fixed tables and records every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        pub alternatives: Vec<Vec<(String, f64)>>,
        pub rescores: Vec<f64>,
        pub fail: bool,
        pub translated: Mutex<Vec<TranslationRequest>>,
        pub rescored: Mutex<Vec<RescoringRequest>>,
    }

    #[async_trait]
    impl ModelTransport for ScriptedTransport {
        async fn translate(&self, request: TranslationRequest) -> Result<TranslationResponse, EngineError> {
            let count = request.input_sentences.len();
            self.translated.lock().unwrap().push(request);
            if self.fail {
                return Err(EngineError::Transport("connection refused".into()));
            }
            let outputs = (0..count)
                .map(|i| TranslationOutput {
                    alternatives: self
                        .alternatives
                        .get(i)
                        .or(self.alternatives.last())
                        .into_iter()
                        .flatten()
                        .map(|(sentence, score)| TranslationAlternative {
                            sentence: sentence.clone(),
                            score: *score,
                        })
                        .collect(),
                })
                .collect();
            Ok(TranslationResponse { outputs })
        }

        async fn rescore(&self, request: RescoringRequest) -> Result<RescoringResponse, EngineError> {
            let mut alternatives = request.alternatives.clone();
            self.rescored.lock().unwrap().push(request);
            if self.fail {
                return Err(EngineError::Transport("connection refused".into()));
            }
            for (alternative, score) in alternatives.iter_mut().zip(&self.rescores) {
                alternative.score = *score;
            }
            Ok(RescoringResponse { alternatives })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use futures::executor::block_on;

    fn lexicon(words: &[&str]) -> HashMap<Language, HashSet<String>> {
        let mut map = HashMap::new();
        map.insert(Language::Python, words.iter().map(|w| w.to_string()).collect());
        map
    }

    fn client(transport: Arc<ScriptedTransport>, words: &[&str]) -> CodeEngineClient {
        let options = EngineOptions {
            deterministic_unknowns: true,
            seed: Some(7),
            ..EngineOptions::default()
        };
        CodeEngineClient::new(transport, lexicon(words), options)
    }

    #[test]
    fn test_translate_builds_model_sentences() {
        let transport = Arc::new(ScriptedTransport {
            alternatives: vec![vec![("get C user".into(), -0.5)]],
            ..ScriptedTransport::default()
        });
        let client = client(transport.clone(), &["CTX", "NL", "x", "SP", "=", "ENG", "get", "user", "C"]);
        let context = SlotContext::new("x = ", "get user", 4);

        let results = block_on(client.translate(Language::Python, &[context])).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0][0].sentence, "getUser");

        let sent = transport.translated.lock().unwrap();
        assert_eq!(sent[0].model, Model::AutoStyle);
        assert_eq!(sent[0].input_sentences, vec!["CTX NL x SP = SP ENG get user"]);
    }

    #[test]
    fn test_unknown_words_are_replaced_and_restored() {
        let transport = Arc::new(ScriptedTransport {
            alternatives: vec![vec![("UNK0 ( )".into(), -0.1)]],
            ..ScriptedTransport::default()
        });
        let client = client(transport.clone(), &["CTX", "NL", "ENG", "(", ")"]);
        let context = SlotContext::new("", "frobnicate", 0);

        let results = block_on(client.translate(Language::Python, &[context])).unwrap();
        assert_eq!(results[0][0].sentence, "frobnicate()");
        let sent = transport.translated.lock().unwrap();
        assert_eq!(sent[0].input_sentences, vec!["CTX NL ENG UNK0"]);
    }

    #[test]
    fn test_filters_low_scores_and_degenerate_output() {
        let transport = Arc::new(ScriptedTransport {
            alternatives: vec![vec![
                ("a".into(), -1.0),
                ("b".into(), -5.0),
                ("x NL NL NL NL".into(), -0.1),
                ("SP SP SP SP SP SP SP SP".into(), -0.1),
            ]],
            ..ScriptedTransport::default()
        });
        let client = CodeEngineClient::new(transport, HashMap::new(), EngineOptions::default());
        let results = block_on(client.translate(Language::Go, &[SlotContext::new("", "a", 0)])).unwrap();
        let sentences: Vec<&str> = results[0].iter().map(|a| a.sentence.as_str()).collect();
        assert_eq!(sentences, vec!["a"]);
    }

    #[test]
    fn test_rescore_sends_leading_context() {
        let transport = Arc::new(ScriptedTransport {
            rescores: vec![-2.5],
            ..ScriptedTransport::default()
        });
        let client = CodeEngineClient::new(transport.clone(), HashMap::new(), EngineOptions::default());
        let results = block_on(client.rescore(Language::Go, &[SlotContext::new("x := ", "one", 5)])).unwrap();
        assert_eq!(results[0].score, -2.5);
        let sent = transport.rescored.lock().unwrap();
        assert_eq!(sent[0].model, Model::ContextualLanguageModel);
        assert_eq!(sent[0].alternatives[0].input_sentence, "NL x SP : = SP");
        assert_eq!(sent[0].alternatives[0].output_sentence, "one");
    }

    #[test]
    fn test_transport_failure_propagates() {
        let transport = Arc::new(ScriptedTransport {
            fail: true,
            ..ScriptedTransport::default()
        });
        let client = CodeEngineClient::new(transport, HashMap::new(), EngineOptions::default());
        let err = block_on(client.translate(Language::Go, &[SlotContext::new("", "a", 0)])).unwrap_err();
        assert!(matches!(err, VoxError::Engine(EngineError::Transport(_))));
        assert!(block_on(client.translate(Language::Go, &[])).unwrap().is_empty());
    }

    #[test]
    fn test_too_many_unknowns_fail_the_request() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = client(transport, &[]);
        let english: Vec<String> = (0..30).map(|i| format!("w{i}")).collect();
        let context = SlotContext::new("", english.join(" "), 0);
        let err = block_on(client.translate(Language::Python, &[context])).unwrap_err();
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_wire_structs_serialize() {
        let request = TranslationRequest {
            model: Model::AutoStyle,
            language: Language::JavaScript,
            input_sentences: vec!["CTX ENG x".into()],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"model":"auto_style","language":"javascript","input_sentences":["CTX ENG x"]}"#
        );
        let back: TranslationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}

//! Resolver, batch queue and engine client wired together over an in-process
//! transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::executor::block_on;
use voxcode::core::engine::{
    RescoringRequest, RescoringResponse, TranslationAlternative, TranslationOutput, TranslationRequest,
    TranslationResponse,
};
use voxcode::core::{EngineError, Range};
use voxcode::infra::lexicon::{lexicon_path, load_lexicons};
use voxcode::{BatchQueue, CodeEngineClient, Diff, Language, ModelTransport, Resolver, Settings};

/// Answers every sentence with its spoken words in camel case, and records
/// what was sent.
#[derive(Default)]
struct CamelTransport {
    sent: Mutex<Vec<TranslationRequest>>,
}

fn camel_sentence(input: &str) -> String {
    let english = input
        .rsplit_once("ENG ")
        .map_or(input, |(_, e)| e);
    let mut words = english.split(' ');
    let mut sentence = words.next().unwrap_or_default().to_string();
    for word in words {
        sentence.push_str(" C ");
        sentence.push_str(word);
    }
    sentence
}

#[async_trait]
impl ModelTransport for CamelTransport {
    async fn translate(&self, request: TranslationRequest) -> Result<TranslationResponse, EngineError> {
        let outputs = request
            .input_sentences
            .iter()
            .map(|s| TranslationOutput {
                alternatives: vec![TranslationAlternative {
                    sentence: camel_sentence(s),
                    score: -0.25,
                }],
            })
            .collect();
        self.sent.lock().unwrap().push(request);
        Ok(TranslationResponse { outputs })
    }

    async fn rescore(&self, request: RescoringRequest) -> Result<RescoringResponse, EngineError> {
        let mut alternatives = request.alternatives;
        for alternative in &mut alternatives {
            alternative.score = -2.0;
        }
        Ok(RescoringResponse { alternatives })
    }
}

fn settings() -> Settings {
    Settings {
        deterministic_unknowns: true,
        seed: Some(11),
        ..Settings::default()
    }
}

#[test]
fn slots_queued_together_share_one_request() {
    let transport = Arc::new(CamelTransport::default());
    let settings = settings();
    let client = CodeEngineClient::new(transport.clone(), HashMap::new(), settings.engine_options());
    let queue = BatchQueue::new(Arc::new(client), Language::JavaScript);
    let resolver = settings.resolver();

    let first = resolver.resolve_english(
        Diff::from_initial_state("let a = ;", 8),
        Range::point(8),
        Language::JavaScript,
        "get user",
        Some(&queue),
    );
    let second = resolver.resolve_english(
        Diff::from_initial_state("b = ", 4),
        Range::point(4),
        Language::JavaScript,
        "user name",
        Some(&queue),
    );
    block_on(queue.flush());

    let first = block_on(first).unwrap();
    let second = block_on(second).unwrap();
    assert_eq!(first[0].diff.source(), "let a = getUser;");
    assert_eq!(first[0].diff.cursor(), 15);
    assert_eq!(first[0].auto_style_cost, Some(0.25));
    assert_eq!(first[0].contextual_language_model_cost, Some(2.0));
    assert_eq!(second[0].diff.source(), "b = userName");

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].input_sentences.len(), 2);
}

#[test]
fn lexicon_gates_unknown_words() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(lexicon_path(dir.path(), Language::Python), "CTX\nNL\nENG\nget\n").unwrap();
    let lexicons = load_lexicons(dir.path()).unwrap();

    let transport = Arc::new(CamelTransport::default());
    let settings = settings();
    let client = CodeEngineClient::new(transport.clone(), lexicons, settings.engine_options());
    let queue = BatchQueue::new(Arc::new(client), Language::Python);

    let pending = settings.resolver().resolve_english(
        Diff::from_initial_state("", 0),
        Range::point(0),
        Language::Python,
        "get frobnicate",
        Some(&queue),
    );
    block_on(queue.flush());
    let results = block_on(pending).unwrap();

    assert_eq!(results[0].diff.source(), "getFrobnicate");
    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent[0].input_sentences, vec!["CTX NL ENG get UNK0"]);
}

#[test]
fn disabled_snippet_languages_skip_the_model() {
    let transport = Arc::new(CamelTransport::default());
    let settings = Settings {
        ml_snippets_disabled: vec![Language::Python],
        ..settings()
    };
    let client = CodeEngineClient::new(transport.clone(), HashMap::new(), settings.engine_options());
    let queue = BatchQueue::new(Arc::new(client), Language::Python);

    let results = block_on(settings.resolver().resolve_english(
        Diff::from_initial_state("", 0),
        Range::point(0),
        Language::Python,
        "lambda x",
        Some(&queue),
    ))
    .unwrap();

    assert!(queue.is_empty());
    assert_eq!(results.len(), 1);
    assert!(results[0].auto_style_cost.is_none());
    assert!(transport.sent.lock().unwrap().is_empty());
}

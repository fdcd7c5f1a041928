//! Filling snippet templates into a source file.
//!
//! A template is code with `<%slot%>` placeholders plus the reserved
//! `cursor`, `indent`, `terminator` and `newline` names. Each slot is filled
//! from what the user said, either through formatted text or, for a single
//! free-form slot, through the translation model. Reserved names are then
//! resolved against the file being edited: its indentation unit, its
//! language's statement terminator, and the indentation of the line the
//! snippet lands on.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use tracing::instrument;

use crate::core::batch::BatchQueue;
use crate::core::conversion_map::{ConversionMap, Language, conversion_map};
use crate::core::diff::{Change, Diff};
use crate::core::error::VoxError;
use crate::core::formatted_text::{self, FormattedTextOptions};
use crate::core::input::SlotContext;
use crate::core::placeholder::{
    INDENT, TERMINATOR, normalize_reserved, replace_slot, resolve_cursor, slot_occurrences,
    strip_all, strip_cursors, unresolved_placeholders, wrap_in_slot,
};
use crate::core::range::Range;
use crate::core::whitespace::{indentation_at_cursor, indentation_token};

/// Slot name used by the english-only entry points.
pub const SNIPPET_SLOT: &str = "snippet";

static SNIPPET_FEATURES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(lambda|tag)\b").expect("valid snippet feature pattern"));

/// A resolved edit and how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffWithMetadata {
    pub diff: Diff,
    /// The inserted code without cursor markers or re-indentation.
    pub description: Option<String>,
    /// Negated model score, when the model produced this edit.
    pub auto_style_cost: Option<f64>,
    pub contextual_language_model_cost: Option<f64>,
    pub slot_context: Option<SlotContext>,
}

impl DiffWithMetadata {
    pub fn new(diff: Diff, description: impl Into<String>) -> Self {
        DiffWithMetadata {
            diff,
            description: Some(description.into()),
            auto_style_cost: None,
            contextual_language_model_cost: None,
            slot_context: None,
        }
    }

    /// Flat view for output: final source, cursor and every change.
    pub fn to_command(&self) -> EditCommand {
        EditCommand {
            source: self.diff.source(),
            cursor: self.diff.cursor(),
            changes: self.diff.changes().cloned().collect(),
            description: self.description.clone(),
            auto_style_cost: self.auto_style_cost,
            contextual_language_model_cost: self.contextual_language_model_cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditCommand {
    pub source: String,
    pub cursor: usize,
    pub changes: Vec<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_style_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual_language_model_cost: Option<f64>,
}

/// Everything needed to place one snippet.
#[derive(Debug, Clone)]
pub struct SnippetRequest {
    pub initial: Diff,
    /// Region of `initial`'s current source to replace.
    pub range: Range,
    pub language: Language,
    pub template: String,
    /// Spoken text per slot name.
    pub slots: IndexMap<String, String>,
    /// Options per slot occurrence; the last entry covers the rest.
    pub options: IndexMap<String, Vec<FormattedTextOptions>>,
    pub snippet_container: Option<String>,
    /// Use the model for a single slot even when options were given.
    pub override_single_slot_options: bool,
}

impl SnippetRequest {
    pub fn new(initial: Diff, range: Range, language: Language, template: impl Into<String>) -> Self {
        SnippetRequest {
            initial,
            range,
            language,
            template: template.into(),
            slots: IndexMap::new(),
            options: IndexMap::new(),
            snippet_container: None,
            override_single_slot_options: false,
        }
    }

    pub fn slot(mut self, name: impl Into<String>, english: impl Into<String>) -> Self {
        self.slots.insert(name.into(), english.into());
        self
    }

    pub fn options(mut self, name: impl Into<String>, options: Vec<FormattedTextOptions>) -> Self {
        self.options.insert(name.into(), options);
        self
    }
}

pub type Resolution = BoxFuture<'static, Result<Vec<DiffWithMetadata>, VoxError>>;

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    ml_snippets_disabled: HashSet<Language>,
    strict_placeholders: bool,
}

impl Resolver {
    pub fn new(ml_snippets_disabled: impl IntoIterator<Item = Language>, strict_placeholders: bool) -> Self {
        Resolver {
            ml_snippets_disabled: ml_snippets_disabled.into_iter().collect(),
            strict_placeholders,
        }
    }

    fn should_use_code_engine(&self, request: &SnippetRequest) -> bool {
        let mut slots = request.slots.values();
        let (Some(english), None) = (slots.next(), slots.next()) else {
            return false;
        };
        let disabled = self.ml_snippets_disabled.contains(&request.language) && SNIPPET_FEATURES.is_match(english);
        !disabled && (request.override_single_slot_options || request.options.is_empty())
    }

    /// Resolve every slot of `request`.
    ///
    /// A single free-form slot goes to the model through `queue`; the
    /// returned future completes after the queue is flushed. Without a queue,
    /// or in any other case, slots are filled with formatted text and the
    /// future is ready immediately. Multi-slot templates default to
    /// expression styling.
    #[instrument(level = "debug", skip_all, fields(language = %request.language, slots = request.slots.len()))]
    pub fn resolve(&self, request: SnippetRequest, queue: Option<&BatchQueue>) -> Resolution {
        let map = conversion_map(request.language);
        let template = normalize_reserved(&request.template);

        if let Some(queue) = queue.filter(|_| self.should_use_code_engine(&request)) {
            return self.resolve_slots_with_code_engine(request, map, template, queue);
        }

        let mut options = request.options.clone();
        for name in request.slots.keys() {
            options
                .entry(name.clone())
                .or_insert_with(|| vec![FormattedTextOptions::expression()]);
        }
        let resolved = self
            .resolve_slots_with_formatted_text(
                &request.initial,
                request.range,
                &map,
                &template,
                &request.slots,
                &options,
            )
            .map(|d| vec![d]);
        future::ready(resolved).boxed()
    }

    /// Speak one free-form snippet at `range`.
    pub fn resolve_english(
        &self,
        initial: Diff,
        range: Range,
        language: Language,
        english: &str,
        queue: Option<&BatchQueue>,
    ) -> Resolution {
        let request = SnippetRequest::new(initial, range, language, wrap_in_slot(SNIPPET_SLOT)).slot(SNIPPET_SLOT, english);
        self.resolve(request, queue)
    }

    /// Speak one snippet at `range` through formatted text only.
    pub fn resolve_english_with_formatted_text(
        &self,
        initial: &Diff,
        range: Range,
        language: Language,
        options: FormattedTextOptions,
        english: &str,
    ) -> Result<DiffWithMetadata, VoxError> {
        let map = conversion_map(language);
        let mut slots = IndexMap::new();
        slots.insert(SNIPPET_SLOT.to_string(), english.to_string());
        let mut slot_options = IndexMap::new();
        slot_options.insert(SNIPPET_SLOT.to_string(), vec![options]);
        self.resolve_slots_with_formatted_text(initial, range, &map, &wrap_in_slot(SNIPPET_SLOT), &slots, &slot_options)
    }

    fn resolve_slots_with_formatted_text(
        &self,
        initial: &Diff,
        range: Range,
        map: &ConversionMap,
        template: &str,
        slots: &IndexMap<String, String>,
        options: &IndexMap<String, Vec<FormattedTextOptions>>,
    ) -> Result<DiffWithMetadata, VoxError> {
        let mut generated = template.to_string();
        for (name, english) in slots {
            let occurrences = slot_occurrences(template, name).len();
            let values: Vec<String> = (0..occurrences)
                .map(|i| {
                    let slot_options = options
                        .get(name)
                        .and_then(|o| o.get(i).or(o.last()))
                        .copied()
                        .unwrap_or_default();
                    formatted_text::convert(english, &slot_options, map)
                })
                .collect();
            generated = replace_slot(&generated, name, &values);
        }
        resolve_reserved_slots(initial, range, &generated, map, self.strict_placeholders)
    }

    fn resolve_slots_with_code_engine(
        &self,
        request: SnippetRequest,
        map: Arc<ConversionMap>,
        template: String,
        queue: &BatchQueue,
    ) -> Resolution {
        let Some((name, english)) = request.slots.first().map(|(n, e)| (n.clone(), e.clone())) else {
            return future::ready(Ok(Vec::new())).boxed();
        };
        let source = request.initial.source();
        if let Err(error) = request.range.validate(&source) {
            return future::ready(Err(error.into())).boxed();
        }

        let generated = resolve_indents_and_terminators(&source, &strip_cursors(&template), &map);
        let slot_offset = slot_occurrences(&generated, &name)
            .first()
            .map_or(generated.len(), |&(start, _)| start);
        let slot_start = request.range.start + strip_all(&generated[..slot_offset]).len();
        let slot_context = SlotContext {
            source: format!(
                "{}{}{}",
                &source[..request.range.start],
                strip_all(&generated),
                &source[request.range.stop..]
            ),
            english,
            slot_start,
            snippet_container: request.snippet_container.clone(),
        };
        tracing::debug!(slot = %name, slot_start, "sending slot to code engine");

        let translations = queue.translate(slot_context.clone());
        let rescoring = queue.rescore(slot_context.clone());
        let strict = self.strict_placeholders;
        let SnippetRequest { initial, range, .. } = request;

        async move {
            let (translations, rescoring) = future::join(translations, rescoring).await;
            let contextual_cost = rescoring?.map(|r| -r.score);
            let mut results = Vec::new();
            for alternative in translations? {
                let filled = replace_slot(&template, &name, &[alternative.sentence]);
                let mut result = resolve_reserved_slots(&initial, range, &filled, &map, strict)?;
                result.auto_style_cost = Some(-alternative.score);
                result.contextual_language_model_cost = contextual_cost;
                result.slot_context = Some(slot_context.clone());
                results.push(result);
            }
            Ok::<_, VoxError>(results)
        }
        .boxed()
    }

    /// Resolve reserved placeholders in already-filled code and splice it
    /// into `initial` at `range`.
    pub fn resolve_reserved_slots(
        &self,
        initial: &Diff,
        range: Range,
        generated: &str,
        language: Language,
    ) -> Result<DiffWithMetadata, VoxError> {
        let map = conversion_map(language);
        resolve_reserved_slots(initial, range, &normalize_reserved(generated), &map, self.strict_placeholders)
    }
}

fn resolve_indents_and_terminators(source: &str, generated: &str, map: &ConversionMap) -> String {
    let indent = indentation_token(source, map.indentation());
    generated
        .replace(&wrap_in_slot(INDENT), &indent)
        .replace(&wrap_in_slot(TERMINATOR), map.statement_terminator())
}

/// Continue every line break at the indentation of the line the edit starts
/// on.
fn resolve_newlines(source: &str, range: Range, generated: &str) -> Result<String, VoxError> {
    let indentation = indentation_at_cursor(source, range.start)?;
    Ok(generated.replace('\n', &format!("\n{indentation}")))
}

fn check_unresolved(code: &str, strict: bool) -> Result<(), VoxError> {
    let unresolved = unresolved_placeholders(code);
    let Some(first) = unresolved.first() else {
        return Ok(());
    };
    if strict {
        return Err(VoxError::UnresolvedPlaceholder(first.clone()));
    }
    tracing::warn!(placeholders = ?unresolved, "leaving unresolved placeholders in output");
    Ok(())
}

fn resolve_reserved_slots(
    initial: &Diff,
    range: Range,
    generated: &str,
    map: &ConversionMap,
    strict: bool,
) -> Result<DiffWithMetadata, VoxError> {
    let source = initial.source();
    range.validate(&source)?;

    let with_reserved = resolve_indents_and_terminators(&source, generated, map);
    let replacement = resolve_cursor(&resolve_newlines(&source, range, &with_reserved)?);
    check_unresolved(&replacement.code, strict)?;
    let description = resolve_cursor(&with_reserved).code;

    let edit = Diff::from_initial_state(source, initial.cursor())
        .replace_range(range, &replacement.code)?
        .move_cursor(range.start + replacement.cursor);
    Ok(DiffWithMetadata::new(initial.then(&edit), description))
}

//! CLI handler for snippet resolution.
//!
//! Runs the resolver without a model connection: every slot is filled with
//! formatted text, reserved placeholders are expanded and the result is
//! spliced into the source.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use futures::executor::block_on;
use indexmap::IndexMap;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use crate::cli::{AppContext, OutputFormat};
use crate::core::placeholder::wrap_in_slot;
use crate::core::resolver::{SNIPPET_SLOT, SnippetRequest};
use crate::core::{Diff, FormattedTextOptions, Language, Range};
use crate::infra::config::load_settings;

#[derive(Debug, Clone, Args)]
pub struct ResolveArgs
{
    /// Spoken text for the default `snippet` slot
    #[arg(value_name = "WORDS", num_args = 0..)]
    pub words: Vec<String>,

    /// Source file to edit
    #[arg(long, short, conflicts_with = "source")]
    pub file: Option<PathBuf>,

    /// Source text to edit
    #[arg(long)]
    pub source: Option<String>,

    /// Language of the source
    #[arg(long, short, default_value = "default")]
    pub language: Language,

    /// Template with `<%name%>` slots
    #[arg(long, short)]
    pub template: Option<String>,

    /// Slot text as NAME=WORDS; repeatable
    #[arg(long = "slot", value_name = "NAME=WORDS", value_parser = parse_key_value)]
    pub slots: Vec<(String, String)>,

    /// Slot options as NAME=OPT[+OPT...]; repeat a name for later occurrences
    #[arg(long = "option", short = 'o', value_name = "NAME=OPTIONS", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,

    /// Byte offset where the replaced range starts; defaults to the cursor
    #[arg(long)]
    pub start: Option<usize>,

    /// Byte offset where the replaced range stops; defaults to start
    #[arg(long)]
    pub stop: Option<usize>,

    /// Cursor before the edit; defaults to the end of the source
    #[arg(long)]
    pub cursor: Option<usize>,

    /// Write the result back to --file
    #[arg(long, requires = "file")]
    pub write: bool,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String>
{
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    if key.is_empty()
    {
        return Err(format!("empty name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Build the request described by `args` against `source`.
pub fn build_request(
    args: &ResolveArgs,
    source: String,
) -> Result<SnippetRequest>
{
    let cursor = args
        .cursor
        .unwrap_or(source.len());
    let start = args
        .start
        .unwrap_or(cursor);
    let stop = args
        .stop
        .unwrap_or(start);
    let range = Range::checked(start, stop, &source)?;

    let template = args
        .template
        .clone()
        .unwrap_or_else(|| wrap_in_slot(SNIPPET_SLOT));
    let mut request = SnippetRequest::new(Diff::from_initial_state(source, cursor), range, args.language, template);

    if !args
        .words
        .is_empty()
    {
        request = request.slot(SNIPPET_SLOT, args.words.join(" "));
    }
    for (name, english) in &args.slots
    {
        request = request.slot(name.as_str(), english.as_str());
    }

    let mut options: IndexMap<String, Vec<FormattedTextOptions>> = IndexMap::new();
    for (name, names) in &args.options
    {
        let names: Vec<&str> = names
            .split('+')
            .map(str::trim)
            .collect();
        options
            .entry(name.clone())
            .or_default()
            .push(FormattedTextOptions::from_names(&names));
    }
    for (name, slot_options) in options
    {
        request = request.options(name, slot_options);
    }

    Ok(request)
}

#[instrument(level = "debug", skip_all, fields(language = %args.language))]
pub fn run(
    args: ResolveArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let source = match (&args.file, &args.source)
    {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(source)) => source.clone(),
        (None, None) => String::new(),
    };

    let settings = load_settings()?;
    let resolver = settings.resolver();
    let request = build_request(&args, source)?;
    debug!(slots = request.slots.len(), range = %request.range, "resolving");

    let mut resolved = block_on(resolver.resolve(request, None))?;
    if resolved.is_empty()
    {
        anyhow::bail!("Nothing to resolve");
    }
    let command = resolved
        .swap_remove(0)
        .to_command();

    if args.write
    {
        if let Some(path) = &args.file
        {
            std::fs::write(path, &command.source)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }

    match args.format
    {
        OutputFormat::Json =>
        {
            println!("{}", serde_json::to_string_pretty(&command).context("Failed to serialize edit")?);
        }
        OutputFormat::Text =>
        {
            if !args.write
            {
                println!("{}", command.source);
            }
            if !ctx.quiet
            {
                let summary = format!("cursor {} after {} change(s)", command.cursor, command.changes.len());
                if ctx.no_color
                {
                    eprintln!("{summary}");
                }
                else
                {
                    eprintln!("{}", summary.dimmed());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness
    {
        #[command(flatten)]
        args: ResolveArgs,
    }

    fn args(argv: &[&str]) -> ResolveArgs
    {
        let mut full = vec!["vox"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    #[test]
    fn test_parse_key_value()
    {
        assert_eq!(parse_key_value("name=user name").unwrap(), ("name".into(), "user name".into()));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_request_defaults_to_insertion_at_end()
    {
        let request = build_request(&args(&["get", "user"]), "x = ".to_string()).unwrap();
        assert_eq!(request.range, Range::point(4));
        assert_eq!(request.template, wrap_in_slot(SNIPPET_SLOT));
        assert_eq!(request.slots[SNIPPET_SLOT], "get user");
    }

    #[test]
    fn test_repeated_options_cover_occurrences()
    {
        let request = build_request(
            &args(&["--template", "<%n%>: <%n%>", "--slot", "n=user name", "-o", "n=camel", "-o", "n=pascal"]),
            String::new(),
        )
        .unwrap();
        let options = &request.options["n"];
        assert_eq!(options.len(), 2);
        assert_eq!(options[1], FormattedTextOptions::from_names(&["pascal"]));
    }

    #[test]
    fn test_out_of_bounds_range_is_rejected()
    {
        assert!(build_request(&args(&["--start", "10"]), "abc".to_string()).is_err());
    }
}

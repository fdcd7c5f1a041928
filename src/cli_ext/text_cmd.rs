//! CLI handlers for the stateless text transforms.
//!
//! Every command reads its input from arguments (or a file for `tokenize`),
//! prints the result to stdout, and supports `--format json` for scripting.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use itertools::Itertools;
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::instrument;

use crate::cli::{AppContext, OutputFormat};
use crate::core::formatted_text::{FormattedTextOptions, convert_for_language};
use crate::core::numbers::{convert_numbers, from_digits_to_text};
use crate::core::text_style::{TextStyle, get_style, style as apply_style};
use crate::core::tokenizer::{decode_model_representation, model_representation, tokenize as lex};
use crate::core::Language;

#[derive(Debug, Clone, Args)]
pub struct TokenizeArgs
{
    /// Source text; ignored when --file is given
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    /// Read the source from a file
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct DecodeArgs
{
    /// Space-separated model sentence, e.g. "x SP = SP 1"
    #[arg(value_name = "SENTENCE")]
    pub sentence: String,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct NumbersArgs
{
    /// Spoken words, e.g. "set x to twenty one"
    #[arg(value_name = "WORDS", required = true, num_args = 1..)]
    pub words: Vec<String>,

    /// Read a digit string back as words instead
    #[arg(long)]
    pub to_words: bool,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct StyleArgs
{
    /// Identifier or words to inspect
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Convert to this style (camel, pascal, snake, kebab, caps, ...)
    #[arg(long)]
    pub to: Option<TextStyle>,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct FormatArgs
{
    /// Spoken words, e.g. "get user name of x"
    #[arg(value_name = "WORDS", required = true, num_args = 1..)]
    pub words: Vec<String>,

    /// Language whose phrase tables to use
    #[arg(long, short, default_value = "default")]
    pub language: Language,

    /// Formatting options: expression, camel, pascal, underscores, caps,
    /// capital, dashes, lowercase
    #[arg(long = "option", short = 'o', value_delimiter = ',')]
    pub options: Vec<String>,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

fn print_json(value: &serde_json::Value) -> Result<()>
{
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

#[instrument(level = "debug", skip_all)]
pub fn tokenize(
    args: TokenizeArgs,
    _ctx: &AppContext,
) -> Result<()>
{
    let source = match (&args.file, args.source) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(source)) => source,
        (None, None) => anyhow::bail!("Provide SOURCE or --file"),
    };

    let tokens = lex(&source);
    let representation = model_representation(&tokens);

    match args.format
    {
        OutputFormat::Text => println!("{representation}"),
        OutputFormat::Json =>
        {
            print_json(&json!({
                "representation": representation,
                "tokens": tokens,
            }))?;
        }
    }
    Ok(())
}

pub fn decode(
    args: DecodeArgs,
    _ctx: &AppContext,
) -> Result<()>
{
    let code = decode_model_representation(&args.sentence);
    match args.format
    {
        OutputFormat::Text => println!("{code}"),
        OutputFormat::Json => print_json(&json!({ "code": code }))?,
    }
    Ok(())
}

pub fn numbers(
    args: NumbersArgs,
    _ctx: &AppContext,
) -> Result<()>
{
    let input = args
        .words
        .join(" ");
    let output = if args.to_words
    {
        from_digits_to_text(input.trim())
            .ok_or_else(|| anyhow::anyhow!("Not a digit string: {input}"))?
    }
    else
    {
        convert_numbers(&input)
    };

    match args.format
    {
        OutputFormat::Text => println!("{output}"),
        OutputFormat::Json => print_json(&json!({ "input": input, "output": output }))?,
    }
    Ok(())
}

pub fn style(
    args: StyleArgs,
    ctx: &AppContext,
) -> Result<()>
{
    if let Some(target) = args.to
    {
        let output = apply_style(&args.text, target);
        match args.format
        {
            OutputFormat::Text => println!("{output}"),
            OutputFormat::Json =>
            {
                print_json(&json!({ "input": args.text, "style": target, "output": output }))?
            }
        }
        return Ok(());
    }

    let styles: Vec<TextStyle> = get_style(&args.text)
        .into_iter()
        .collect();
    match args.format
    {
        OutputFormat::Json => print_json(&json!({ "input": args.text, "styles": styles }))?,
        OutputFormat::Text =>
        {
            let names = styles
                .iter()
                .map(|s| s.name())
                .join(", ");
            if ctx.no_color
            {
                println!("{}: {}", args.text, names);
            }
            else
            {
                println!("{}: {}", args.text.bold(), names.cyan());
            }
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip_all, fields(language = %args.language))]
pub fn format(
    args: FormatArgs,
    _ctx: &AppContext,
) -> Result<()>
{
    let input = args
        .words
        .join(" ");
    let options = FormattedTextOptions::from_names(&args.options);
    let output = convert_for_language(&input, &options, args.language);

    match args.format
    {
        OutputFormat::Text => println!("{output}"),
        OutputFormat::Json =>
        {
            print_json(&json!({
                "input": input,
                "language": args.language,
                "options": options,
                "output": output,
            }))?;
        }
    }
    Ok(())
}

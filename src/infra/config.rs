use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::{EngineOptions, InputConverter, Language, Resolver};

pub const CONFIG_FILES: [&str; 2] = ["voxcode.toml", ".voxcode.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings
{
    /// Tokens of prior context the model sees directly
    pub max_prior_context: usize,

    /// Tokens searched for identifiers the user may be repeating
    pub max_alpha_context: usize,

    /// Token budget for identifier context sent to the model
    pub max_subsequence_tokens: usize,

    /// Model alternatives scoring at or below this are dropped
    pub alternative_threshold: f64,

    /// Hand out unknown-word ids in order instead of shuffled
    pub deterministic_unknowns: bool,

    /// Languages whose lambda/tag phrases never go to the model
    pub ml_snippets_disabled: Vec<Language>,

    /// Directory holding `<language>_auto_style_lexicon.txt` files
    pub lexicon_dir: PathBuf,

    /// Fail instead of warning when a placeholder survives resolution
    pub strict_placeholders: bool,

    /// Seed for tie-breaking and sampling; unset seeds from the OS
    pub seed: Option<u64>,
}

impl Default for Settings
{
    fn default() -> Self
    {
        Self {
            max_prior_context: 35,
            max_alpha_context: 1500,
            max_subsequence_tokens: 50,
            alternative_threshold: -4.5,
            deterministic_unknowns: false,
            ml_snippets_disabled: Vec::new(),
            lexicon_dir: PathBuf::from("lexicons"),
            strict_placeholders: false,
            seed: None,
        }
    }
}

impl Settings
{
    pub fn engine_options(&self) -> EngineOptions
    {
        EngineOptions {
            max_prior_context: self.max_prior_context,
            alternative_threshold: self.alternative_threshold,
            deterministic_unknowns: self.deterministic_unknowns,
            input: InputConverter {
                max_subsequence_tokens: self.max_subsequence_tokens,
                max_alpha_context: self.max_alpha_context,
            },
            seed: self.seed,
        }
    }

    pub fn resolver(&self) -> Resolver
    {
        Resolver::new(
            self.ml_snippets_disabled
                .iter()
                .copied(),
            self.strict_placeholders,
        )
    }
}

/// Load settings from the first config file found in `dir`, then
/// `VOXCODE_*` environment variables.
pub fn load_settings_from(dir: &Path) -> Result<Settings>
{
    let mut builder = config::Config::builder();

    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // Keys keep their underscores: VOXCODE_MAX_PRIOR_CONTEXT
    builder = builder.add_source(
        config::Environment::with_prefix("VOXCODE")
            .prefix_separator("_")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("ml_snippets_disabled"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Settings = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn load_settings() -> Result<Settings>
{
    load_settings_from(Path::new("."))
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let settings = Settings::default();
    let toml_string =
        toml::to_string_pretty(&settings).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

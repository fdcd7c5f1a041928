use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli_ext::resolve_cmd::ResolveArgs;
use crate::cli_ext::text_cmd::{DecodeArgs, FormatArgs, NumbersArgs, StyleArgs, TokenizeArgs};

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
}

#[derive(Parser)]
#[command(name = "vox")]
#[command(
    about = "Text engine for voice-driven code editing: spoken numbers, naming styles, model codec and snippet resolution"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the model representation of source code
    Tokenize(TokenizeArgs),

    /// Turn a model sentence back into source code
    Decode(DecodeArgs),

    /// Replace spoken numbers with digits
    Numbers(NumbersArgs),

    /// Detect or convert identifier naming styles
    Style(StyleArgs),

    /// Convert a spoken phrase into code without the model
    Format(FormatArgs),

    /// Fill a snippet template and apply it to a source file
    Resolve(ResolveArgs),

    /// Initialize a voxcode.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vox", "decode", "x SP = SP 1", "--no-color"]).unwrap();
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Decode(_)));
    }
}

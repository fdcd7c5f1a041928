use anyhow::Result;
use clap::Parser;
use voxcode::cli::{AppContext, Cli, Commands};
use voxcode::cli_ext::{resolve_cmd, text_cmd};

fn main() -> Result<()> {
    voxcode::infra::logging::init_tracing();
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Tokenize(args) => text_cmd::tokenize(args, &ctx),
        Commands::Decode(args) => text_cmd::decode(args, &ctx),
        Commands::Numbers(args) => text_cmd::numbers(args, &ctx),
        Commands::Style(args) => text_cmd::style(args, &ctx),
        Commands::Format(args) => text_cmd::format(args, &ctx),
        Commands::Resolve(args) => resolve_cmd::run(args, &ctx),
        Commands::Init(args) => voxcode::infra::config::init(args, &ctx),
        Commands::Completions(args) => voxcode::completion::run(args, &ctx),
    }
}

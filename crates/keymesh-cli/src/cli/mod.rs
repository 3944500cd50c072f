//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;

use crate::config::Config;
use crate::logging;

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.quiet);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration; `config set` may create the file
    let config = if matches!(cli.command, Commands::Config(_)) {
        Config::load_or_default(cli.config.as_deref())?
    } else {
        Config::load(cli.config.as_deref())?
    };

    // Flag beats config file beats default
    let output_format = cli.output.or(config.output_format).unwrap_or_default();

    // Create context for commands
    let ctx = commands::Context {
        config_path: cli.config,
        output_format,
        explain: cli.explain || config.explain_by_default,
        config,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Issue(args) => commands::issue::execute(&ctx, &args),
        Commands::InitCa(args) => commands::init_ca::execute(&ctx, &args),
        Commands::Fingerprint(args) => commands::fingerprint::execute(&ctx, &args),
        Commands::List(args) => commands::list::execute(&ctx, &args),
        Commands::Config(args) => commands::config::execute(&ctx, args),
    }
}

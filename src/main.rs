//! reddit-persona - cited user personas from public Reddit activity
//!
//! Fetches a user's public posts and comments, asks an OpenAI-compatible
//! model to describe the person behind them, and writes a text persona
//! with links back to the content each trait was drawn from.

mod cli;
mod config;
mod error;
mod fetcher;
mod logging;
mod normalizer;
mod pipeline;
mod retry;
mod synthesizer;
#[cfg(test)]
mod test_server;
mod types;
mod version;
mod writer;

use clap::Parser;
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::config::PersonaConfig;
use crate::error::{Error, Result};
use crate::pipeline::RunOptions;

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        debug!(error = %e.format_for_log(), "Exiting with error");
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Version) => {
            version::print_version();
            return Ok(());
        }
        Some(Commands::Config { subcommand }) => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand);
        }
        None => {}
    }

    let url = cli
        .url
        .as_deref()
        .ok_or_else(|| Error::invalid_url("", "a Reddit profile URL is required"))?;

    let mut config = PersonaConfig::load(cli.config.as_deref())?;
    RunOptions {
        max_posts: cli.max_posts,
        output_dir: cli.output_dir.clone(),
        model: cli.model.clone(),
    }
    .apply(&mut config);

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    info!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting reddit-persona"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    let summary = runtime.block_on(pipeline::run(&config, url))?;

    if !cli.quiet {
        if let Some(caveat) = summary.data_quality.caveat() {
            eprintln!("{}", caveat);
        }
        eprintln!(
            "Analyzed {} item(s) for u/{} ({} citation(s))",
            summary.items, summary.username, summary.citations
        );
    }
    println!("Persona saved to: {}", summary.output_path.display());

    Ok(())
}

fn handle_config_command(subcommand: cli::ConfigSubcommand) -> Result<()> {
    use cli::ConfigSubcommand;

    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = PersonaConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            PersonaConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}

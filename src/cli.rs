//! CLI argument parsing using clap v4

use clap::{Parser, Subcommand};

/// Generate a cited user persona from a Reddit profile
///
/// Fetches the user's public posts and comments, asks an OpenAI-compatible
/// model for a persona, and writes `<output-dir>/<username>_persona.txt`.
/// Requires the OPENAI_API_KEY environment variable.
#[derive(Parser, Debug)]
#[command(name = "reddit-persona")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, subcommand_negates_reqs = true)]
pub struct Cli {
    /// Reddit profile URL, e.g. https://www.reddit.com/user/kojied/
    #[arg(value_name = "REDDIT_USER_URL", required = true)]
    pub url: Option<String>,

    /// Maximum number of posts and comments to analyze
    #[arg(long, value_name = "N")]
    pub max_posts: Option<usize>,

    /// Directory the persona file is written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "REDDIT_PERSONA_CONFIG")]
    pub config: Option<String>,

    /// Model identifier for the generation service
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

//! CLI command definitions for the `omaha` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod chat;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

use omaha_infra::client::DEFAULT_ASK_URL;
use omaha_infra::config::DEFAULT_CONFIG_FILE;

/// Ask the Oracle of Omaha: a streaming persona chat relay.
#[derive(Parser)]
#[command(name = "omaha", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server.
    Serve {
        /// Port to listen on (overrides the config file).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides the config file).
        #[arg(long)]
        host: Option<String>,

        /// Path to the configuration file.
        #[arg(short, long, env = "OMAHA_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// Ask a single question and stream the answer to stdout.
    Ask {
        /// The question to ask.
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,

        /// Relay endpoint.
        #[arg(long, env = "OMAHA_URL", default_value = DEFAULT_ASK_URL)]
        url: String,
    },

    /// Start an interactive chat session.
    Chat {
        /// Relay endpoint.
        #[arg(long, env = "OMAHA_URL", default_value = DEFAULT_ASK_URL)]
        url: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// "thinking..." spinner shown until the first delta arrives.
pub(crate) fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

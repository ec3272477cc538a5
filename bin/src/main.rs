//! qdown CLI - Mirror an object storage bucket into a local directory.

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "qdown")]
#[command(about = "Mirror an object storage bucket into a local directory", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    ///
    /// - `-v` shows debug logs from qdown
    /// - `-vv` shows trace logs from qdown
    /// - `-vvv` shows trace logs from qdown and its dependencies
    ///
    /// RUST_LOG is honoured when set.
    #[arg(short, long, action = ArgAction::Count, global = true, verbatim_doc_comment)]
    verbose: u8,

    /// Quiet mode (errors only, no progress output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every object of a bucket that is missing locally
    Download {
        /// Path to the JSON download configuration
        config: PathBuf,

        /// Number of concurrent downloads (clamped to 1..=100)
        #[arg(short, long, default_value = "5")]
        threads: usize,

        /// Directory for the bucket listing file. Defaults to the user cache directory.
        #[arg(long)]
        list_dir: Option<PathBuf>,

        /// Use an existing listing file instead of listing the bucket
        #[arg(long)]
        listing: Option<PathBuf>,

        /// Per-request timeout in seconds (no timeout when omitted)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List known zones and their endpoints
    Zones,

    /// Print a time-limited download URL for a private bucket
    Sign {
        /// Path to the JSON download configuration providing the credentials
        #[arg(short, long)]
        config: PathBuf,

        /// Expiry as a Unix timestamp. Defaults to 24 hours from now.
        #[arg(short, long)]
        deadline: Option<i64>,

        /// Public URL of the object
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(log_directive(cli.verbose, cli.quiet));

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Download {
            config,
            threads,
            list_dir,
            listing,
            timeout,
        } => {
            commands::download::download(&config, threads, list_dir, listing, timeout, cli.quiet)
                .await
        }
        Commands::Zones => commands::zones::list_zones(),
        Commands::Sign {
            config,
            deadline,
            url,
        } => commands::sign::sign(&config, &url, deadline),
    }
}

fn log_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "qdown=info",
        1 => "qdown=debug",
        2 => "qdown=trace",
        _ => "trace",
    }
}

/// Installs the stderr subscriber. The `qdown` target prefix covers every workspace crate.
fn setup_logging(directive: &str) {
    let mut env_filter = EnvFilter::new("warn");
    if let Ok(d) = directive.parse() {
        env_filter = env_filter.add_directive(d);
    }
    if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
        for d in env.split(',').filter_map(|d| d.parse().ok()) {
            env_filter = env_filter.add_directive(d);
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

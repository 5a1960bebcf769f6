// SPDX-License-Identifier: GPL-3.0-only

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod cli;

#[derive(Parser)]
#[command(name = "qrscan")]
#[command(about = "Scan QR codes from camera frames and look up the result")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Configuration file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive scanner in the terminal
    Terminal {
        /// Image files or directories replayed as camera frames
        #[arg(short, long, required = true, num_args = 1..)]
        source: Vec<PathBuf>,

        #[command(flatten)]
        options: cli::ScanOptions,
    },

    /// Scan images until a code is found, then print the lookup result
    Scan {
        /// Image files or directories replayed as camera frames
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Seconds to wait for a detection
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        #[command(flatten)]
        options: cli::ScanOptions,
    },

    /// Decode every QR code in a single image
    Decode {
        /// Image file
        file: PathBuf,

        /// Print the values as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qrscan=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Terminal { source, options }) => {
            let config = cli::load_config(config_path, &options)?;
            let source = cli::open_source(&source, &config, &options)?;
            qrscan::terminal::run(config, Arc::new(source))
        }
        Some(Commands::Scan {
            files,
            json,
            timeout,
            options,
        }) => {
            let config = cli::load_config(config_path, &options)?;
            cli::scan(&files, config, &options, Duration::from_secs(timeout), json)
        }
        Some(Commands::Decode { file, json }) => {
            let config = cli::load_config(config_path, &cli::ScanOptions::default())?;
            cli::decode(&file, &config, json)
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keepsake - files forwarded Telegram messages into Google Drive.
//!
//! This is the binary entry point.

mod digest;
mod health;
mod serve;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use keepsake_config::{ConfigError, KeepsakeConfig};

/// Keepsake - files forwarded Telegram messages into Google Drive.
#[derive(Parser, Debug)]
#[command(name = "keepsake", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot.
    Serve,
    /// Write the daily digest for one topic and exit.
    Digest {
        /// Topic folder to summarize.
        #[arg(long)]
        topic: String,
        /// Date to summarize (YYYY-MM-DD). Defaults to yesterday.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Validate configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&std::path::Path>) -> Result<KeepsakeConfig, Vec<ConfigError>> {
    match path {
        Some(path) => keepsake_config::load_and_validate_path(path),
        None => keepsake_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            keepsake_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Digest { topic, date }) => digest::run_digest(&config, &topic, date).await,
        Some(Commands::CheckConfig) => {
            println!(
                "keepsake: config OK (bot.name={}, digest={}, health={})",
                config.bot.name,
                if config.digest.enabled { "on" } else { "off" },
                if config.health.enabled { "on" } else { "off" },
            );
            Ok(())
        }
        None => {
            println!("keepsake: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

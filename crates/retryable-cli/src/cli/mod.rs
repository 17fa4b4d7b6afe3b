//! CLI for the retryable fetcher.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use retryable_core::config;

use commands::{run_clear, run_config, run_fetch, run_retry, FetchArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "retryable")]
#[command(about = "Fetch URLs and retry them when the network comes back", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch one or more URLs, keeping I/O failures pending until retried.
    Fetch {
        /// HTTP/HTTPS URLs to fetch.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Extra request header, "Name: value". Repeatable.
        #[arg(long = "header", short = 'H', value_name = "HEADER")]
        headers: Vec<String>,

        /// Do not run the connectivity probe; retries only happen via `retryable retry`.
        #[arg(long)]
        no_probe: bool,
    },

    /// Ask a running fetch to retry every pending call now.
    Retry,

    /// Ask a running fetch to forget every pending call.
    Clear,

    /// Print the config file path and effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch {
                urls,
                headers,
                no_probe,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_fetch(
                    &cfg,
                    FetchArgs {
                        urls,
                        headers,
                        probe: !no_probe,
                    },
                )
                .await?
            }
            CliCommand::Retry => run_retry().await?,
            CliCommand::Clear => run_clear().await?,
            CliCommand::Config => run_config()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

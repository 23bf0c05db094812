//! sharerelay entry point.
//!
//! stdout carries only command output (JSON, or NDJSON progress for
//! `relay`); logs go to stderr.

mod app;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "sharerelay", version, about = "Relay shared files into a Dropbox folder")]
struct Cli {
    /// Configuration file (defaults to ~/.config/sharerelay/config.toml).
    #[arg(long, global = true, env = "SHARERELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every file in a share.
    List {
        /// Share URL or bare share id.
        share: String,
    },
    /// List a share and resolve a download link for every file.
    Links {
        share: String,
    },
    /// Show the account behind a Dropbox token.
    CheckToken {
        #[arg(long, env = "DROPBOX_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Relay files, writing progress events to stdout.
    Relay {
        /// Relay request JSON (`-` for stdin).
        #[arg(long, conflicts_with = "share")]
        request: Option<PathBuf>,
        /// Relay every file of this share instead of a request.
        #[arg(long)]
        share: Option<String>,
        #[arg(long, env = "DROPBOX_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Destination folder (with --share).
        #[arg(long)]
        folder: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(cli.command, config))
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::List { share } => print_json(&app::list(&config, &share).await?),
        Command::Links { share } => print_json(&app::links(&config, &share).await?),
        Command::CheckToken { token } => {
            let token = resolve_token(token, &config)?;
            let account = app::check_token(&config, &token).await?;
            print_json(&AccountOutput {
                name: account.display_name,
                email: account.email,
            })
        }
        Command::Relay {
            request,
            share,
            token,
            folder,
        } => {
            let request = match (request, share) {
                (Some(path), _) => app::read_request(&path)?,
                (None, Some(share)) => {
                    let token = resolve_token(token, &config)?;
                    app::request_for_share(&config, &share, token, folder).await?
                }
                (None, None) => anyhow::bail!("relay needs --request or --share"),
            };

            let mut stdout = tokio::io::stdout();
            let summary = app::relay(&config, request, &mut stdout).await?;
            tracing::info!(
                ok = summary.ok,
                failed = summary.failed,
                total = summary.total,
                "relay finished"
            );
            if summary.cancelled {
                anyhow::bail!("output closed before the relay finished");
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct AccountOutput {
    name: String,
    email: String,
}

fn resolve_token(flag: Option<String>, config: &Config) -> anyhow::Result<String> {
    flag.or_else(|| config.dropbox_token.clone())
        .filter(|t| !t.trim().is_empty())
        .context("no Dropbox token: pass --token, set DROPBOX_TOKEN or dropbox_token in the config")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

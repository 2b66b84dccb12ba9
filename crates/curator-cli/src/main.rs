// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use curator_application::AppState;
use curator_config::{load as load_config, TelemetryConfig};
use curator_plex::MediaKind;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "curator", version, about = "Plex watchlist maintenance")]
struct Cli {
    /// TOML configuration file (environment variables prefixed CURATOR_ override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect or prune the Plex watchlist
    #[command(subcommand)]
    Watchlist(WatchlistCommand),
}

#[derive(Debug, Subcommand)]
enum WatchlistCommand {
    /// Print the watchlist as JSON
    List {
        #[arg(long, value_enum)]
        kind: KindArg,
    },
    /// Remove entries matching a title and print the outcome as JSON
    Remove(RemoveArgs),
}

#[derive(Debug, Args)]
struct RemoveArgs {
    #[arg(long, value_enum)]
    kind: KindArg,

    #[arg(long)]
    title: String,

    /// Release year; films only
    #[arg(long)]
    year: Option<i32>,

    /// Match without removing anything
    #[arg(long)]
    dry_run: bool,
}

impl RemoveArgs {
    fn validate(&self) -> Result<()> {
        if self.year.is_some() && matches!(self.kind, KindArg::Series) {
            bail!("--year only applies to films");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    #[value(alias = "movie")]
    Film,
    #[value(alias = "show")]
    Series,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Film => MediaKind::Film,
            KindArg::Series => MediaKind::Series,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.telemetry);

    let state = AppState::new(config)?;
    state.on_start();

    let credentials = state.credentials.credentials()?;
    info!(target: "cli", base_url = %credentials.base_url, "using configured plex account");
    let token = credentials.token.as_str();

    match cli.command {
        Command::Watchlist(WatchlistCommand::List { kind }) => {
            let listing = state.reconciler.list(token, kind.into()).await?;
            info!(target: "cli", count = listing.items.len(), "watchlist listed");
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Watchlist(WatchlistCommand::Remove(args)) => {
            args.validate()?;
            let outcome = match MediaKind::from(args.kind) {
                MediaKind::Film => {
                    state
                        .reconciler
                        .remove_film_by_title(token, &args.title, args.year, args.dry_run)
                        .await?
                }
                MediaKind::Series => {
                    state
                        .reconciler
                        .remove_series_by_title(token, &args.title, args.dry_run)
                        .await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

fn init_tracing(telemetry: &TelemetryConfig) {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use scout_watcher::web::{self, AppState};
use scout_watcher::{check_once, AppConfig, CheckConfig, CheckRequest, CheckScheduler, SiteChecker};

#[derive(Parser)]
#[command(name = "scout-watcher", version, about)]
struct Cli {
    /// Extra configuration file layered over the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single check and exit (default)
    Once(CheckArgs),
    /// Check on a fixed interval until Ctrl-C
    Watch(WatchArgs),
    /// Serve the start/stop form
    Serve,
}

#[derive(Args, Default)]
struct CheckArgs {
    #[arg(long)]
    search_term: Option<String>,

    /// Maximum distance in jumps
    #[arg(long, allow_hyphen_values = true)]
    threshold: Option<String>,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    check: CheckArgs,

    /// Minutes between checks
    #[arg(long, allow_hyphen_values = true)]
    interval: Option<String>,
}

/// Configured defaults with any command line overrides applied.
fn resolve_check(
    config: &AppConfig,
    args: &CheckArgs,
    interval: Option<&String>,
) -> scout_watcher::Result<CheckConfig> {
    let mut request = CheckRequest::from(&config.check);
    if let Some(term) = &args.search_term {
        request.search_term = term.clone();
    }
    if let Some(threshold) = &args.threshold {
        request.distance_threshold = threshold.clone();
    }
    if let Some(interval) = interval {
        request.interval_minutes = interval.clone();
    }
    Ok(request.validate()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let _log_guard = scout_watcher::logging::init(&config.logging)?;

    info!("Starting Scout Watcher...");

    let checker = Arc::new(SiteChecker::from_config(&config));

    match cli.command.unwrap_or(Command::Once(CheckArgs::default())) {
        Command::Once(args) => {
            let check = resolve_check(&config, &args, None)?;
            check_once(checker.as_ref(), &check).await;
        }
        Command::Watch(args) => {
            let check = resolve_check(&config, &args.check, args.interval.as_ref())?;
            let scheduler = CheckScheduler::new(checker, config.scheduler.clone());
            scheduler.start_config(check).await;

            tokio::signal::ctrl_c().await?;
            info!("Shutting down...");
            scheduler.shutdown().await;
        }
        Command::Serve => {
            let scheduler = Arc::new(CheckScheduler::new(checker, config.scheduler.clone()));
            web::serve(AppState {
                scheduler,
                config: Arc::new(config),
            })
            .await?;
        }
    }

    Ok(())
}

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use postwatch_core::app::{AccountStatus, OrchestratorBuilder, log_stats};
use postwatch_core::impls::{FileDocumentStore, InMemoryDocumentStore, ScriptedFeed};
use postwatch_core::ports::DocumentStore;
use postwatch_core::Settings;
use tokio::signal;
use tracing::info;

/// postwatch - follow feed posts from discovery until they fade out.
#[derive(Parser, Debug)]
#[command(name = "postwatch")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll every configured account until interrupted
    Run(ConfigPathArg),

    /// Validate the configuration file and print the resolved setup
    Check(ConfigPathArg),
}

#[derive(Parser, Debug)]
struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "postwatch.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Check(args) => check(args),
    }
}

fn load(args: &ConfigPathArg) -> Result<Settings> {
    Settings::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))
}

async fn run(args: ConfigPathArg) -> Result<()> {
    let settings = load(&args)?;
    logging::init(&settings.logging);

    let Some(fixture) = settings.feed.fixture.as_ref() else {
        bail!("[feed] fixture is required: no live feed client is bundled");
    };
    let store: Arc<dyn DocumentStore> = match &settings.store.root {
        Some(root) => Arc::new(FileDocumentStore::new(root)),
        None => Arc::new(InMemoryDocumentStore::new()),
    };

    let mut builder = OrchestratorBuilder::from_settings(&settings).store(store);
    for account in &settings.accounts {
        let feed = ScriptedFeed::from_json_file(fixture)
            .await
            .with_context(|| format!("loading feed fixture for {}", account.location))?;
        builder = builder.account(account.location.clone(), Arc::new(feed));
    }
    let orchestrator = builder.build()?;
    let registries = orchestrator.registries();

    info!(accounts = registries.len(), "postwatch starting");
    tokio::select! {
        _ = orchestrator.run() => {}
        _ = signal::ctrl_c() => {
            info!("shutdown signal received, abandoning in-flight watchers");
        }
    }

    let statuses: Vec<_> = registries.iter().map(|r| AccountStatus::of(r)).collect();
    log_stats(&statuses);
    info!("postwatch stopped");
    Ok(())
}

fn check(args: ConfigPathArg) -> Result<()> {
    let settings = load(&args)?;
    let hotness = settings.watch.hotness();
    let summary = serde_json::json!({
        "config": args.config.display().to_string(),
        "accounts": settings.accounts.iter().map(|a| &a.location).collect::<Vec<_>>(),
        "channel": settings.discovery.channel,
        "discovery_interval_secs": [
            settings.discovery.min_interval_secs,
            settings.discovery.max_interval_secs,
        ],
        "initial_backoff_secs": settings.watch.initial_backoff_secs,
        "gravity": hotness.gravity,
        "threshold": hotness.threshold,
        "done_capacity": settings.watch.done_capacity,
        "store": settings.store.root.as_ref().map(|p| p.display().to_string()),
        "feed_fixture": settings.feed.fixture.as_ref().map(|p| p.display().to_string()),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

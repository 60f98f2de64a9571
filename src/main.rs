//! relay-throttle binary.
//!
//! Reads relay input messages from stdin, writes verdicts to stdout and logs
//! to stderr.

use anyhow::Context;
use clap::Parser;
use relay_throttle::cli::Cli;
use relay_throttle::infrastructure::transport;
use relay_throttle::{DecisionEngine, InMemoryStore, KeyValueStore, RateLimitConfig, StoreUrl};
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "relay-throttle stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout carries verdicts
        .with_ansi(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.to_config().context("invalid configuration")?;

    info!(
        interval_ms = config.interval().as_millis() as u64,
        ban_interval_ms = config.ban_interval().as_millis() as u64,
        max = config.max(),
        whitelisted = config.whitelist().len(),
        database_url = config.database_url(),
        "relay-throttle starting"
    );

    match config.store().clone() {
        StoreUrl::Memory => {
            let store = InMemoryStore::new();
            let purge = store.spawn_purge_task(cli.purge_period());
            let result = serve(store, config).await;
            purge.abort();
            result
        }
        #[cfg(feature = "redis-storage")]
        StoreUrl::Redis(url) => {
            let store = relay_throttle::RedisStore::connect(&url)
                .await
                .with_context(|| format!("failed to connect to {url}"))?;
            serve(store, config).await
        }
        #[cfg(not(feature = "redis-storage"))]
        StoreUrl::Redis(url) => anyhow::bail!("{url} needs the redis-storage feature"),
    }
}

async fn serve<S>(store: S, config: RateLimitConfig) -> anyhow::Result<()>
where
    S: KeyValueStore + Clone,
{
    let engine = DecisionEngine::new(store, config);
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    let written = transport::run(&engine, stdin, stdout).await?;

    let snapshot = engine.metrics().snapshot();
    info!(
        verdicts = written,
        accepted = snapshot.accepted,
        rejected = snapshot.rejected,
        shadow_rejected = snapshot.shadow_rejected,
        drop_rate = snapshot.drop_rate(),
        "input closed"
    );
    Ok(())
}

//! vidmirror — incremental mirror of a channel's video attachments.
//!
//! Walks the channel feed oldest-first, skips videos already present locally
//! (size + caption heuristic), downloads the rest one at a time, and
//! survives expired payload references and gateway rate limits without
//! losing run progress. Safe to re-run: every pass rebuilds its duplicate
//! index from the storage directory.

#![warn(clippy::all)]

mod cli;
mod config;
mod feed;
mod heartbeat;
mod paths;
mod retry;
mod shutdown;
mod sync;
mod types;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use feed::{ChannelRef, HttpFeed};
use retry::RetryPolicy;
use sync::SyncContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = config::Config::resolve(cli)?;
    tracing::info!(
        channel = %config.channel,
        directory = %config.directory.display(),
        dry_run = config.dry_run,
        "starting vidmirror"
    );

    let feed = HttpFeed::new(
        config.gateway_url.clone(),
        config.api_token.clone(),
        config.page_size,
    )?;
    let ctx = SyncContext {
        channel: ChannelRef::new(config.channel.clone()),
        storage_dir: config.directory.clone(),
        dry_run: config.dry_run,
    };
    let policy = RetryPolicy {
        max_pass_attempts: config.max_pass_attempts,
        ..Default::default()
    };

    let shutdown_token = shutdown::install();

    loop {
        let run_token = shutdown_token.child_token();
        let heartbeat = heartbeat::spawn(config.heartbeat_interval, run_token.clone());

        let result = sync::supervisor::run(&feed, &ctx, &policy, &shutdown_token).await;

        run_token.cancel();
        let _ = heartbeat.await;

        let outcome = result?;
        if outcome.interrupted {
            tracing::info!(stats = %outcome.stats, "interrupted, partial results");
            return Ok(());
        }
        tracing::info!(stats = %outcome.stats, "run complete");

        match config.watch_with_interval {
            Some(secs) if !shutdown_token.is_cancelled() => {
                tracing::info!(secs, "waiting before next run");
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                    _ = shutdown_token.cancelled() => {
                        tracing::info!("shutdown during wait, exiting");
                        return Ok(());
                    }
                }
            }
            _ => return Ok(()),
        }
    }
}

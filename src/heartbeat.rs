//! Liveness heartbeat.
//!
//! A detached task that logs elapsed wall-clock time at a fixed interval,
//! giving unattended runs a sign of life between slow downloads. It shares
//! nothing with the engine except the cancellation token that stops it, and
//! can neither observe nor alter run statistics.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub fn spawn(interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = tokio::time::Instant::now();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick of a tokio interval completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let elapsed = started.elapsed().as_secs();
                    tracing::info!(
                        elapsed = %format_args!("{}:{:02}", elapsed / 60, elapsed % 60),
                        "still running"
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let handle = spawn(Duration::from_secs(10), cancel.clone());

        tokio::time::advance(Duration::from_secs(25)).await;
        assert!(!handle.is_finished());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pre_cancelled_token_exits_promptly() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let handle = spawn(Duration::from_secs(10), cancel);
        handle.await.unwrap();
    }
}

//! Run supervisor — drives `run_pass` to completion under the pass-level
//! retry policy.
//!
//! Rate-limit waits restart the pass without consuming the attempt budget;
//! the rebuilt dedup index makes the restart cheap since everything already
//! saved is skipped. Any other pass failure consumes one attempt, up to
//! `max_pass_attempts`.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{run_pass, PassOutcome, RunStats, SyncContext};
use crate::feed::MessageFeed;
use crate::retry::{PassError, RetryPolicy};

/// Final result of a supervised run.
#[derive(Debug)]
pub struct RunOutcome {
    pub stats: RunStats,
    /// True when the run stopped at a cancellation point instead of
    /// draining the stream.
    pub interrupted: bool,
}

pub async fn run<F: MessageFeed + ?Sized>(
    feed: &F,
    ctx: &SyncContext,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> anyhow::Result<RunOutcome> {
    let mut failed_attempts: u32 = 0;
    loop {
        match run_pass(feed, ctx, cancel).await {
            Ok(PassOutcome::Complete(stats)) => {
                return Ok(RunOutcome {
                    stats,
                    interrupted: false,
                })
            }
            Ok(PassOutcome::Interrupted(stats)) => {
                return Ok(RunOutcome {
                    stats,
                    interrupted: true,
                })
            }
            Err(PassError::RateLimited { wait }) => {
                // Stats from the aborted pass are discarded; the next pass
                // rebuilds the index from disk and recounts.
                tracing::warn!(wait_secs = wait.as_secs(), "rate limited, suspending pass");
                if sleep_or_cancel(wait, cancel).await {
                    return Ok(RunOutcome {
                        stats: RunStats::default(),
                        interrupted: true,
                    });
                }
            }
            Err(PassError::Failed(error)) => {
                failed_attempts += 1;
                if failed_attempts >= policy.max_pass_attempts {
                    return Err(error.context(format!(
                        "giving up after {} failed passes",
                        failed_attempts
                    )));
                }
                let delay = policy.attempt_delay();
                tracing::warn!(
                    error = %error,
                    attempt = failed_attempts,
                    max = policy.max_pass_attempts,
                    delay_secs = delay.as_secs(),
                    "pass failed, retrying"
                );
                if sleep_or_cancel(delay, cancel).await {
                    return Ok(RunOutcome {
                        stats: RunStats::default(),
                        interrupted: true,
                    });
                }
            }
        }
    }
}

/// Sleep for `duration`, returning true when cancellation cut it short.
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

//! Sync engine — one chronological pass over the channel's video messages.
//!
//! The pass owns the dedup index and the processed-id set exclusively;
//! downloads run one at a time so every duplicate check sees the result of
//! all earlier downloads in the pass. Item failures never abort the pass;
//! rate limits and stream failures escape to the run supervisor.

pub mod dedup;
pub mod supervisor;

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::feed::{ChannelRef, FeedError, MessageFeed, VideoMessage};
use crate::paths;
use crate::retry::{ItemDisposition, PassError};
use self::dedup::DedupIndex;

/// Per-run parameters, built once in `main` and shared by every pass.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub channel: ChannelRef,
    pub storage_dir: PathBuf,
    pub dry_run: bool,
}

/// Counters accumulated over one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub downloaded: u64,
    pub skipped: u64,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} downloaded, {} skipped", self.downloaded, self.skipped)
    }
}

/// How a pass ended when it did not fail.
#[derive(Debug)]
pub enum PassOutcome {
    /// The stream was drained to its natural end.
    Complete(RunStats),
    /// Cancellation was observed at a suspension point.
    Interrupted(RunStats),
}

enum ItemResult {
    /// Saved under this filename (already recorded on disk).
    Downloaded(String),
    /// Given up for this pass; reconsidered next run.
    Abandoned,
}

/// Run one pass: build the index, walk the stream oldest-first, download
/// what the index doesn't already cover.
pub async fn run_pass<F: MessageFeed + ?Sized>(
    feed: &F,
    ctx: &SyncContext,
    cancel: &CancellationToken,
) -> Result<PassOutcome, PassError> {
    let mut index =
        DedupIndex::build(&ctx.storage_dir).map_err(|e| PassError::Failed(e.into()))?;
    tracing::info!(channel = %ctx.channel, indexed = index.len(), "starting pass");

    let mut stats = RunStats::default();
    let mut processed: HashSet<u64> = HashSet::new();

    let mut messages = feed.video_messages(&ctx.channel);
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(%stats, "pass interrupted");
                return Ok(PassOutcome::Interrupted(stats));
            }
            next = messages.next() => next,
        };
        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(error)) => return Err(error.into()),
            None => break,
        };

        if processed.contains(&message.id) {
            tracing::debug!(id = message.id, "already handled in this pass");
            continue;
        }

        let label = paths::sanitize_label(&message.text);
        let size = message.video.size;

        if index.matches(size, &label) {
            tracing::debug!(id = message.id, size, label = %label, "duplicate, skipping");
            stats.skipped += 1;
            processed.insert(message.id);
            continue;
        }

        match download_item(feed, ctx, &message, &label).await? {
            ItemResult::Downloaded(filename) => {
                stats.downloaded += 1;
                index.record(size, filename);
                processed.insert(message.id);
            }
            ItemResult::Abandoned => {}
        }
    }

    tracing::info!(%stats, "pass finished");
    Ok(PassOutcome::Complete(stats))
}

/// Download one message's video, honoring the item-level retry contract:
/// an expired payload reference earns exactly one refresh-and-retry, rate
/// limits escalate to the pass, anything else abandons the item.
async fn download_item<F: MessageFeed + ?Sized>(
    feed: &F,
    ctx: &SyncContext,
    message: &VideoMessage,
    label: &str,
) -> Result<ItemResult, PassError> {
    let (dest, filename) = destination(ctx, label, message.video.size);

    if ctx.dry_run {
        tracing::info!(id = message.id, file = %filename, "dry run: would download");
        return Ok(ItemResult::Downloaded(filename));
    }

    tracing::info!(id = message.id, size = message.video.size, file = %filename, "downloading");
    let first = match feed.fetch(message, &dest).await {
        Ok(()) => return Ok(ItemResult::Downloaded(filename)),
        Err(error) => error,
    };

    match ItemDisposition::classify(&first) {
        ItemDisposition::Escalate => Err(first.into()),
        ItemDisposition::Abandon => {
            tracing::warn!(id = message.id, error = %first, "download failed, leaving for next run");
            Ok(ItemResult::Abandoned)
        }
        ItemDisposition::RefreshAndRetry => {
            tracing::warn!(id = message.id, "payload reference expired, refreshing");
            let fresh = match feed.resolve(&ctx.channel, message.id).await {
                Ok(fresh) => fresh,
                Err(error) => return escalate_or_abandon(error, message.id),
            };
            match feed.fetch(&fresh, &dest).await {
                Ok(()) => Ok(ItemResult::Downloaded(filename)),
                Err(error) => escalate_or_abandon(error, message.id),
            }
        }
    }
}

/// Post-refresh failures get no further retries: anything short of a rate
/// limit abandons the item.
fn escalate_or_abandon(error: FeedError, id: u64) -> Result<ItemResult, PassError> {
    match ItemDisposition::classify(&error) {
        ItemDisposition::Escalate => Err(error.into()),
        _ => {
            tracing::warn!(id, error = %error, "retry after refresh failed, leaving for next run");
            Ok(ItemResult::Abandoned)
        }
    }
}

/// Destination path for a label. An existing file under the plain name means
/// a different video shares the label (a same-size file would have been
/// deduped), so the new file gets a size suffix instead of overwriting.
fn destination(ctx: &SyncContext, label: &str, size: u64) -> (PathBuf, String) {
    let mut filename = paths::video_filename(label);
    let mut dest = ctx.storage_dir.join(&filename);
    if dest.exists() {
        filename = paths::add_size_suffix(&filename, size);
        dest = ctx.storage_dir.join(&filename);
    }
    (dest, filename)
}

use std::time::Duration;

use thiserror::Error;

/// Failure kinds surfaced by the feed gateway.
///
/// The retry policy pattern-matches on these: `ReferenceExpired` earns one
/// refresh-and-retry per item, `RateLimited` suspends the whole pass, and
/// everything else abandons the item until the next run.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("rate limited, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("payload reference expired for message {id}")]
    ReferenceExpired { id: u64 },

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Http {
        source: reqwest::Error,
        url: String,
    },

    #[error("malformed gateway response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("disk error: {0}")]
    Disk(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FeedError {
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::RateLimited {
            retry_after: Duration::from_secs(retry_after_secs),
        }
    }
}

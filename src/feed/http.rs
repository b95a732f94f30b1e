//! HTTP feed gateway client.
//!
//! Speaks a small JSON API: cursor-paged chronological message listings,
//! single-message resolution for refreshing expired payload handles, and
//! streaming payload downloads written through a `.part` temp file.

use std::path::Path;
use std::time::Duration;

use futures_util::stream::{self, TryStreamExt};
use futures_util::StreamExt;
use reqwest::StatusCode;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::error::FeedError;
use super::message::{ChannelRef, MessagePage, VideoMessage};
use super::MessageFeed;
use crate::paths;

/// Wait applied when the gateway rate-limits without a `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

pub struct HttpFeed {
    client: reqwest::Client,
    base_url: String,
    token: String,
    page_size: u32,
}

impl HttpFeed {
    pub fn new(base_url: String, token: String, page_size: u32) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vidmirror/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            page_size,
        })
    }

    async fn list_page(
        &self,
        channel: &ChannelRef,
        cursor: Option<&str>,
    ) -> Result<MessagePage, FeedError> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel);
        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("kind", "video"), ("order", "asc")])
            .query(&[("limit", self.page_size)]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request.send().await.map_err(|source| FeedError::Http {
            source,
            url: url.clone(),
        })?;
        let response = check_listing_status(response, &url)?;
        let body = response.bytes().await.map_err(|source| FeedError::Http {
            source,
            url: url.clone(),
        })?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait::async_trait]
impl MessageFeed for HttpFeed {
    fn video_messages(
        &self,
        channel: &ChannelRef,
    ) -> futures_util::stream::BoxStream<'_, Result<VideoMessage, FeedError>> {
        struct PageState {
            cursor: Option<String>,
            exhausted: bool,
        }

        let channel = channel.clone();
        let seed = PageState {
            cursor: None,
            exhausted: false,
        };
        Box::pin(
            stream::try_unfold((channel, seed), move |(channel, mut state)| async move {
                if state.exhausted {
                    return Ok::<_, FeedError>(None);
                }
                let page = self.list_page(&channel, state.cursor.as_deref()).await?;
                state.cursor = page.next;
                state.exhausted = state.cursor.is_none();
                let batch = stream::iter(page.messages.into_iter().map(Ok::<_, FeedError>));
                Ok(Some((batch, (channel, state))))
            })
            .try_flatten(),
        )
    }

    async fn resolve(&self, channel: &ChannelRef, id: u64) -> Result<VideoMessage, FeedError> {
        let url = format!("{}/channels/{}/messages/{}", self.base_url, channel, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| FeedError::Http {
                source,
                url: url.clone(),
            })?;
        let response = check_listing_status(response, &url)?;
        let body = response.bytes().await.map_err(|source| FeedError::Http {
            source,
            url: url.clone(),
        })?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch(&self, message: &VideoMessage, dest: &Path) -> Result<(), FeedError> {
        let url = &message.video.download_url;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| FeedError::Http {
                source,
                url: url.clone(),
            })?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(FeedError::RateLimited {
                    retry_after: retry_after(response.headers()),
                })
            }
            // The gateway serves 410 once a payload handle has expired.
            StatusCode::GONE => return Err(FeedError::ReferenceExpired { id: message.id }),
            status if !status.is_success() => {
                return Err(FeedError::Status {
                    status: status.as_u16(),
                    url: url.clone(),
                })
            }
            _ => {}
        }

        let part = paths::part_path(dest);
        // Any partial file from an earlier interrupted attempt starts over.
        let _ = fs::remove_file(&part).await;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&part)
            .await?;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| FeedError::Http {
                source,
                url: url.clone(),
            })?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        fs::rename(&part, dest).await?;
        Ok(())
    }
}

/// Map a non-success listing/resolve response to a `FeedError`.
fn check_listing_status(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, FeedError> {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => Err(FeedError::RateLimited {
            retry_after: retry_after(response.headers()),
        }),
        status if !status.is_success() => Err(FeedError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        }),
        _ => Ok(response),
    }
}

/// Parse a `Retry-After` seconds value, falling back to the default wait.
fn retry_after(headers: &reqwest::header::HeaderMap) -> Duration {
    let secs = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_retry_after_parses_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("17"));
        assert_eq!(retry_after(&headers), Duration::from_secs(17));
    }

    #[test]
    fn test_retry_after_defaults_when_absent() {
        let headers = HeaderMap::new();
        assert_eq!(
            retry_after(&headers),
            Duration::from_secs(DEFAULT_RETRY_AFTER_SECS)
        );
    }

    #[test]
    fn test_retry_after_defaults_on_http_date() {
        // HTTP-date form of Retry-After is not worth parsing here
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(
            retry_after(&headers),
            Duration::from_secs(DEFAULT_RETRY_AFTER_SECS)
        );
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let feed = HttpFeed::new("https://gw.example/api/".into(), "tok".into(), 50).unwrap();
        assert_eq!(feed.base_url, "https://gw.example/api");
    }
}

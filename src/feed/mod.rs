//! Remote feed access: the trait seam the sync engine runs against, plus
//! the HTTP gateway implementation used by the binary.
//!
//! The engine never talks to the network directly; everything it needs from
//! the remote side is expressed by [`MessageFeed`], so tests drive it with a
//! scripted in-memory feed.

pub mod error;
pub mod http;
pub mod message;

use std::path::Path;

use futures_util::stream::BoxStream;

pub use error::FeedError;
pub use http::HttpFeed;
pub use message::{ChannelRef, VideoAttachment, VideoMessage};

/// Read side of the remote message feed plus the payload fetch capability.
#[async_trait::async_trait]
pub trait MessageFeed: Send + Sync {
    /// Lazy stream of the channel's video messages, oldest first.
    ///
    /// Items arrive in the order the gateway delivers them; the engine
    /// processes them in exactly that order.
    fn video_messages(
        &self,
        channel: &ChannelRef,
    ) -> BoxStream<'_, Result<VideoMessage, FeedError>>;

    /// Re-resolve a single message by id, yielding a fresh payload handle.
    async fn resolve(&self, channel: &ChannelRef, id: u64) -> Result<VideoMessage, FeedError>;

    /// Stream the video payload into `dest`.
    ///
    /// `dest` only comes into existence once the payload is complete; an
    /// interrupted transfer leaves at most a `.part` temp file behind.
    async fn fetch(&self, message: &VideoMessage, dest: &Path) -> Result<(), FeedError>;
}

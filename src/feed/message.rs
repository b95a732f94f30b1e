use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Channel handle as understood by the gateway — a numeric id or an
/// `@name`, passed through verbatim in request paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef(String);

impl ChannelRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One feed message carrying a video attachment.
///
/// Immutable once observed, except that the attachment's `download_url` may
/// go stale server-side; re-resolving the message by `id` yields a fresh one.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoMessage {
    pub id: u64,
    pub date: DateTime<Utc>,
    /// Caption text; empty when the message had none.
    #[serde(default)]
    pub text: String,
    pub video: VideoAttachment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoAttachment {
    /// Payload size in bytes, as reported by the gateway.
    pub size: u64,
    /// Expirable handle to the payload bytes.
    pub download_url: String,
}

/// One page of the chronological message listing.
#[derive(Debug, Deserialize)]
pub(crate) struct MessagePage {
    pub messages: Vec<VideoMessage>,
    /// Opaque cursor for the next page; `None` on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message() {
        let raw = r#"{
            "id": 42,
            "date": "2024-05-01T12:00:00Z",
            "text": "beach day",
            "video": {"size": 1048576, "download_url": "https://cdn.example/v/42"}
        }"#;
        let msg: VideoMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.id, 42);
        assert_eq!(msg.text, "beach day");
        assert_eq!(msg.video.size, 1_048_576);
    }

    #[test]
    fn test_decode_message_without_text() {
        let raw = r#"{
            "id": 7,
            "date": "2024-05-01T12:00:00Z",
            "video": {"size": 10, "download_url": "https://cdn.example/v/7"}
        }"#;
        let msg: VideoMessage = serde_json::from_str(raw).unwrap();
        assert!(msg.text.is_empty());
    }

    #[test]
    fn test_decode_page() {
        let raw = r#"{
            "messages": [
                {"id": 1, "date": "2024-01-01T00:00:00Z", "text": "a",
                 "video": {"size": 1, "download_url": "u1"}},
                {"id": 2, "date": "2024-01-02T00:00:00Z", "text": "b",
                 "video": {"size": 2, "download_url": "u2"}}
            ],
            "next": "cursor-2"
        }"#;
        let page: MessagePage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.next.as_deref(), Some("cursor-2"));
    }

    #[test]
    fn test_decode_last_page_has_no_cursor() {
        let page: MessagePage = serde_json::from_str(r#"{"messages": []}"#).unwrap();
        assert!(page.messages.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_channel_ref_display() {
        assert_eq!(ChannelRef::new("@clips").to_string(), "@clips");
        assert_eq!(ChannelRef::new("19083").as_str(), "19083");
    }
}

//! Canonical Message Shape and Normalization
//!
//! The gateway pushes heterogeneous payloads: enriched posts carry
//! `title`/`summary`/`body`/`tags`, raw items may only have `text`, and some
//! sources tag content with a single `topic` instead of a tag list.
//! [`normalize`] maps every decoded payload onto one canonical [`Message`]
//! so the rest of the client never branches on payload shape.
//!
//! Normalization is total: missing optional fields fall back through a
//! defined chain and never produce an error. Only a payload that fails to
//! decode as JSON at all is rejected, by [`decode_frame`], as a
//! [`FrameError::Malformed`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Sentinel title for payloads that carry neither `title` nor `text`.
pub const NO_TITLE: &str = "[no-title]";

/// Canonical unit of content delivered by a stream subscription.
///
/// Invariants upheld by [`normalize`]: `id` and `title` are never empty,
/// and `tags` is always present (empty at minimum).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique identifier; generated when the source omits one.
    pub id: String,
    /// Display title; falls back to `text`, then to [`NO_TITLE`].
    pub title: String,
    /// Short text; first of `summary`, `body`, `text` in the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Full text, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Topic labels; synthesized from `topic` when no list was provided.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Primary classification label, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Errors produced while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame payload was not valid structured data.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Generate a fresh opaque message id from 128 random bits.
fn generated_id() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::thread_rng().gen();
    format!("msg_{}", hex::encode(bytes))
}

/// Extract a non-empty string field from a raw payload.
fn str_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Map an arbitrary decoded payload onto the canonical [`Message`] shape.
///
/// Total and side-effect-free apart from id generation. Fallback chains:
///
/// - `id`: source `id` (string or number), else freshly generated
/// - `title`: `title`, else `text`, else [`NO_TITLE`]
/// - `summary`: first of `summary`, `body`, `text`
/// - `tags`: `tags` list, else a singleton list of `topic`, else empty
#[must_use]
pub fn normalize(raw: &Value) -> Message {
    let id = match raw.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => generated_id(),
    };

    let title = str_field(raw, "title")
        .or_else(|| str_field(raw, "text"))
        .unwrap_or_else(|| NO_TITLE.to_string());

    let summary = str_field(raw, "summary")
        .or_else(|| str_field(raw, "body"))
        .or_else(|| str_field(raw, "text"));

    let body = str_field(raw, "body");
    let topic = str_field(raw, "topic");

    let tags = match raw.get("tags").and_then(Value::as_array) {
        Some(list) => list
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        None => topic.clone().into_iter().collect(),
    };

    Message {
        id,
        title,
        summary,
        body,
        tags,
        topic,
    }
}

/// Decode one inbound frame payload into a normalized [`Message`].
///
/// A payload that is not valid JSON is a [`FrameError::Malformed`] failure;
/// the caller drops the frame and keeps the connection open.
pub fn decode_frame(payload: &str) -> Result<Message, FrameError> {
    let raw: Value =
        serde_json::from_str(payload).map_err(|e| FrameError::Malformed(e.to_string()))?;
    Ok(normalize(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_normalize_full_payload() {
        let msg = normalize(&json!({
            "id": "p1",
            "title": "Launch",
            "summary": "short",
            "body": "long form",
            "tags": ["space", "tech"],
            "topic": "space",
        }));

        assert_eq!(msg.id, "p1");
        assert_eq!(msg.title, "Launch");
        assert_eq!(msg.summary.as_deref(), Some("short"));
        assert_eq!(msg.body.as_deref(), Some("long form"));
        assert_eq!(msg.tags, vec!["space", "tech"]);
        assert_eq!(msg.topic.as_deref(), Some("space"));
    }

    #[test]
    fn test_title_falls_back_to_text() {
        let msg = normalize(&json!({ "text": "hello" }));
        assert_eq!(msg.title, "hello");
    }

    #[test]
    fn test_title_sentinel_when_nothing_usable() {
        let msg = normalize(&json!({ "tags": ["x"] }));
        assert_eq!(msg.title, NO_TITLE);
    }

    #[test]
    fn test_empty_title_is_treated_as_absent() {
        let msg = normalize(&json!({ "title": "", "text": "fallback" }));
        assert_eq!(msg.title, "fallback");
    }

    #[test]
    fn test_summary_chain() {
        let from_body = normalize(&json!({ "title": "t", "body": "b" }));
        assert_eq!(from_body.summary.as_deref(), Some("b"));

        let from_text = normalize(&json!({ "text": "t" }));
        assert_eq!(from_text.summary.as_deref(), Some("t"));

        let explicit = normalize(&json!({ "title": "t", "summary": "s", "body": "b" }));
        assert_eq!(explicit.summary.as_deref(), Some("s"));
    }

    #[test]
    fn test_tags_synthesized_from_topic() {
        let msg = normalize(&json!({ "title": "t", "topic": "news" }));
        assert_eq!(msg.tags, vec!["news"]);
        assert_eq!(msg.topic.as_deref(), Some("news"));
    }

    #[test]
    fn test_tags_never_absent() {
        let msg = normalize(&json!({ "title": "t" }));
        assert!(msg.tags.is_empty());
    }

    #[test]
    fn test_explicit_tags_win_over_topic() {
        let msg = normalize(&json!({ "title": "t", "tags": ["a"], "topic": "b" }));
        assert_eq!(msg.tags, vec!["a"]);
    }

    #[test]
    fn test_numeric_id_is_preserved() {
        let msg = normalize(&json!({ "id": 42, "title": "t" }));
        assert_eq!(msg.id, "42");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = normalize(&json!({ "title": "t" }));
        let b = normalize(&json!({ "title": "t" }));
        assert!(a.id.starts_with("msg_"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_decode_frame_valid() {
        let msg = decode_frame(r#"{"title":"one"}"#).unwrap();
        assert_eq!(msg.title, "one");
    }

    #[test]
    fn test_decode_frame_malformed() {
        let err = decode_frame("not-json").unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn test_message_serde_roundtrip() {
        let msg = normalize(&json!({ "id": "p1", "title": "t", "topic": "news" }));
        let encoded = serde_json::to_string(&msg).unwrap();
        let decoded: Message = serde_json::from_str(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }
}

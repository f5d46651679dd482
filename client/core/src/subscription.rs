//! Subscription Keys and Endpoint Naming
//!
//! A subscription key selects which logical stream a consumer follows:
//! the per-user feed (`/ws/feed/{uid}`) or a topic stream
//! (`/ws/topic/{slug}`). Keys are validated at construction; a blank key is
//! a caller contract violation, not a transient failure, so it never reaches
//! the transport layer.

use std::fmt;

use thiserror::Error;

/// Errors produced when constructing a subscription key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The supplied key was empty or whitespace-only.
    #[error("subscription key is empty")]
    Empty,
}

/// Identifier selecting which logical stream a consumer follows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SubscriptionKey {
    /// The personalized feed for one user.
    Feed {
        /// User id the feed belongs to.
        uid: String,
    },
    /// The shared stream for one topic.
    Topic {
        /// Topic slug.
        slug: String,
    },
}

impl SubscriptionKey {
    /// Key for the feed of `uid`.
    pub fn feed(uid: impl Into<String>) -> Result<Self, KeyError> {
        let uid = uid.into();
        if uid.trim().is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Self::Feed { uid })
    }

    /// Key for the topic stream of `slug`.
    pub fn topic(slug: impl Into<String>) -> Result<Self, KeyError> {
        let slug = slug.into();
        if slug.trim().is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Self::Topic { slug })
    }

    /// Endpoint path for this key on the gateway.
    #[must_use]
    pub fn endpoint_path(&self) -> String {
        match self {
            Self::Feed { uid } => format!("/ws/feed/{uid}"),
            Self::Topic { slug } => format!("/ws/topic/{slug}"),
        }
    }

    /// Full endpoint URL, optionally requesting a server-side backlog replay
    /// of up to `backlog` prior items on connect.
    #[must_use]
    pub fn endpoint_url(&self, ws_base: &str, backlog: Option<u32>) -> String {
        let mut url = format!("{}{}", ws_base.trim_end_matches('/'), self.endpoint_path());
        if let Some(n) = backlog {
            url.push_str(&format!("?backlog={n}"));
        }
        url
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feed { uid } => write!(f, "feed/{uid}"),
            Self::Topic { slug } => write!(f, "topic/{slug}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_endpoint_path() {
        let key = SubscriptionKey::feed("0").unwrap();
        assert_eq!(key.endpoint_path(), "/ws/feed/0");
    }

    #[test]
    fn test_topic_endpoint_path() {
        let key = SubscriptionKey::topic("news").unwrap();
        assert_eq!(key.endpoint_path(), "/ws/topic/news");
    }

    #[test]
    fn test_endpoint_url_with_backlog() {
        let key = SubscriptionKey::topic("news").unwrap();
        assert_eq!(
            key.endpoint_url("ws://127.0.0.1:8000", Some(50)),
            "ws://127.0.0.1:8000/ws/topic/news?backlog=50"
        );
    }

    #[test]
    fn test_endpoint_url_trims_trailing_slash() {
        let key = SubscriptionKey::feed("7").unwrap();
        assert_eq!(
            key.endpoint_url("ws://host:8000/", None),
            "ws://host:8000/ws/feed/7"
        );
    }

    #[test]
    fn test_blank_keys_rejected() {
        assert_eq!(SubscriptionKey::feed("").unwrap_err(), KeyError::Empty);
        assert_eq!(SubscriptionKey::topic("  ").unwrap_err(), KeyError::Empty);
    }

    #[test]
    fn test_display() {
        assert_eq!(SubscriptionKey::feed("0").unwrap().to_string(), "feed/0");
        assert_eq!(
            SubscriptionKey::topic("news").unwrap().to_string(),
            "topic/news"
        );
    }
}

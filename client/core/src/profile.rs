//! Profile Collaborator
//!
//! Request/response lookup of a user's interests from the gateway
//! (`GET /user/{uid}`). A single call with no retry or ordering concerns;
//! the stream core consumes the result only as a static list of strings
//! supplied by the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ClientConfig;

/// A user's profile as returned by the gateway.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Topics the user has expressed interest in.
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Errors from a profile lookup.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Caller supplied a blank uid.
    #[error("profile uid is empty")]
    EmptyUid,
    /// The HTTP request failed or the body did not decode.
    #[error("profile request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The gateway answered with a non-success status.
    #[error("profile lookup for {uid} returned status {status}")]
    Status {
        /// The uid that was looked up.
        uid: String,
        /// The HTTP status code.
        status: u16,
    },
}

/// HTTP client for profile lookups.
pub struct ProfileClient {
    http: reqwest::Client,
    base: String,
}

impl ProfileClient {
    /// Create a client against the configured gateway.
    pub fn new(config: &ClientConfig) -> Result<Self, ProfileError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            base: config.http_base.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the profile for `uid`.
    pub async fn fetch(&self, uid: &str) -> Result<UserProfile, ProfileError> {
        if uid.trim().is_empty() {
            return Err(ProfileError::EmptyUid);
        }
        let url = format!("{}/user/{uid}", self.base);
        debug!(%url, "fetching profile");
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProfileError::Status {
                uid: uid.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

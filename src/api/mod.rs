//! HTTP clients for the Voiceflow APIs.
//!
//! Two endpoints are used: the dialog runtime, which drives the conversation,
//! and the transcripts API, which persists a finished or ongoing session.

pub mod runtime;
pub mod transcripts;

#[cfg(test)]
pub mod mock;

use crate::error::ApiError;
use reqwest::Client;
use std::time::Duration;

pub use runtime::DialogClient;
pub use transcripts::TranscriptClient;

/// Build the shared HTTP client used by both endpoints.
pub fn http_client(timeout_secs: u64) -> Result<Client, ApiError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("vfchat/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

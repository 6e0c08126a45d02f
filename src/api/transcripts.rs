//! Transcripts API client.

use crate::error::ApiError;
use crate::protocol::TranscriptRequest;
use reqwest::Client;
use tracing::{debug, warn};

const ENDPOINT: &str = "transcripts";

/// Client for `PUT /v2/transcripts`.
#[derive(Debug, Clone)]
pub struct TranscriptClient {
    client: Client,
    url: String,
    api_key: String,
    project_id: String,
    version_id: String,
}

impl TranscriptClient {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        project_id: impl Into<String>,
        version_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            project_id: project_id.into(),
            version_id: version_id.into(),
        }
    }

    /// Save the transcript for `session_id`. Returns the (200 or 201) status.
    pub async fn save(&self, session_id: &str) -> Result<u16, ApiError> {
        let body = TranscriptRequest {
            project_id: &self.project_id,
            version_id: &self.version_id,
            session_id,
        };
        debug!(url = %self.url, session_id, "saving transcript");

        let response = self
            .client
            .put(&self.url)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        match status {
            200 | 201 => Ok(status),
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(status, "transcript save failed");
                Err(ApiError::Status {
                    endpoint: ENDPOINT,
                    status,
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{http_client, mock::MockVoiceflow};
    use serde_json::json;

    fn client_for(mock: &MockVoiceflow) -> TranscriptClient {
        TranscriptClient::new(
            http_client(5).unwrap(),
            mock.transcripts_url(),
            "VF.DM.test.key",
            "proj-1",
            "ver-1",
        )
    }

    #[tokio::test]
    async fn test_save_sends_ids() {
        let mock = MockVoiceflow::start().await;
        mock.set_transcript_status(201);

        let status = client_for(&mock).save("alice").await.unwrap();
        assert_eq!(status, 201);

        let saved = mock.transcripts();
        assert_eq!(saved.len(), 1);
        assert_eq!(
            saved[0],
            json!({"projectID": "proj-1", "versionID": "ver-1", "sessionID": "alice"})
        );
    }

    #[tokio::test]
    async fn test_save_failure_status() {
        let mock = MockVoiceflow::start().await;
        mock.set_transcript_status(400);

        let err = client_for(&mock).save("alice").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.hint(), Some("Check your project ID and version ID"));
    }
}

//! Dialog Manager runtime client.
//!
//! Sends a request for a user session and returns the classified traces.

use crate::error::ApiError;
use crate::protocol::{InteractBody, Trace};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

const ENDPOINT: &str = "runtime";

/// Client for `POST /state/user/{user_id}/interact`.
#[derive(Debug, Clone)]
pub struct DialogClient {
    client: Client,
    base_url: String,
    api_key: String,
    version_alias: String,
}

impl DialogClient {
    /// Create a new runtime client.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        version_alias: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            version_alias: version_alias.into(),
        }
    }

    /// Build the interact URL, escaping the user id as a single path segment.
    pub fn interact_url(&self, user_id: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ApiError::Url {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Url {
                url: self.base_url.clone(),
                reason: "cannot be used as a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(["state", "user", user_id, "interact"]);
        Ok(url)
    }

    /// Send `request` on behalf of `user_id` and return the response traces.
    pub async fn interact(&self, user_id: &str, request: &Value) -> Result<Vec<Trace>, ApiError> {
        let url = self.interact_url(user_id)?;
        debug!(%url, request = %request, "sending interact request");

        let response = self
            .client
            .post(url)
            .header("Authorization", &self.api_key)
            .header("versionID", &self.version_alias)
            .json(&InteractBody { request })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "interact request failed");
            return Err(ApiError::Status {
                endpoint: ENDPOINT,
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|e| ApiError::Decode {
            endpoint: ENDPOINT,
            message: e.to_string(),
        })?;

        let traces = Trace::parse_all(body).ok_or_else(|| ApiError::Decode {
            endpoint: ENDPOINT,
            message: "expected an array of traces".to_string(),
        })?;
        debug!(count = traces.len(), "received traces");
        Ok(traces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{http_client, mock::MockVoiceflow};
    use serde_json::json;

    fn client_for(base_url: &str) -> DialogClient {
        DialogClient::new(http_client(5).unwrap(), base_url, "VF.DM.test.key", "production")
    }

    #[test]
    fn test_interact_url_escapes_user() {
        let client = client_for("https://general-runtime.voiceflow.com/");
        let url = client.interact_url("jane doe/1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://general-runtime.voiceflow.com/state/user/jane%20doe%2F1/interact"
        );
    }

    #[test]
    fn test_interact_url_rejects_garbage() {
        let client = client_for("not a url");
        assert!(matches!(client.interact_url("u"), Err(ApiError::Url { .. })));
    }

    #[tokio::test]
    async fn test_interact_sends_headers_and_body() {
        let mock = MockVoiceflow::start().await;
        mock.reply(200, json!([{"type": "text", "payload": {"message": "Hello!"}}]));

        let client = client_for(&mock.base_url);
        let traces = client
            .interact("alice", &json!({"type": "launch"}))
            .await
            .unwrap();

        assert_eq!(traces, vec![Trace::Text { message: "Hello!".to_string() }]);

        let calls = mock.interactions();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user_id, "alice");
        assert_eq!(calls[0].authorization.as_deref(), Some("VF.DM.test.key"));
        assert_eq!(calls[0].version_id.as_deref(), Some("production"));
        assert_eq!(calls[0].body, json!({"request": {"type": "launch"}}));
    }

    #[tokio::test]
    async fn test_interact_non_success_status() {
        let mock = MockVoiceflow::start().await;
        mock.reply(401, json!({"message": "Unauthorized"}));

        let err = client_for(&mock.base_url)
            .interact("alice", &json!({"type": "launch"}))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_interact_non_array_body() {
        let mock = MockVoiceflow::start().await;
        mock.reply(200, json!({"traces": []}));

        let err = client_for(&mock.base_url)
            .interact("alice", &json!({"type": "launch"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Decode { .. }));
    }
}

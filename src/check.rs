//! Setup verification for `vfchat check`.
//!
//! Exercises both endpoints once with throwaway session ids so problems with
//! the API key, publishing or project/version IDs show up before chatting.

use crate::api::{http_client, DialogClient, TranscriptClient};
use crate::chat::Renderer;
use crate::config::{Config, ConfigStatus};
use crate::error::ApiError;
use crate::protocol::Request;
use anyhow::Result;
use std::fmt;
use std::io::Write;
use tracing::debug;

const CHECK_TIMEOUT_SECS: u64 = 10;
const CHECK_USER: &str = "test_user";
const CHECK_SESSION: &str = "test_session";

/// Outcome of a single check step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Pass => "Pass",
            Outcome::Fail => "Fail",
            Outcome::Skipped => "Skipped",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub api_key: Outcome,
    pub dialog: Outcome,
    pub transcripts: Outcome,
}

impl CheckReport {
    /// Chat is usable when the dialog check passed.
    pub fn ready(&self) -> bool {
        self.dialog == Outcome::Pass
    }
}

/// Run every check and print results as they complete.
pub async fn run_check<W: Write>(config: &Config, out: &mut Renderer<W>) -> Result<CheckReport> {
    out.line("Testing Configuration:")?;
    out.hint(&format!("API Key: {}", config.masked_api_key()))?;
    out.hint(&format!("Project ID: {}", config.project_id().unwrap_or("Not provided")))?;
    out.hint(&format!("Version ID: {}", config.version_id().unwrap_or("Not provided")))?;

    let mut report = CheckReport {
        api_key: Outcome::Fail,
        dialog: Outcome::Skipped,
        transcripts: Outcome::Skipped,
    };

    out.line("\n1. Testing API Key format...")?;
    let status = match config.validate() {
        Ok(status) => status,
        Err(e) => {
            out.error(&e.to_string())?;
            print_summary(out, &report)?;
            return Ok(report);
        }
    };
    report.api_key = Outcome::Pass;
    out.line("API Key format is correct")?;

    // validate() guarantees a key is present.
    let api_key = config.api_key().unwrap_or_default();
    let http = http_client(CHECK_TIMEOUT_SECS)?;

    out.line("\n2. Testing Dialog Manager API...")?;
    let dialog = DialogClient::new(
        http.clone(),
        &config.runtime_url,
        api_key,
        &config.version_alias,
    );
    report.dialog = check_dialog(&dialog, out).await?;

    match (status, config.project_id(), config.version_id()) {
        (ConfigStatus::Valid, Some(project_id), Some(version_id)) => {
            out.line("\n3. Testing Transcripts API...")?;
            let transcripts = TranscriptClient::new(
                http,
                &config.transcripts_url,
                api_key,
                project_id,
                version_id,
            );
            report.transcripts = check_transcripts(&transcripts, out).await?;
        }
        _ => {
            out.line("\n3. Skipping Transcripts API test (Project ID or Version ID not configured)")?;
        }
    }

    print_summary(out, &report)?;
    Ok(report)
}

async fn check_dialog<W: Write>(client: &DialogClient, out: &mut Renderer<W>) -> Result<Outcome> {
    let result = client.interact(CHECK_USER, &Request::launch().to_value()).await;
    debug!(ok = result.is_ok(), "dialog check finished");

    let outcome = match result {
        Ok(traces) if !traces.is_empty() => {
            out.line("API Key is valid and project is accessible")?;
            out.hint(&format!("Response contains {} trace(s)", traces.len()))?;
            Outcome::Pass
        }
        Ok(_) => {
            out.warning("API Key works but returned empty response")?;
            out.hint("Make sure your Voiceflow project is published")?;
            Outcome::Fail
        }
        Err(e) => {
            match &e {
                ApiError::Status { status: 401, .. } => {
                    out.error("API Key is invalid or unauthorized")?
                }
                ApiError::Status { status: 404, .. } => {
                    out.error("Project not found - check your API key")?
                }
                ApiError::Status { status, body, .. } => {
                    out.error(&format!("API request failed with status code: {}", status))?;
                    out.hint(&format!("Response: {}", body))?;
                }
                other => match other.hint() {
                    Some(hint) => out.error(hint)?,
                    None => out.error(&format!("Unexpected error: {}", other))?,
                },
            }
            Outcome::Fail
        }
    };
    Ok(outcome)
}

async fn check_transcripts<W: Write>(
    client: &TranscriptClient,
    out: &mut Renderer<W>,
) -> Result<Outcome> {
    let outcome = match client.save(CHECK_SESSION).await {
        Ok(_) => {
            out.line("Transcripts API is working correctly")?;
            Outcome::Pass
        }
        Err(e) => {
            match e.status() {
                Some(401) => out.error("Transcripts API: Unauthorized - check your API key")?,
                Some(400) => {
                    out.error("Transcripts API: Bad request - check Project ID and Version ID")?
                }
                Some(status) => {
                    out.error(&format!("Transcripts API failed with status code: {}", status))?
                }
                None => out.error(&format!("Transcripts API test error: {}", e))?,
            }
            Outcome::Fail
        }
    };
    Ok(outcome)
}

fn print_summary<W: Write>(out: &mut Renderer<W>, report: &CheckReport) -> Result<()> {
    out.line(&format!("\n{}", "=".repeat(50)))?;
    out.line("Test Summary:")?;
    out.hint(&format!("API Key format: {}", report.api_key))?;
    out.hint(&format!("Dialog Manager API: {}", report.dialog))?;
    out.hint(&format!("Transcripts API: {}", report.transcripts))?;

    if report.ready() {
        out.line("\nYour setup is ready! You can now run: vfchat")?;
        if report.transcripts == Outcome::Fail {
            out.hint("Note: Chat will work, but transcripts won't be saved")?;
        }
    } else {
        out.line("\nSetup issues found. Please fix the above errors before continuing.")?;
        out.hint("Common fixes:")?;
        out.hint("- Make sure your Voiceflow project is published")?;
        out.hint("- Verify your API key is correct and complete")?;
        out.hint("- Check your internet connection")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockVoiceflow;
    use serde_json::json;

    async fn check(config: &Config) -> (CheckReport, String) {
        let mut out = Renderer::new(Vec::new(), false);
        let report = run_check(config, &mut out).await.unwrap();
        (report, String::from_utf8_lossy(out.get_ref()).into_owned())
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let mock = MockVoiceflow::start().await;
        mock.reply(200, json!([{"type": "text", "payload": {"message": "hi"}}]));

        let (report, out) = check(&mock.config()).await;

        assert_eq!(
            report,
            CheckReport {
                api_key: Outcome::Pass,
                dialog: Outcome::Pass,
                transcripts: Outcome::Pass,
            }
        );
        assert!(out.contains("Response contains 1 trace(s)"));
        assert!(out.contains("Your setup is ready!"));

        let calls = mock.interactions();
        assert_eq!(calls[0].user_id, "test_user");
        assert_eq!(mock.transcripts()[0]["sessionID"], json!("test_session"));
    }

    #[tokio::test]
    async fn test_malformed_key_makes_no_requests() {
        let mock = MockVoiceflow::start().await;
        let config = Config {
            api_key: Some("not-a-voiceflow-key".to_string()),
            ..mock.config()
        };

        let (report, out) = check(&config).await;

        assert_eq!(report.api_key, Outcome::Fail);
        assert_eq!(report.dialog, Outcome::Skipped);
        assert!(!report.ready());
        assert!(out.contains("should start with 'VF.DM.'"));
        assert!(mock.interactions().is_empty());
        assert!(mock.transcripts().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_and_empty_responses() {
        let mock = MockVoiceflow::start().await;
        mock.reply(401, json!({"message": "nope"}));
        let (report, out) = check(&mock.config()).await;
        assert_eq!(report.dialog, Outcome::Fail);
        assert!(out.contains("API Key is invalid or unauthorized"));
        assert!(out.contains("Setup issues found"));

        mock.reply(200, json!([]));
        let (report, out) = check(&mock.config()).await;
        assert_eq!(report.dialog, Outcome::Fail);
        assert!(out.contains("API Key works but returned empty response"));
    }

    #[tokio::test]
    async fn test_transcripts_skipped_without_ids() {
        let mock = MockVoiceflow::start().await;
        mock.reply(200, json!([{"type": "end"}]));
        let config = Config {
            project_id: None,
            ..mock.config()
        };

        let (report, out) = check(&config).await;

        assert!(report.ready());
        assert_eq!(report.transcripts, Outcome::Skipped);
        assert!(out.contains("Skipping Transcripts API test"));
        assert!(mock.transcripts().is_empty());
    }

    #[tokio::test]
    async fn test_transcripts_bad_request() {
        let mock = MockVoiceflow::start().await;
        mock.reply(200, json!([{"type": "end"}]));
        mock.set_transcript_status(400);

        let (report, out) = check(&mock.config()).await;

        assert!(report.ready());
        assert_eq!(report.transcripts, Outcome::Fail);
        assert!(out.contains("Bad request - check Project ID and Version ID"));
        assert!(out.contains("transcripts won't be saved"));
    }
}

//! Wire types for the Voiceflow Dialog Manager and Transcripts APIs.
//!
//! Requests are plain `{type, payload?}` objects. Responses are arrays of
//! traces, which are classified by their `type` tag. Unknown or malformed
//! traces are kept as raw JSON so they can still be shown to the user.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request sent to the dialog runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Request {
    /// Start (or restart) the conversation.
    pub fn launch() -> Self {
        Self {
            kind: "launch".to_string(),
            payload: None,
        }
    }

    /// A free-text user reply.
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            payload: Some(Value::String(message.into())),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("type".to_string(), Value::String(self.kind.clone()));
        if let Some(payload) = &self.payload {
            obj.insert("payload".to_string(), payload.clone());
        }
        Value::Object(obj)
    }
}

/// Body of a `POST /state/user/{id}/interact` call.
///
/// Button requests are forwarded verbatim, so the inner request is raw JSON.
#[derive(Debug, Clone, Serialize)]
pub struct InteractBody<'a> {
    pub request: &'a Value,
}

/// A button offered by a `choice` trace.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Button {
    pub name: String,
    /// The request to send back when this button is picked.
    pub request: Value,
}

/// A single response trace.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    Text { message: String },
    Choice { buttons: Vec<Button> },
    Visual { visual_type: String, image: Option<String> },
    End,
    Path,
    Unknown { kind: String, raw: Value },
}

#[derive(Deserialize)]
struct TextPayload {
    message: String,
}

#[derive(Deserialize)]
struct ChoicePayload {
    buttons: Vec<Button>,
}

#[derive(Deserialize)]
struct VisualPayload {
    #[serde(rename = "visualType", default = "unknown_visual")]
    visual_type: String,
    #[serde(default)]
    image: Option<String>,
}

fn unknown_visual() -> String {
    "unknown".to_string()
}

impl Trace {
    /// Classify a raw trace object by its `type` field.
    pub fn from_value(raw: Value) -> Self {
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let payload = raw.get("payload").cloned().unwrap_or(Value::Null);

        let parsed = match kind.as_str() {
            "text" => serde_json::from_value::<TextPayload>(payload)
                .ok()
                .map(|p| Trace::Text { message: p.message }),
            "choice" => serde_json::from_value::<ChoicePayload>(payload)
                .ok()
                .map(|p| Trace::Choice { buttons: p.buttons }),
            "visual" => serde_json::from_value::<VisualPayload>(payload)
                .ok()
                .map(|p| Trace::Visual {
                    visual_type: p.visual_type,
                    image: p.image,
                }),
            "end" => Some(Trace::End),
            "path" => Some(Trace::Path),
            _ => None,
        };

        parsed.unwrap_or(Trace::Unknown { kind, raw })
    }

    /// Parse a full interact response body.
    pub fn parse_all(body: Value) -> Option<Vec<Trace>> {
        match body {
            Value::Array(items) => Some(items.into_iter().map(Trace::from_value).collect()),
            _ => None,
        }
    }
}

/// Body of a `PUT /v2/transcripts` call.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptRequest<'a> {
    #[serde(rename = "projectID")]
    pub project_id: &'a str,
    #[serde(rename = "versionID")]
    pub version_id: &'a str,
    #[serde(rename = "sessionID")]
    pub session_id: &'a str,
}

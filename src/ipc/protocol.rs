//! Wire types for the skill's request and response envelopes
//!
//! One JSON envelope in, one out, per turn. The local harness frames these
//! with a 4-byte little-endian length prefix; the real platform delivers
//! the same records through its own channel.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::SessionAttributes;

/// Incoming request record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub session: Session,
    pub request: RequestBody,
}

/// The conversation this request belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// True on the first request of a conversation
    pub new: bool,
    pub session_id: String,
    pub application: Application,
    /// Attributes persisted by the caller from the previous turn's response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<SessionAttributes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

/// The request payload, tagged by the platform's request type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RequestBody {
    /// Skill opened without a specific intent
    #[serde(rename_all = "camelCase")]
    LaunchRequest { request_id: String },

    /// A recognized user intent with its slots
    #[serde(rename_all = "camelCase")]
    IntentRequest { request_id: String, intent: Intent },

    /// The platform ended the conversation; no response is expected
    #[serde(rename_all = "camelCase")]
    SessionEndedRequest { request_id: String },
}

impl RequestBody {
    pub fn request_id(&self) -> &str {
        match self {
            RequestBody::LaunchRequest { request_id }
            | RequestBody::IntentRequest { request_id, .. }
            | RequestBody::SessionEndedRequest { request_id } => request_id,
        }
    }
}

/// A named intent and its slot values, as delivered on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

impl Intent {
    /// Slot value by name, if the slot arrived carrying a value
    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(|slot| slot.value.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub value: Option<String>,
}

/// Outgoing response record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    /// Attributes the caller persists and replays on the next turn
    pub session_attributes: SessionAttributes,
    pub response: SkillResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponse {
    pub output_speech: OutputSpeech,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    pub should_end_session: bool,
}

/// Speech payload: plain text, or markup with an embedded audio reference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}

/// A simple companion-app card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
}

impl Card {
    /// The skill's card shape: "Simple" type with the speechlet prefix
    pub fn simple(title: &str, content: &str) -> Self {
        Self {
            kind: "Simple".to_string(),
            title: format!("SessionSpeechlet - {title}"),
            content: format!("SessionSpeechlet - {content}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

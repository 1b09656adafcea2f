//! Structured intents produced by the classifier
//!
//! An [`Intent`] is the classifier's interpretation of one utterance. It is
//! created fresh per utterance, never mutated by handlers, and dropped after
//! dispatch.

mod classifier;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use classifier::{GeminiClassifier, IntentClassifier, NLU_INSTRUCTIONS, parse_model_reply};

/// The fixed action vocabulary the classifier may emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionKind {
    /// Speak a short answer from the model's own knowledge
    KnowledgeReply,
    /// Open a URL in the default browser
    OpenWebsite,
    /// Launch a desktop application
    OpenApplication,
    /// Terminate a running application
    CloseApplication,
    /// Search YouTube
    YoutubeSearch,
    /// Play a song or video on YouTube
    YoutubePlay,
    /// Search the web with a named engine
    WebSearch,
    /// Shutdown, restart, sleep or lock
    SystemControl,
    /// Adjust output volume
    VolumeControl,
    /// Minimize or maximize the active window
    WindowControl,
    /// Notes and file operations
    FileIo,
    /// Anything not understood
    #[default]
    Unknown,
}

impl ActionKind {
    /// Every kind, in vocabulary order
    pub const ALL: [Self; 12] = [
        Self::KnowledgeReply,
        Self::OpenWebsite,
        Self::OpenApplication,
        Self::CloseApplication,
        Self::YoutubeSearch,
        Self::YoutubePlay,
        Self::WebSearch,
        Self::SystemControl,
        Self::VolumeControl,
        Self::WindowControl,
        Self::FileIo,
        Self::Unknown,
    ];

    /// Wire name of this kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KnowledgeReply => "knowledge_reply",
            Self::OpenWebsite => "open_website",
            Self::OpenApplication => "open_application",
            Self::CloseApplication => "close_application",
            Self::YoutubeSearch => "youtube_search",
            Self::YoutubePlay => "youtube_play",
            Self::WebSearch => "web_search",
            Self::SystemControl => "system_control",
            Self::VolumeControl => "volume_control",
            Self::WindowControl => "window_control",
            Self::FileIo => "file_io",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire name; anything outside the vocabulary is `Unknown`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        if name == "gemini_reply" {
            return Self::KnowledgeReply;
        }
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.as_deref().map_or(Self::Unknown, Self::from_name))
    }
}

/// Structured interpretation of one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Which handler should run
    #[serde(rename = "action", default)]
    pub kind: ActionKind,

    /// Handler parameters; shape depends on `kind`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parameters: Map<String, Value>,

    /// Classifier confidence in [0.0, 1.0], when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Intent {
    /// Create an intent with the given kind and parameters
    #[must_use]
    pub const fn new(kind: ActionKind, parameters: Map<String, Value>) -> Self {
        Self {
            kind,
            parameters,
            confidence: None,
        }
    }

    /// The normalized failure intent every classifier falls back to
    #[must_use]
    pub fn unknown(reason: impl Into<String>, original_command: &str) -> Self {
        let mut parameters = Map::new();
        parameters.insert("reason".to_string(), Value::String(reason.into()));
        parameters.insert(
            "original_command".to_string(),
            Value::String(original_command.to_string()),
        );
        Self::new(ActionKind::Unknown, parameters)
    }

    /// Attach a confidence score
    #[must_use]
    pub const fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Builder-style parameter insertion
    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// A text parameter, trimmed; empty strings and nulls count as missing
    ///
    /// Numbers and booleans are rendered as text so handlers can accept
    /// `"value": 50` and `"value": "50"` alike.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        match self.parameters.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// A numeric parameter; accepts numbers and numeric strings like "60%"
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.parameters.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
            _ => None,
        }
    }

    /// Rewrite low-confidence intents to `unknown`
    ///
    /// Only applies when the classifier reported a confidence; a threshold of
    /// zero disables gating entirely.
    #[must_use]
    pub fn gated(self, min_confidence: f32, original_command: &str) -> Self {
        match self.confidence {
            Some(c) if min_confidence > 0.0 && c < min_confidence && self.kind != ActionKind::Unknown => {
                tracing::info!(
                    kind = %self.kind,
                    confidence = c,
                    min_confidence,
                    "intent below confidence threshold"
                );
                Self::unknown("low confidence", original_command).with_confidence(c)
            }
            _ => self,
        }
    }
}

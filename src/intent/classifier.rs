//! Intent classification via the Gemini API

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ActionKind, Intent};
use crate::{Error, Result};

/// Turns free text into a structured [`Intent`]
///
/// Implementations must not fail: any internal error is reported as an
/// `unknown` intent carrying a human-readable `reason`.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify one utterance
    async fn classify(&self, text: &str) -> Intent;
}

/// Instruction prompt sent with every classification request
pub const NLU_INSTRUCTIONS: &str = r#"You are the language understanding engine of a desktop voice assistant named Alpha.
Read the user's spoken command and answer with exactly one JSON object and nothing else:
no Markdown, no code fences, no commentary.

{"action": "<action>", "parameters": {...}, "confidence": <0.0-1.0>}

Actions and their parameters:
- knowledge_reply: general questions ("what is a computer", "tell me about the sky").
  {"answer": "<short spoken answer from your own knowledge>"}
- open_website: "open youtube", "go to facebook". {"url": "https://www.youtube.com"}
- open_application: "launch calculator", "start VS Code". {"app_name": "vscode"}
  Normalize well-known names ("Visual Studio Code" -> "vscode").
- close_application: "close chrome", "quit spotify". {"app_name": "chrome"}
- youtube_search: "search for coding tips on youtube". {"query": "coding tips"}
- youtube_play: "play bohemian rhapsody by queen". {"song_name": "Bohemian Rhapsody", "artist": "Queen"}
- web_search: "search for best pizza near me", "bing the weather".
  {"query": "best pizza near me", "engine": "google|bing|duckduckgo"}
- system_control: "shutdown the computer", "lock the screen". {"command": "shutdown|restart|sleep|lock"}
- volume_control: "turn it up", "set volume to 60", "mute".
  {"operation": "increase|decrease|mute|unmute|set", "value": 60 or null}  (value only for set)
- window_control: "minimize this window". {"command": "minimize|maximize"}
- file_io: notes, lists and files.
  {"operation": "create|append|read|delete|list", "file_name": "shopping list.txt", "content": "milk" or null}
  Use append when adding to an existing list or note, create for a new one,
  list with a directory name to show its contents.
- unknown: anything unclear or unsupported.
  {"reason": "<why>", "original_command": "<the exact user text>"}

Confidence: 0.9-1.0 clear; 0.7-0.89 best guess; 0.5-0.69 highly ambiguous;
below 0.5 answer with the unknown action instead.

Examples:
"add milk and eggs to my shopping list" ->
{"action": "file_io", "parameters": {"operation": "append", "file_name": "shopping list.txt", "content": "milk and eggs"}, "confidence": 0.98}
"list the files in the documents folder" ->
{"action": "file_io", "parameters": {"operation": "list", "file_name": "documents"}, "confidence": 0.95}
"#;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Classifies utterances with Google Gemini
pub struct GeminiClassifier {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Why a classification attempt failed
enum Failure {
    /// Transport or API-level failure
    Api(String),
    /// The model answered with something that isn't an intent
    Malformed,
}

impl GeminiClassifier {
    /// Create a classifier; a missing key is reported per request, not here
    #[must_use]
    pub fn new(api_key: Option<String>, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Point the classifier at a different endpoint (proxies, tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request(&self, api_key: &str, text: &str) -> std::result::Result<String, Failure> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: NLU_INSTRUCTIONS,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.1,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Failure::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Failure::Api(format!("status {status}")));
        }

        let reply: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to decode Gemini envelope");
            Failure::Malformed
        })?;

        let text = reply
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<String>();

        tracing::debug!(raw = %text, "Gemini raw response");
        Ok(text)
    }
}

#[async_trait]
impl IntentClassifier for GeminiClassifier {
    async fn classify(&self, text: &str) -> Intent {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("Gemini API key is missing, cannot classify");
            return Intent::unknown("API Key Missing", text);
        };

        let raw = match self.request(api_key, text).await {
            Ok(raw) => raw,
            Err(Failure::Api(e)) => {
                tracing::error!(error = %e, "Gemini request failed");
                return Intent::unknown(format!("Gemini API Error: {e}"), text);
            }
            Err(Failure::Malformed) => {
                return Intent::unknown("JSON Parsing Failed from NLU Engine", text);
            }
        };

        match parse_model_reply(&raw, text) {
            Ok(intent) => {
                tracing::info!(
                    kind = %intent.kind,
                    confidence = ?intent.confidence,
                    "classified"
                );
                intent
            }
            Err(e) => {
                tracing::error!(error = %e, raw = %raw, "failed to parse intent");
                Intent::unknown("JSON Parsing Failed from NLU Engine", text)
            }
        }
    }
}

/// Parse the model's text reply into an intent
///
/// Tolerates Markdown code fences and prose around the JSON object. An
/// `unknown` intent always ends up carrying the original command.
///
/// # Errors
///
/// Returns error if no JSON object can be parsed from the reply
pub fn parse_model_reply(raw: &str, original_command: &str) -> Result<Intent> {
    let json = extract_json_object(raw)
        .ok_or_else(|| Error::Classifier("no JSON object in model reply".to_string()))?;

    let mut intent: Intent = serde_json::from_str(json)?;

    if intent.kind == ActionKind::Unknown && intent.text("original_command").is_none() {
        intent.parameters.insert(
            "original_command".to_string(),
            serde_json::Value::String(original_command.to_string()),
        );
    }

    Ok(intent)
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

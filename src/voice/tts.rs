//! Text-to-speech via `OpenAI` or `ElevenLabs`

use std::time::Duration;

use crate::config::{ApiKeys, VoiceConfig};
use crate::{Error, Result};

const ELEVENLABS_MODEL: &str = "eleven_monolingual_v1";

/// Upper bound on one synthesis request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    OpenAI,
    ElevenLabs,
}

impl TtsProvider {
    /// Parse a provider name from configuration
    ///
    /// # Errors
    ///
    /// Returns error for unknown provider names
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "elevenlabs" | "eleven_labs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

#[derive(serde::Serialize)]
struct OpenAiSpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

#[derive(serde::Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Synthesizes speech as MP3
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Build from voice configuration, picking the provider's API key
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unknown or its key is missing
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let provider = TtsProvider::parse(&voice.tts_provider)?;
        let (key, model, speed) = match provider {
            TtsProvider::OpenAI => (keys.openai.clone(), voice.tts_model.clone(), voice.tts_speed),
            TtsProvider::ElevenLabs => {
                let model = if voice.tts_model.starts_with("tts-") {
                    ELEVENLABS_MODEL.to_string()
                } else {
                    voice.tts_model.clone()
                };
                (keys.elevenlabs.clone(), model, 1.0)
            }
        };

        let api_key = key.unwrap_or_default();
        if api_key.is_empty() {
            return Err(Error::Config(format!("{provider:?} API key required for TTS")));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key,
            voice: voice.tts_voice.clone(),
            speed: speed.clamp(0.25, 4.0),
            model,
            provider,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = match self.provider {
            TtsProvider::OpenAI => self
                .client
                .post("https://api.openai.com/v1/audio/speech")
                .bearer_auth(&self.api_key)
                .json(&OpenAiSpeechRequest {
                    model: &self.model,
                    input: text,
                    voice: &self.voice,
                    speed: self.speed,
                    response_format: "mp3",
                }),
            TtsProvider::ElevenLabs => self
                .client
                .post(format!(
                    "https://api.elevenlabs.io/v1/text-to-speech/{}",
                    self.voice
                ))
                .header("xi-api-key", &self.api_key)
                .json(&ElevenLabsRequest {
                    text,
                    model_id: &self.model,
                }),
        };

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, provider = ?self.provider, "TTS API error");
            return Err(Error::Tts(format!("{:?} TTS error {status}", self.provider)));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "synthesized speech");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names() {
        assert_eq!(TtsProvider::parse("OpenAI").unwrap(), TtsProvider::OpenAI);
        assert_eq!(TtsProvider::parse("elevenlabs").unwrap(), TtsProvider::ElevenLabs);
        assert!(TtsProvider::parse("sapi").is_err());
    }

    #[test]
    fn elevenlabs_uses_its_own_model_and_key() {
        let voice = VoiceConfig {
            tts_provider: "elevenlabs".to_string(),
            tts_voice: "voice-id".to_string(),
            ..VoiceConfig::default()
        };
        let keys = ApiKeys {
            elevenlabs: Some("el".to_string()),
            ..ApiKeys::default()
        };
        let tts = TextToSpeech::from_config(&voice, &keys).unwrap();
        assert_eq!(tts.provider(), TtsProvider::ElevenLabs);
        assert_eq!(tts.model, ELEVENLABS_MODEL);
    }

    #[test]
    fn missing_key_is_config_error() {
        assert!(TextToSpeech::from_config(&VoiceConfig::default(), &ApiKeys::default()).is_err());
    }
}

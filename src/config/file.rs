//! TOML configuration file loading
//!
//! Supports `~/.config/alpha/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AlphaConfigFile {
    /// Wake phrases (e.g. `["assistant", "hey alpha"]`)
    #[serde(default)]
    pub wake_words: Option<Vec<String>>,

    /// Prompt spoken after the wake word is heard
    #[serde(default)]
    pub listening_prompt: Option<String>,

    /// Conversation loop timing
    #[serde(default)]
    pub conversation: ConversationFileConfig,

    /// Action handler defaults
    #[serde(default)]
    pub actions: ActionsFileConfig,

    /// Intent classifier configuration
    #[serde(default)]
    pub nlu: NluFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Conversation loop configuration
#[derive(Debug, Default, Deserialize)]
pub struct ConversationFileConfig {
    /// Maximum consecutive follow-up captures per turn
    pub followup_cap: Option<u32>,

    /// Seconds to wait for a command to start
    pub command_timeout_secs: Option<u64>,

    /// Maximum length of a spoken command in seconds
    pub command_phrase_limit_secs: Option<u64>,

    /// Seconds to wait for a follow-up answer to start; defaults to the command window
    pub followup_timeout_secs: Option<u64>,

    /// Maximum length of a follow-up answer in seconds
    pub followup_phrase_limit_secs: Option<u64>,

    /// Seconds to wait for a yes/no reply to start
    pub short_timeout_secs: Option<u64>,

    /// Maximum length of a yes/no reply in seconds
    pub short_phrase_limit_secs: Option<u64>,
}

/// Action handler configuration
#[derive(Debug, Default, Deserialize)]
pub struct ActionsFileConfig {
    /// Search engine used when none is named ("google", "bing", "duckduckgo")
    pub default_web_engine: Option<String>,

    /// Percentage applied by volume increase/decrease
    pub volume_step: Option<u8>,

    /// Base directory for relative file names
    pub files_dir: Option<String>,

    /// Extension appended to bare file names
    pub default_extension: Option<String>,

    /// Characters of a file read aloud before truncating
    pub read_budget: Option<usize>,

    /// Where saved knowledge replies are appended
    pub responses_path: Option<String>,

    /// Intents reporting a lower confidence are treated as unknown
    pub min_confidence: Option<f32>,
}

/// Intent classifier configuration
#[derive(Debug, Default, Deserialize)]
pub struct NluFileConfig {
    /// Gemini model identifier (e.g. "gemini-2.5-flash")
    pub model: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable microphone and speaker
    pub enabled: Option<bool>,

    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS provider ("openai" or "elevenlabs")
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub gemini: Option<String>,
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub deepgram: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AlphaConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> AlphaConfigFile {
    let Some(path) = config_file_path() else {
        return AlphaConfigFile::default();
    };

    if !path.exists() {
        return AlphaConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                AlphaConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AlphaConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the TOML is malformed
pub fn parse_config(content: &str) -> crate::Result<AlphaConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Return the config file path: `~/.config/alpha/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("alpha").join("config.toml"))
}

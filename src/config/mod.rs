//! Configuration management for the Alpha assistant
//!
//! Values are layered env > TOML file > defaults.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use file::AlphaConfigFile;

/// Default wake phrase
pub const DEFAULT_WAKE_WORD: &str = "assistant";

/// Prompt spoken once the wake word is heard
pub const DEFAULT_LISTENING_PROMPT: &str = "How can I help you?";

/// Alpha assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Wake phrases, lowercase
    pub wake_words: Vec<String>,

    /// Prompt spoken after the wake word
    pub listening_prompt: String,

    /// Conversation loop settings
    pub conversation: ConversationConfig,

    /// Action handler settings
    pub actions: ActionConfig,

    /// Intent classifier settings
    pub nlu: NluConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Path to data directory (saved responses, etc)
    pub data_dir: PathBuf,
}

/// Bounded listen window for a single capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureWindow {
    /// How long to wait for speech to begin
    pub timeout: Duration,

    /// Maximum duration of the utterance once it began
    pub phrase_limit: Duration,
}

impl CaptureWindow {
    /// Window used for commands and follow-up answers
    pub const COMMAND: Self = Self {
        timeout: Duration::from_secs(8),
        phrase_limit: Duration::from_secs(30),
    };

    /// Window used for yes/no confirmations
    pub const SHORT: Self = Self {
        timeout: Duration::from_secs(4),
        phrase_limit: Duration::from_secs(3),
    };
}

/// Conversation loop configuration
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Maximum consecutive follow-up captures before forcing idle
    pub followup_cap: u32,

    /// Listen window for the command after the wake word
    pub command_window: CaptureWindow,

    /// Listen window for follow-up answers
    pub followup_window: CaptureWindow,

    /// Listen window for yes/no confirmations
    pub short_window: CaptureWindow,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            followup_cap: 1,
            command_window: CaptureWindow::COMMAND,
            followup_window: CaptureWindow::COMMAND,
            short_window: CaptureWindow::SHORT,
        }
    }
}

/// Action handler configuration
#[derive(Debug, Clone)]
pub struct ActionConfig {
    /// Search engine used when the intent names none
    pub default_web_engine: String,

    /// Percentage step for volume increase/decrease
    pub volume_step: u8,

    /// Base directory for relative file names
    pub files_dir: PathBuf,

    /// Extension (without dot) appended to bare file names
    pub default_extension: String,

    /// Characters read aloud before truncating with an ellipsis
    pub read_budget: usize,

    /// Append-only log of saved knowledge replies
    pub responses_path: PathBuf,

    /// Intents with a lower reported confidence become `unknown`
    pub min_confidence: f32,
}

impl ActionConfig {
    /// Defaults rooted at the given data directory
    #[must_use]
    pub fn with_data_dir(data_dir: &std::path::Path) -> Self {
        Self {
            default_web_engine: "google".to_string(),
            volume_step: 10,
            files_dir: PathBuf::from("."),
            default_extension: "txt".to_string(),
            read_budget: 200,
            responses_path: data_dir.join("responses.txt"),
            min_confidence: 0.0,
        }
    }
}

/// Intent classifier configuration
#[derive(Debug, Clone)]
pub struct NluConfig {
    /// Gemini model identifier
    pub model: String,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable microphone input and spoken output
    pub enabled: bool,

    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: String,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS provider ("openai" or "elevenlabs")
    pub tts_provider: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_provider: "whisper".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_provider: "openai".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// Google Gemini API key (intent classification)
    pub gemini: Option<String>,

    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "<set>");
        f.debug_struct("ApiKeys")
            .field("gemini", &mask(&self.gemini))
            .field("openai", &mask(&self.openai))
            .field("elevenlabs", &mask(&self.elevenlabs))
            .field("deepgram", &mask(&self.deepgram))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            wake_words: vec![DEFAULT_WAKE_WORD.to_string()],
            listening_prompt: DEFAULT_LISTENING_PROMPT.to_string(),
            conversation: ConversationConfig::default(),
            actions: ActionConfig::with_data_dir(&data_dir),
            nlu: NluConfig::default(),
            voice: VoiceConfig::default(),
            api_keys: ApiKeys::default(),
            data_dir,
        }
    }
}

/// Data directory: `~/.local/share/alpha` on Linux
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("alpha"))
}

/// Name of the persistent log inside the data directory
pub const LOG_FILE_NAME: &str = "alpha.log";

/// Data directory honoring `ALPHA_DATA_DIR`
///
/// Usable before the full config is loaded, e.g. to open the log file.
#[must_use]
pub fn data_dir_from(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    env("ALPHA_DATA_DIR").map_or_else(default_data_dir, PathBuf::from)
}

impl Config {
    /// Load configuration from the environment and config file
    #[must_use]
    pub fn load() -> Self {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    #[must_use]
    pub fn load_with_options(disable_voice: bool) -> Self {
        let fc = file::load_config_file();
        let mut config = Self::layered(fc, |key| std::env::var(key).ok());

        if disable_voice {
            tracing::info!("voice explicitly disabled");
            config.voice.enabled = false;
        }

        // Ensure data dir exists
        if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
            tracing::warn!(
                path = %config.data_dir.display(),
                error = %e,
                "failed to create data directory"
            );
        }

        config
    }

    /// Build a config from a parsed file and an environment lookup
    ///
    /// Precedence is env > file > default for every field.
    #[must_use]
    pub fn layered(fc: AlphaConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let data_dir = data_dir_from(&env);
        let default_actions = ActionConfig::with_data_dir(&data_dir);

        let wake_words = env("ALPHA_WAKE_WORD")
            .map(|s| s.split(',').map(ToString::to_string).collect())
            .or(fc.wake_words)
            .map(normalize_wake_words)
            .filter(|w: &Vec<String>| !w.is_empty())
            .unwrap_or(defaults.wake_words);

        let listening_prompt = fc.listening_prompt.unwrap_or(defaults.listening_prompt);

        let conv = fc.conversation;
        let secs = |v: Option<u64>, d: std::time::Duration| v.map_or(d, std::time::Duration::from_secs);
        let env_secs = |key: &str| env(key).and_then(|s| s.trim().parse::<u64>().ok());
        let command_window = CaptureWindow {
            timeout: secs(conv.command_timeout_secs, CaptureWindow::COMMAND.timeout),
            phrase_limit: secs(conv.command_phrase_limit_secs, CaptureWindow::COMMAND.phrase_limit),
        };
        let conversation = ConversationConfig {
            followup_cap: env("ALPHA_FOLLOWUP_CAP")
                .and_then(|s| s.parse().ok())
                .or(conv.followup_cap)
                .unwrap_or(1),
            command_window,
            followup_window: CaptureWindow {
                timeout: secs(
                    env_secs("ALPHA_FOLLOWUP_TIMEOUT_SECS").or(conv.followup_timeout_secs),
                    command_window.timeout,
                ),
                phrase_limit: secs(
                    env_secs("ALPHA_FOLLOWUP_PHRASE_LIMIT_SECS").or(conv.followup_phrase_limit_secs),
                    command_window.phrase_limit,
                ),
            },
            short_window: CaptureWindow {
                timeout: secs(conv.short_timeout_secs, CaptureWindow::SHORT.timeout),
                phrase_limit: secs(conv.short_phrase_limit_secs, CaptureWindow::SHORT.phrase_limit),
            },
        };

        let acts = fc.actions;
        let actions = ActionConfig {
            default_web_engine: env("ALPHA_WEB_ENGINE")
                .or(acts.default_web_engine)
                .map(|e| e.trim().to_lowercase())
                .unwrap_or(default_actions.default_web_engine),
            volume_step: env("ALPHA_VOLUME_STEP")
                .and_then(|s| s.parse().ok())
                .or(acts.volume_step)
                .map_or(default_actions.volume_step, |s: u8| s.min(100)),
            files_dir: env("ALPHA_FILES_DIR")
                .or(acts.files_dir)
                .map_or(default_actions.files_dir, PathBuf::from),
            default_extension: acts
                .default_extension
                .map(|e| e.trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .unwrap_or(default_actions.default_extension),
            read_budget: acts.read_budget.unwrap_or(default_actions.read_budget),
            responses_path: env("ALPHA_RESPONSES_PATH")
                .or(acts.responses_path)
                .map_or(default_actions.responses_path, PathBuf::from),
            min_confidence: env("ALPHA_MIN_CONFIDENCE")
                .and_then(|s| s.parse().ok())
                .or(acts.min_confidence)
                .map_or(default_actions.min_confidence, |c: f32| c.clamp(0.0, 1.0)),
        };

        let nlu = NluConfig {
            model: env("ALPHA_NLU_MODEL")
                .or(fc.nlu.model)
                .unwrap_or(defaults.nlu.model),
            timeout: defaults.nlu.timeout,
        };

        let v = fc.voice;
        let voice = VoiceConfig {
            enabled: v.enabled.unwrap_or(defaults.voice.enabled),
            stt_provider: env("ALPHA_STT_PROVIDER")
                .or(v.stt_provider)
                .unwrap_or(defaults.voice.stt_provider),
            stt_model: env("ALPHA_STT_MODEL")
                .or(v.stt_model)
                .unwrap_or(defaults.voice.stt_model),
            tts_provider: env("ALPHA_TTS_PROVIDER")
                .or(v.tts_provider)
                .unwrap_or(defaults.voice.tts_provider),
            tts_model: env("ALPHA_TTS_MODEL")
                .or(v.tts_model)
                .unwrap_or(defaults.voice.tts_model),
            tts_voice: v.tts_voice.unwrap_or(defaults.voice.tts_voice),
            tts_speed: v.tts_speed.unwrap_or(defaults.voice.tts_speed),
        };

        let k = fc.api_keys;
        let api_keys = ApiKeys {
            gemini: env("GEMINI_API_KEY").or(k.gemini).filter(|s| !s.is_empty()),
            openai: env("OPENAI_API_KEY").or(k.openai).filter(|s| !s.is_empty()),
            elevenlabs: env("ELEVENLABS_API_KEY")
                .or(k.elevenlabs)
                .filter(|s| !s.is_empty()),
            deepgram: env("DEEPGRAM_API_KEY")
                .or(k.deepgram)
                .filter(|s| !s.is_empty()),
        };

        Self {
            wake_words,
            listening_prompt,
            conversation,
            actions,
            nlu,
            voice,
            api_keys,
            data_dir,
        }
    }
}

fn normalize_wake_words(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

//! Error types for the Alpha assistant

use thiserror::Error;

/// Result type alias for Alpha operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Alpha assistant
///
/// These never reach the conversation loop from a handler; every boundary
/// converts them into spoken feedback or an `unknown` intent.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Wake word detection error
    #[error("wake word error: {0}")]
    WakeWord(String),

    /// Intent classification error
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Platform command error
    #[error("executor error: {0}")]
    Executor(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

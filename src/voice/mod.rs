//! Voice input and output
//!
//! Microphone capture, wake word detection, cloud STT/TTS and playback,
//! plus a text-mode console pair. The conversation loop only sees the
//! [`Listener`] and [`Speaker`] traits.

mod capture;
mod console;
mod listener;
mod playback;
mod resample;
mod stt;
mod tts;
mod wake_word;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use console::{ConsoleListener, ConsoleSpeaker};
pub use listener::{Capture, Listener, MicListener, POLL_INTERVAL, Speaker, VoiceSpeaker, Wake};
pub use playback::{AudioPlayback, Pcm, decode_mp3};
pub use resample::StreamResampler;
pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider};
pub use wake_word::{DetectorState, WakeWordDetector, rms_energy, strip_wake_word};

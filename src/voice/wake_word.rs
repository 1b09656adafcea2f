//! Wake word detection
//!
//! Energy-based voice activity detection segments the microphone stream
//! into utterances; each segment is transcribed and checked for a wake
//! phrase. After a match the detector is re-armed to capture exactly one
//! command utterance.

use regex::Regex;

use crate::{Error, Result};

use super::SAMPLE_RATE;

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to count as an utterance (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Silence that ends an utterance (1.2s at 16kHz)
const SILENCE_SAMPLES: usize = 19_200;

/// State of the wake word detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Accumulating a segment that may contain the wake word
    Listening,
    /// Wake word heard, capturing one command utterance
    Activated,
}

/// Detects wake phrases and delimits command utterances
pub struct WakeWordDetector {
    wake_words: Vec<String>,
    state: DetectorState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
    heard_speech: bool,
}

impl WakeWordDetector {
    /// Create a detector for the given phrases (matched case-insensitively)
    ///
    /// # Errors
    ///
    /// Returns error if no non-empty wake phrase is given
    pub fn new(wake_words: Vec<String>) -> Result<Self> {
        let normalized: Vec<String> = wake_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        if normalized.is_empty() {
            return Err(Error::WakeWord("at least one wake word is required".to_string()));
        }

        tracing::debug!(wake_words = ?normalized, "wake word detector initialized");

        Ok(Self {
            wake_words: normalized,
            state: DetectorState::Idle,
            speech_buffer: Vec::new(),
            silence_counter: 0,
            heard_speech: false,
        })
    }

    /// Feed audio samples
    ///
    /// Returns true when a candidate wake segment is complete (speech
    /// followed by silence) and should be transcribed.
    pub fn process(&mut self, samples: &[f32]) -> bool {
        if samples.is_empty() {
            return false;
        }

        let energy = rms_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Listening;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected, listening");
                }
            }
            DetectorState::Listening => {
                self.speech_buffer.extend_from_slice(samples);
                self.track_silence(is_speech, samples.len());

                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_buffer.len() > MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.speech_buffer.len(), "speech segment complete");
                    return true;
                }

                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("segment timed out, resetting");
                    self.reset();
                }
            }
            DetectorState::Activated => {
                // Leading silence is dropped so the capture window measures
                // time-to-speech, not buffer length
                if !self.heard_speech && !is_speech {
                    return false;
                }
                self.heard_speech = true;
                self.speech_buffer.extend_from_slice(samples);
                self.track_silence(is_speech, samples.len());
            }
        }

        false
    }

    fn track_silence(&mut self, is_speech: bool, len: usize) {
        if is_speech {
            self.silence_counter = 0;
        } else {
            self.silence_counter += len;
        }
    }

    /// Check a transcript for a wake phrase
    ///
    /// Returns the text following the phrase (possibly empty) on a match and
    /// resets the detector either way.
    pub fn match_wake_word(&mut self, transcript: &str) -> Option<String> {
        let found = self
            .wake_words
            .iter()
            .find_map(|w| strip_wake_word(transcript, w).map(|rest| (w.clone(), rest)));

        self.reset();

        let (wake_word, rest) = found?;
        tracing::info!(wake_word, transcript, "wake word detected");
        Some(rest)
    }

    /// Arm the detector to capture one command utterance
    pub fn begin_utterance(&mut self) {
        self.reset();
        self.state = DetectorState::Activated;
    }

    /// Whether speech has started since [`begin_utterance`](Self::begin_utterance)
    #[must_use]
    pub const fn has_heard_speech(&self) -> bool {
        self.heard_speech
    }

    /// Check if utterance capture is complete (silence after speech)
    #[must_use]
    pub fn is_utterance_complete(&self) -> bool {
        self.state == DetectorState::Activated
            && self.heard_speech
            && self.silence_counter > SILENCE_SAMPLES
            && self.speech_buffer.len() > MIN_SPEECH_SAMPLES
    }

    /// Duration of the utterance captured so far
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn utterance_secs(&self) -> f32 {
        self.speech_buffer.len() as f32 / SAMPLE_RATE as f32
    }

    /// Take the speech buffer, clearing it
    pub fn take_speech_buffer(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.speech_buffer)
    }

    /// Reset detector to idle state
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.speech_buffer.clear();
        self.silence_counter = 0;
        self.heard_speech = false;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    /// Get the configured wake words
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }
}

/// Return the text after `wake_word` in `transcript`, if it occurs
///
/// The phrase must stand as whole words ("alphabet" doesn't wake "alpha"),
/// and any whitespace or commas may separate its words. Leading punctuation
/// after the phrase is dropped, so "Alpha, open chrome" yields "open chrome".
/// Matching is case-insensitive.
#[must_use]
pub fn strip_wake_word(transcript: &str, wake_word: &str) -> Option<String> {
    let words: Vec<String> = wake_word.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }

    let pattern = format!(r"(?i)\b{}\b", words.join(r"[\s,]+"));
    let matcher = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(wake_word, error = %e, "unusable wake phrase");
            return None;
        }
    };

    let end = matcher.find(transcript)?.end();
    Some(
        transcript[end..]
            .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?'))
            .trim_end()
            .to_string(),
    )
}

/// RMS energy of audio samples; 0 for an empty slice
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

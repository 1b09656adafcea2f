//! Listener and speaker seams used by the conversation loop
//!
//! cpal streams are not `Send`, so both traits use `?Send` futures and the
//! loop runs on the main task.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::playback::AudioPlayback;
use super::stt::SpeechToText;
use super::tts::TextToSpeech;
use super::wake_word::WakeWordDetector;
use crate::Result;
use crate::config::CaptureWindow;

/// How often blocking listens check for new audio and cancellation
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of one bounded listen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// A non-empty transcript
    Heard(String),
    /// Nobody spoke before the window elapsed
    Silence,
    /// Speech was heard but could not be transcribed into words
    Unintelligible,
    /// The speech service failed
    Unavailable(String),
    /// The stop signal fired mid-listen
    Cancelled,
}

/// Result of waiting for the wake phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wake {
    /// Wake phrase heard; `trailing` is any command spoken in the same breath
    Detected { trailing: Option<String> },
    /// The stop signal fired
    Cancelled,
    /// The input source is exhausted (end of stdin)
    Closed,
}

/// Source of utterances
#[async_trait(?Send)]
pub trait Listener {
    /// Block until the wake phrase is heard, cancellation, or end of input
    ///
    /// # Errors
    ///
    /// Returns error if the audio device fails irrecoverably
    async fn wait_for_wake_word(&mut self, cancel: &CancellationToken) -> Result<Wake>;

    /// Listen for a single utterance within `window`
    async fn capture(&mut self, window: CaptureWindow, cancel: &CancellationToken) -> Capture;
}

/// Sink for spoken output; returns once the text has been rendered
#[async_trait(?Send)]
pub trait Speaker {
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Run `work` to completion, or `None` if the stop signal fires first
///
/// A signal that is already set wins even over work that is ready.
pub(crate) async fn until_cancelled<F: Future>(cancel: &CancellationToken, work: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        out = work => Some(out),
    }
}

/// Microphone listener: VAD segmentation, wake phrase check, cloud STT
pub struct MicListener {
    capture: AudioCapture,
    detector: WakeWordDetector,
    stt: SpeechToText,
}

impl MicListener {
    /// Open the microphone and start capturing
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    pub fn new(detector: WakeWordDetector, stt: SpeechToText) -> Result<Self> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;
        tracing::info!(wake_words = ?detector.wake_words(), "listening for wake word");
        Ok(Self {
            capture,
            detector,
            stt,
        })
    }

    /// Transcribe `samples`, or `None` if the stop signal fires first
    async fn transcribe(&self, samples: &[f32], cancel: &CancellationToken) -> Option<Result<String>> {
        let wav = match samples_to_wav(samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => return Some(Err(e)),
        };

        until_cancelled(cancel, self.stt.transcribe(&wav)).await
    }
}

impl Drop for MicListener {
    fn drop(&mut self) {
        self.capture.stop();
    }
}

#[async_trait(?Send)]
impl Listener for MicListener {
    async fn wait_for_wake_word(&mut self, cancel: &CancellationToken) -> Result<Wake> {
        // Audio recorded while the assistant was talking is not a wake attempt
        self.capture.clear_buffer();
        self.detector.reset();

        loop {
            tokio::select! {
                () = cancel.cancelled() => return Ok(Wake::Cancelled),
                () = tokio::time::sleep(POLL_INTERVAL) => {}
            }

            let samples = self.capture.take_buffer();
            if !self.detector.process(&samples) {
                continue;
            }

            let segment = self.detector.take_speech_buffer();
            let transcript = match self.transcribe(&segment, cancel).await {
                None => return Ok(Wake::Cancelled),
                Some(Ok(t)) => t,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "wake segment transcription failed");
                    self.detector.reset();
                    continue;
                }
            };
            tracing::debug!(transcript = %transcript, "wake attempt heard");

            if let Some(rest) = self.detector.match_wake_word(&transcript) {
                let trailing = (!rest.is_empty()).then_some(rest);
                return Ok(Wake::Detected { trailing });
            }
        }
    }

    async fn capture(&mut self, window: CaptureWindow, cancel: &CancellationToken) -> Capture {
        self.capture.clear_buffer();
        self.detector.begin_utterance();

        let started = tokio::time::Instant::now();
        let phrase_limit = window.phrase_limit.as_secs_f32();

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    self.detector.reset();
                    return Capture::Cancelled;
                }
                () = tokio::time::sleep(POLL_INTERVAL) => {}
            }

            let samples = self.capture.take_buffer();
            self.detector.process(&samples);

            if !self.detector.has_heard_speech() {
                if started.elapsed() >= window.timeout {
                    self.detector.reset();
                    return Capture::Silence;
                }
                continue;
            }

            if self.detector.is_utterance_complete() || self.detector.utterance_secs() >= phrase_limit {
                break;
            }
        }

        let utterance = self.detector.take_speech_buffer();
        self.detector.reset();

        match self.transcribe(&utterance, cancel).await {
            None => Capture::Cancelled,
            Some(Ok(text)) if text.is_empty() => Capture::Unintelligible,
            Some(Ok(text)) => {
                tracing::info!(utterance = %text, "utterance captured");
                Capture::Heard(text)
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "speech service error");
                Capture::Unavailable(e.to_string())
            }
        }
    }
}

/// Speaks through cloud TTS and the default output device
pub struct VoiceSpeaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl VoiceSpeaker {
    /// # Errors
    ///
    /// Returns error if the output device cannot be opened
    pub fn new(tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            tts,
            playback: AudioPlayback::new()?,
        })
    }
}

#[async_trait(?Send)]
impl Speaker for VoiceSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text).await?;
        self.playback.play_mp3(&audio).await
    }
}

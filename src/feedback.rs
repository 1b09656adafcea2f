//! Spoken and displayed feedback
//!
//! [`Feedback`] is the conversation's only output surface. Speech blocks
//! until playback completes; presentation updates are pushed onto a
//! one-way channel and never block.

use tokio::sync::mpsc;

use crate::voice::Speaker;

/// Message sent to the presentation surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Replace the status line
    Status(String),
    /// Append a log line
    Log(String),
    /// Toggle the listening indicator
    Listening(bool),
}

/// Create the presentation channel
#[must_use]
pub fn status_channel() -> (StatusSender, mpsc::UnboundedReceiver<StatusEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StatusSender(Some(tx)), rx)
}

/// Sending half of the presentation channel; a closed or absent display
/// is silently ignored
#[derive(Debug, Clone, Default)]
pub struct StatusSender(Option<mpsc::UnboundedSender<StatusEvent>>);

impl StatusSender {
    /// A sender with no display attached
    #[must_use]
    pub const fn detached() -> Self {
        Self(None)
    }

    fn send(&self, event: StatusEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}

/// Speech plus presentation sink
pub struct Feedback {
    speaker: Box<dyn Speaker>,
    status: StatusSender,
}

impl Feedback {
    pub fn new(speaker: Box<dyn Speaker>, status: StatusSender) -> Self {
        Self { speaker, status }
    }

    /// Speak and log a line; blocks until playback finishes
    ///
    /// Speech failures fall back to printing the text.
    pub async fn speak(&mut self, text: &str) {
        tracing::info!(text, "Alpha");
        self.status.send(StatusEvent::Log(format!("Alpha: {text}")));

        if let Err(e) = self.speaker.speak(text).await {
            tracing::warn!(error = %e, "speech output failed");
            println!("Alpha (TTS FAILED): {text}");
        }
    }

    /// Append a line to the display log
    pub fn log_line(&self, text: impl Into<String>) {
        self.status.send(StatusEvent::Log(text.into()));
    }

    /// Replace the display status line
    pub fn set_status(&self, text: impl Into<String>) {
        self.status.send(StatusEvent::Status(text.into()));
    }

    /// Toggle the display's listening indicator
    pub fn set_listening(&self, listening: bool) {
        self.status.send(StatusEvent::Listening(listening));
    }
}

//! The conversation state machine
//!
//! ```text
//! Idle ──wake──▶ CommandCapture ──heard──▶ Dispatching ──relisten──▶ FollowupCapture
//!  ▲                   │                       │                          │
//!  └──── silence ──────┘◀──────── done ────────┘◀──────── heard ──────────┘
//! ```
//!
//! Any state moves to `ShuttingDown` when the cancellation token fires.
//! Follow-ups are bounded by a per-turn counter, so a classifier that keeps
//! answering `unknown` cannot spin the loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::config::ConversationConfig;
use crate::dispatch::{DispatchContext, Dispatcher};
use crate::feedback::Feedback;
use crate::intent::IntentClassifier;
use crate::voice::{Capture, Listener, Wake};

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    CommandCapture,
    Dispatching,
    FollowupCapture,
    ShuttingDown,
}

/// One wake-to-idle cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// The command that started the turn; follow-up answers don't replace it
    pub original_command: String,
    /// A clarifying question is outstanding
    pub awaiting_followup: bool,
    /// Follow-up captures taken so far
    pub followups: u32,
}

impl Turn {
    #[must_use]
    pub const fn new(original_command: String) -> Self {
        Self {
            original_command,
            awaiting_followup: false,
            followups: 0,
        }
    }
}

/// Wires listener, classifier, dispatcher and feedback together
pub struct ConversationLoop {
    listener: Box<dyn Listener>,
    classifier: Arc<dyn IntentClassifier>,
    dispatcher: Dispatcher,
    feedback: Feedback,
    config: ConversationConfig,
    wake_word: String,
    listening_prompt: String,
    state: State,
}

impl ConversationLoop {
    pub fn new(
        listener: Box<dyn Listener>,
        classifier: Arc<dyn IntentClassifier>,
        dispatcher: Dispatcher,
        feedback: Feedback,
        config: ConversationConfig,
    ) -> Self {
        Self {
            listener,
            classifier,
            dispatcher,
            feedback,
            config,
            wake_word: crate::config::DEFAULT_WAKE_WORD.to_string(),
            listening_prompt: crate::config::DEFAULT_LISTENING_PROMPT.to_string(),
            state: State::Idle,
        }
    }

    /// Wake phrase named in the startup announcement
    #[must_use]
    pub fn with_wake_word(mut self, wake_word: impl Into<String>) -> Self {
        self.wake_word = wake_word.into();
        self
    }

    /// Prompt spoken after a bare wake phrase
    #[must_use]
    pub fn with_listening_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.listening_prompt = prompt.into();
        self
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    fn enter(&mut self, state: State) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "state transition");
            self.state = state;
        }
    }

    /// Run until cancelled or the input source closes
    ///
    /// # Errors
    ///
    /// Returns error if the listener fails irrecoverably; a farewell is
    /// still spoken first
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        let announcement = format!(
            "Alpha activated. I am listening for the wake word: {}.",
            self.wake_word
        );
        self.feedback.speak(&announcement).await;

        let outcome = loop {
            if cancel.is_cancelled() {
                tracing::info!("stop requested");
                break Ok(());
            }

            self.enter(State::Idle);
            self.feedback.set_listening(false);
            self.feedback.set_status("Status: Idle");

            match self.listener.wait_for_wake_word(cancel).await {
                Ok(Wake::Detected { trailing }) => self.run_turn(trailing, cancel).await,
                Ok(Wake::Cancelled) => break Ok(()),
                Ok(Wake::Closed) => {
                    tracing::info!("input closed");
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "listener failed");
                    break Err(e);
                }
            }
        };

        self.enter(State::ShuttingDown);
        self.feedback.set_listening(false);
        self.feedback.log_line("Assistant shutting down...");
        let farewell = if outcome.is_ok() {
            "Goodbye."
        } else {
            "A critical error has occurred and Alpha is shutting down."
        };
        self.feedback.speak(farewell).await;
        outcome
    }

    /// Handle one turn after the wake phrase
    ///
    /// `trailing` is a command spoken together with the wake phrase; when
    /// absent the listening prompt is spoken and a command is captured.
    pub async fn run_turn(&mut self, trailing: Option<String>, cancel: &CancellationToken) {
        self.feedback.set_listening(true);
        self.feedback.set_status("Status: Wake word detected, listening for command");
        self.feedback.log_line("Wake word detected.");

        let command = match trailing {
            Some(command) => command,
            None => {
                self.enter(State::CommandCapture);
                let prompt = self.listening_prompt.clone();
                self.feedback.speak(&prompt).await;

                match self.listener.capture(self.config.command_window, cancel).await {
                    Capture::Heard(text) => text,
                    other => {
                        self.capture_notice(&other).await;
                        return;
                    }
                }
            }
        };

        tracing::info!(command = %command, "command received");
        self.feedback.log_line(format!("User command: {command}"));

        let mut turn = Turn::new(command.clone());
        let mut utterance = command;

        loop {
            if cancel.is_cancelled() {
                return;
            }

            self.enter(State::Dispatching);
            let intent = self.classifier.classify(&utterance).await;

            let mut ctx = DispatchContext {
                listener: self.listener.as_mut(),
                feedback: &mut self.feedback,
                cancel,
                allow_followup: turn.followups < self.config.followup_cap,
            };
            let result = self.dispatcher.dispatch(&intent, &utterance, &mut ctx).await;

            if !result.relisten_requested {
                break;
            }
            if turn.followups >= self.config.followup_cap {
                tracing::warn!(
                    followups = turn.followups,
                    original_command = %turn.original_command,
                    "follow-up cap reached"
                );
                break;
            }

            turn.awaiting_followup = true;
            turn.followups += 1;
            self.enter(State::FollowupCapture);
            self.feedback
                .log_line(format!("Prompted follow-up: {}", turn.original_command));

            match self.listener.capture(self.config.followup_window, cancel).await {
                Capture::Heard(text) => {
                    tracing::info!(
                        followup = %text,
                        original_command = %turn.original_command,
                        "follow-up received"
                    );
                    self.feedback.log_line(format!("User follow-up: {text}"));
                    turn.awaiting_followup = false;
                    utterance = text;
                }
                Capture::Cancelled => return,
                other => {
                    if !matches!(other, Capture::Silence) {
                        self.capture_notice(&other).await;
                    }
                    self.feedback
                        .speak("No response heard. Returning to wake word detection.")
                        .await;
                    break;
                }
            }
        }
    }

    async fn capture_notice(&mut self, capture: &Capture) {
        let notice = match capture {
            Capture::Heard(_) | Capture::Cancelled => return,
            Capture::Silence => "I didn't hear a command. Returning to sleep mode.",
            Capture::Unintelligible => {
                "Sorry, I could not understand the audio. Please speak clearly."
            }
            Capture::Unavailable(reason) => {
                tracing::warn!(reason = %reason, "speech service unavailable");
                "Sorry, my speech service is currently unavailable."
            }
        };
        self.feedback.speak(notice).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_turn_has_no_followups() {
        let turn = Turn::new("play".to_string());
        assert_eq!(turn.original_command, "play");
        assert!(!turn.awaiting_followup);
        assert_eq!(turn.followups, 0);
    }
}

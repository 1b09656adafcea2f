//! Action dispatch: one handler per intent kind
//!
//! Handlers never fail past this module. Missing parameters produce a
//! corrective prompt, platform and filesystem failures are spoken, and the
//! only signal returned to the conversation loop is [`ActionResult`].

mod clarify;
mod files;
mod links;
mod responses;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use clarify::{Cue, detect_cue};
pub use files::{FileOperation, FileReply, FileStore};
pub use links::{SearchEngine, normalize_url, resolve_engine, youtube_search_url};
pub use responses::{ResponseLog, format_entry, is_affirmative};

use crate::config::{ActionConfig, CaptureWindow};
use crate::feedback::Feedback;
use crate::intent::{ActionKind, Intent};
use crate::platform::{Outcome, PlatformExecutor, PowerAction, VolumeChange, WindowGesture};
use crate::voice::{Capture, Listener};

/// Outcome of running one handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionResult {
    pub succeeded: bool,
    /// Only the clarification path of `unknown` sets this
    pub relisten_requested: bool,
}

impl ActionResult {
    #[must_use]
    pub const fn done() -> Self {
        Self {
            succeeded: true,
            relisten_requested: false,
        }
    }

    #[must_use]
    pub const fn failed() -> Self {
        Self {
            succeeded: false,
            relisten_requested: false,
        }
    }

    #[must_use]
    pub const fn relisten() -> Self {
        Self {
            succeeded: false,
            relisten_requested: true,
        }
    }

    const fn from_success(succeeded: bool) -> Self {
        if succeeded { Self::done() } else { Self::failed() }
    }
}

/// Typed view of an intent's parameters
///
/// Every parameter is optional here; handlers decide what is required.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    KnowledgeReply {
        answer: Option<String>,
    },
    OpenWebsite {
        url: Option<String>,
    },
    OpenApplication {
        app: Option<String>,
    },
    CloseApplication {
        app: Option<String>,
    },
    YoutubeSearch {
        query: Option<String>,
    },
    YoutubePlay {
        song: Option<String>,
        artist: Option<String>,
    },
    WebSearch {
        query: Option<String>,
        engine: Option<String>,
    },
    SystemControl {
        command: Option<String>,
    },
    VolumeControl {
        operation: Option<String>,
        value: Option<f64>,
    },
    WindowControl {
        command: Option<String>,
    },
    FileIo {
        operation: Option<String>,
        file_name: Option<String>,
        content: Option<String>,
    },
    Unknown {
        reason: Option<String>,
    },
}

impl Action {
    /// Extract the parameters each kind declares
    #[must_use]
    pub fn from_intent(intent: &Intent) -> Self {
        match intent.kind {
            ActionKind::KnowledgeReply => Self::KnowledgeReply {
                answer: intent.text("answer"),
            },
            ActionKind::OpenWebsite => Self::OpenWebsite {
                url: intent.text("url"),
            },
            ActionKind::OpenApplication => Self::OpenApplication {
                app: intent.text("app_name"),
            },
            ActionKind::CloseApplication => Self::CloseApplication {
                app: intent.text("app_name"),
            },
            ActionKind::YoutubeSearch => Self::YoutubeSearch {
                query: intent.text("query"),
            },
            ActionKind::YoutubePlay => Self::YoutubePlay {
                song: intent.text("song_name"),
                artist: intent.text("artist"),
            },
            ActionKind::WebSearch => Self::WebSearch {
                query: intent.text("query"),
                engine: intent.text("engine"),
            },
            ActionKind::SystemControl => Self::SystemControl {
                command: intent.text("command"),
            },
            ActionKind::VolumeControl => Self::VolumeControl {
                operation: intent.text("operation"),
                value: intent.number("value"),
            },
            ActionKind::WindowControl => Self::WindowControl {
                command: intent.text("command"),
            },
            ActionKind::FileIo => Self::FileIo {
                operation: intent.text("operation"),
                file_name: intent.text("file_name"),
                content: intent.text("content"),
            },
            ActionKind::Unknown => Self::Unknown {
                reason: intent.text("reason"),
            },
        }
    }
}

/// Collaborators a handler may use during one dispatch
pub struct DispatchContext<'a> {
    pub listener: &'a mut dyn Listener,
    pub feedback: &'a mut Feedback,
    pub cancel: &'a CancellationToken,
    /// False once the turn's follow-up budget is spent; the unknown
    /// handler then apologizes instead of asking again
    pub allow_followup: bool,
}

/// Maps intents to handlers
pub struct Dispatcher {
    executor: Arc<dyn PlatformExecutor>,
    actions: ActionConfig,
    files: FileStore,
    responses: ResponseLog,
    short_window: CaptureWindow,
}

impl Dispatcher {
    pub fn new(
        executor: Arc<dyn PlatformExecutor>,
        actions: ActionConfig,
        short_window: CaptureWindow,
    ) -> Self {
        let files = FileStore::new(
            &actions.files_dir,
            &actions.default_extension,
            actions.read_budget,
        );
        let responses = ResponseLog::new(&actions.responses_path);
        Self {
            executor,
            actions,
            files,
            responses,
            short_window,
        }
    }

    /// Run exactly one handler for `intent`
    ///
    /// `utterance` is the text that was classified; it is used as the saved
    /// question and for clarification cues.
    pub async fn dispatch(
        &self,
        intent: &Intent,
        utterance: &str,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        tracing::info!(
            kind = %intent.kind,
            parameters = ?intent.parameters,
            confidence = ?intent.confidence,
            "dispatching intent"
        );

        let gated = intent.clone().gated(self.actions.min_confidence, utterance);

        match Action::from_intent(&gated) {
            Action::KnowledgeReply { answer } => {
                self.knowledge_reply(answer, utterance, ctx).await
            }
            Action::OpenWebsite { url } => self.open_website(url, ctx).await,
            Action::OpenApplication { app } => self.open_application(app, ctx).await,
            Action::CloseApplication { app } => self.close_application(app, ctx).await,
            Action::YoutubeSearch { query } => self.youtube_search(query, ctx).await,
            Action::YoutubePlay { song, artist } => self.youtube_play(song, artist, ctx).await,
            Action::WebSearch { query, engine } => self.web_search(query, engine, ctx).await,
            Action::SystemControl { command } => self.system_control(command, ctx).await,
            Action::VolumeControl { operation, value } => {
                self.volume_control(operation, value, ctx).await
            }
            Action::WindowControl { command } => self.window_control(command, ctx).await,
            Action::FileIo {
                operation,
                file_name,
                content,
            } => self.file_io(operation, file_name, content, ctx).await,
            Action::Unknown { reason } => Self::unknown(reason, utterance, ctx).await,
        }
    }

    async fn knowledge_reply(
        &self,
        answer: Option<String>,
        question: &str,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(answer) = answer else {
            ctx.feedback
                .speak("I received an empty response from the knowledge engine.")
                .await;
            return ActionResult::failed();
        };

        ctx.feedback.speak(&answer).await;
        ctx.feedback
            .speak("Would you like me to save this response for later? Please say yes or no.")
            .await;

        let mut reply = ctx.listener.capture(self.short_window, ctx.cancel).await;
        if matches!(
            reply,
            Capture::Silence | Capture::Unintelligible | Capture::Unavailable(_)
        ) {
            ctx.feedback
                .speak("I didn't catch that. Do you want me to save it? Say yes or no.")
                .await;
            reply = ctx.listener.capture(self.short_window, ctx.cancel).await;
        }

        let confirmed = match &reply {
            Capture::Heard(text) => is_affirmative(text),
            Capture::Cancelled => return ActionResult::done(),
            _ => false,
        };

        if !confirmed {
            ctx.feedback.speak("Okay, I won't save it.").await;
            return ActionResult::done();
        }

        match self.responses.append(question, &answer) {
            Ok(()) => ctx.feedback.speak("Saved the response to my memory.").await,
            Err(e) => {
                tracing::error!(error = %e, path = %self.responses.path().display(), "failed to save response");
                ctx.feedback
                    .speak("Sorry, I couldn't save the response due to an error.")
                    .await;
            }
        }
        ActionResult::done()
    }

    async fn open_website(&self, url: Option<String>, ctx: &mut DispatchContext<'_>) -> ActionResult {
        let Some(url) = url else {
            ctx.feedback.speak("I need a website address to open.").await;
            return ActionResult::failed();
        };

        let url = normalize_url(&url);
        ctx.feedback.speak(&format!("Opening {url}")).await;
        self.open(&url, ctx).await
    }

    async fn open(&self, url: &str, ctx: &mut DispatchContext<'_>) -> ActionResult {
        let outcome = self.executor.open_url(url).await;
        log_outcome("open_url", &outcome);
        if !outcome.success {
            ctx.feedback
                .speak("Sorry, I couldn't open the browser.")
                .await;
        }
        ActionResult::from_success(outcome.success)
    }

    async fn open_application(
        &self,
        app: Option<String>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(app) = app else {
            ctx.feedback.speak("I need an application name to open.").await;
            return ActionResult::failed();
        };

        ctx.feedback.speak(&format!("Launching {app}.")).await;
        let outcome = self.executor.launch_app(&app).await;
        log_outcome("launch_app", &outcome);
        if !outcome.success {
            ctx.feedback
                .speak(&format!("Sorry, I couldn't find the application: {app}."))
                .await;
        }
        ActionResult::from_success(outcome.success)
    }

    async fn close_application(
        &self,
        app: Option<String>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(app) = app else {
            ctx.feedback.speak("I need an application name to close.").await;
            return ActionResult::failed();
        };

        ctx.feedback.speak(&format!("Attempting to close {app}.")).await;
        let outcome = self.executor.close_app(&app).await;
        log_outcome("close_app", &outcome);
        let message = if outcome.success {
            format!("{app} closed successfully.")
        } else {
            format!("Sorry, I couldn't close the application or it wasn't running: {app}.")
        };
        ctx.feedback.speak(&message).await;
        ActionResult::from_success(outcome.success)
    }

    async fn youtube_search(
        &self,
        query: Option<String>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(query) = query else {
            ctx.feedback.speak("I need a search query for YouTube.").await;
            return ActionResult::failed();
        };

        ctx.feedback
            .speak(&format!("Searching YouTube for: {query}"))
            .await;
        self.open(&youtube_search_url(&query), ctx).await
    }

    async fn youtube_play(
        &self,
        song: Option<String>,
        artist: Option<String>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(song) = song else {
            ctx.feedback.speak("I need a song or video name to play.").await;
            return ActionResult::failed();
        };

        let query = match artist {
            Some(artist) => format!("{song} {artist}"),
            None => song,
        };
        ctx.feedback
            .speak(&format!("Playing {query} on YouTube."))
            .await;
        self.open(&youtube_search_url(&query), ctx).await
    }

    async fn web_search(
        &self,
        query: Option<String>,
        engine: Option<String>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(query) = query else {
            ctx.feedback.speak("I need a query for a web search.").await;
            return ActionResult::failed();
        };

        let engine = resolve_engine(engine.as_deref(), &self.actions.default_web_engine);
        ctx.feedback
            .speak(&format!("Searching {} for: {query}", engine.display_name()))
            .await;
        self.open(&engine.search_url(&query), ctx).await
    }

    async fn system_control(
        &self,
        command: Option<String>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(command) = command else {
            ctx.feedback
                .speak("I need a command like shutdown, restart, or lock.")
                .await;
            return ActionResult::failed();
        };

        let outcome = match PowerAction::parse(&command) {
            Some(action) => {
                let outcome = self.executor.power_action(action).await;
                log_outcome("power_action", &outcome);
                Some((action, outcome))
            }
            None => None,
        };

        match outcome {
            Some((action, outcome)) if outcome.success => {
                let message = match action {
                    PowerAction::Shutdown => "System shutting down.",
                    PowerAction::Restart => "System restarting.",
                    PowerAction::Sleep => "System entering sleep mode.",
                    PowerAction::Lock => "System locked.",
                };
                ctx.feedback.speak(message).await;
                ActionResult::done()
            }
            _ => {
                ctx.feedback
                    .speak(&format!(
                        "Sorry, the system control command '{command}' failed."
                    ))
                    .await;
                ActionResult::failed()
            }
        }
    }

    async fn volume_control(
        &self,
        operation: Option<String>,
        value: Option<f64>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let step = self.actions.volume_step;
        let operation = operation.map(|o| o.to_lowercase());

        let change = match (operation.as_deref(), value) {
            (Some("set"), Some(v)) => VolumeChange::Set(percent(v)),
            (Some("set"), None) => {
                ctx.feedback.speak("I need a volume level to set.").await;
                return ActionResult::failed();
            }
            (Some("increase" | "up"), _) => VolumeChange::Increase(step),
            (Some("decrease" | "down"), _) => VolumeChange::Decrease(step),
            (Some("mute"), _) => VolumeChange::Mute,
            (Some("unmute"), _) => VolumeChange::Unmute,
            _ => {
                ctx.feedback
                    .speak("I need a volume operation like increase, decrease, mute, or set.")
                    .await;
                return ActionResult::failed();
            }
        };

        let outcome = self.executor.set_volume(change).await;
        log_outcome("set_volume", &outcome);
        let message = if outcome.success {
            match change {
                VolumeChange::Set(v) => format!("Volume set to {v} percent."),
                VolumeChange::Increase(s) => format!("Volume increased by {s} percent."),
                VolumeChange::Decrease(s) => format!("Volume decreased by {s} percent."),
                VolumeChange::Mute => "Volume muted.".to_string(),
                VolumeChange::Unmute => "Volume unmuted.".to_string(),
            }
        } else {
            "I'm sorry, I couldn't control the system volume.".to_string()
        };
        ctx.feedback.speak(&message).await;
        ActionResult::from_success(outcome.success)
    }

    async fn window_control(
        &self,
        command: Option<String>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(gesture) = command.as_deref().and_then(WindowGesture::parse) else {
            let command = command.unwrap_or_default();
            ctx.feedback
                .speak(&format!("Unknown window control command: {command}"))
                .await;
            return ActionResult::failed();
        };

        let outcome = self.executor.window_gesture(gesture).await;
        log_outcome("window_gesture", &outcome);
        let message = match (outcome.success, gesture) {
            (true, WindowGesture::Minimize) => "Window minimized.",
            (true, WindowGesture::Maximize) => "Window maximized.",
            (false, _) => {
                "I had trouble controlling the window. Check your system's keyboard shortcuts."
            }
        };
        ctx.feedback.speak(message).await;
        ActionResult::from_success(outcome.success)
    }

    async fn file_io(
        &self,
        operation: Option<String>,
        file_name: Option<String>,
        content: Option<String>,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let Some(op) = operation.as_deref().and_then(FileOperation::parse) else {
            let message = match operation {
                Some(op) => format!("The file operation '{op}' is not supported."),
                None => "I need a file operation like create, append, read, delete, or list."
                    .to_string(),
            };
            ctx.feedback.speak(&message).await;
            return ActionResult::failed();
        };

        let reply = self
            .files
            .perform(op, file_name.as_deref(), content.as_deref());
        ctx.feedback.speak(&reply.message).await;
        ActionResult::from_success(reply.succeeded)
    }

    async fn unknown(
        reason: Option<String>,
        utterance: &str,
        ctx: &mut DispatchContext<'_>,
    ) -> ActionResult {
        let reason = reason.unwrap_or_else(|| "Command not understood.".to_string());

        if ctx.allow_followup {
            if let Some(cue) = detect_cue(utterance) {
                tracing::info!(?cue, utterance, "asking for clarification");
                ctx.feedback.speak(cue.question()).await;
                return ActionResult::relisten();
            }
        }

        tracing::warn!(reason = %reason, utterance, "unknown command");
        ctx.feedback
            .speak(&format!(
                "I'm sorry, I didn't understand the command. The NLU reason was: {reason}"
            ))
            .await;
        ActionResult::failed()
    }
}

/// Platform diagnostics are never spoken, only logged
fn log_outcome(operation: &'static str, outcome: &Outcome) {
    if outcome.success {
        tracing::debug!(operation, "platform operation succeeded");
    } else {
        tracing::warn!(
            operation,
            diagnostic = outcome.diagnostic.as_deref().unwrap_or("none"),
            "platform operation failed"
        );
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

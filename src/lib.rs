//! Alpha - wake-word voice assistant for the desktop
//!
//! This library provides the pieces the `alpha` binary wires together:
//! - Voice input (wake word detection, capture windows, STT) and output (TTS)
//! - Intent classification through a hosted language model
//! - Action handlers for browser, application, system and file commands
//! - A bounded conversation loop with clarifying follow-ups
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Input surfaces                    │
//! │        Microphone (VAD + STT)  │  Console text      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ Listener
//! ┌────────────────────▼────────────────────────────────┐
//! │                Conversation loop                    │
//! │   Wake  │  Capture  │  Classify  │  Follow-up cap   │
//! └──────────┬─────────────────────────────┬────────────┘
//!            │ Intent                      │ Feedback
//! ┌──────────▼──────────────┐   ┌──────────▼────────────┐
//! │        Dispatcher       │   │  Speaker + display    │
//! │ Browser │ Apps │ Files  │   │  (TTS or console)     │
//! │ Volume  │ Power│ Window │   └───────────────────────┘
//! └──────────┬──────────────┘
//!            │ PlatformExecutor
//! ┌──────────▼──────────────────────────────────────────┐
//! │        Linux  │  macOS  │  Windows  │  Dry run      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod feedback;
pub mod intent;
pub mod platform;
pub mod voice;

pub use config::Config;
pub use conversation::{ConversationLoop, State, Turn};
pub use dispatch::{ActionResult, DispatchContext, Dispatcher};
pub use error::{Error, Result};
pub use feedback::{Feedback, StatusEvent, StatusSender, status_channel};
pub use intent::{ActionKind, GeminiClassifier, Intent, IntentClassifier};
pub use platform::{Outcome, PlatformExecutor};

//! Shared test utilities: scripted input, recorded output

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use alpha_assistant::config::{ActionConfig, CaptureWindow, ConversationConfig};
use alpha_assistant::feedback::{Feedback, StatusSender};
use alpha_assistant::intent::{Intent, IntentClassifier};
use alpha_assistant::platform::{
    Outcome, PlatformExecutor, PowerAction, VolumeChange, WindowGesture,
};
use alpha_assistant::voice::{Capture, Listener, Speaker, Wake};

/// Lines spoken during a test, in order
pub type Spoken = Arc<Mutex<Vec<String>>>;

/// Listener that replays queued wake events and captures
///
/// Once the wake queue is empty the input reports closed; once the capture
/// queue is empty every listen is silent.
#[derive(Default)]
pub struct ScriptedListener {
    wakes: VecDeque<Wake>,
    captures: VecDeque<Capture>,
    windows: Arc<Mutex<Vec<CaptureWindow>>>,
}

impl ScriptedListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wake(mut self, trailing: Option<&str>) -> Self {
        self.wakes.push_back(Wake::Detected {
            trailing: trailing.map(ToString::to_string),
        });
        self
    }

    pub fn hear(mut self, text: &str) -> Self {
        self.captures.push_back(Capture::Heard(text.to_string()));
        self
    }

    pub fn then(mut self, capture: Capture) -> Self {
        self.captures.push_back(capture);
        self
    }

    /// Windows passed to `capture`, in call order
    pub fn windows(&self) -> Arc<Mutex<Vec<CaptureWindow>>> {
        Arc::clone(&self.windows)
    }
}

#[async_trait(?Send)]
impl Listener for ScriptedListener {
    async fn wait_for_wake_word(
        &mut self,
        cancel: &CancellationToken,
    ) -> alpha_assistant::Result<Wake> {
        if cancel.is_cancelled() {
            return Ok(Wake::Cancelled);
        }
        Ok(self.wakes.pop_front().unwrap_or(Wake::Closed))
    }

    async fn capture(&mut self, window: CaptureWindow, cancel: &CancellationToken) -> Capture {
        self.windows.lock().unwrap().push(window);
        if cancel.is_cancelled() {
            return Capture::Cancelled;
        }
        self.captures.pop_front().unwrap_or(Capture::Silence)
    }
}

/// Speaker that records every line
pub struct RecordingSpeaker {
    spoken: Spoken,
}

#[async_trait(?Send)]
impl Speaker for RecordingSpeaker {
    async fn speak(&mut self, text: &str) -> alpha_assistant::Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Feedback wired to a recording speaker and no display
pub fn recording_feedback() -> (Feedback, Spoken) {
    let spoken: Spoken = Arc::new(Mutex::new(Vec::new()));
    let speaker = RecordingSpeaker {
        spoken: Arc::clone(&spoken),
    };
    (Feedback::new(Box::new(speaker), StatusSender::detached()), spoken)
}

pub fn spoken_lines(spoken: &Spoken) -> Vec<String> {
    spoken.lock().unwrap().clone()
}

/// Executor that records each call and fails the operations it is told to
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
    failing: HashSet<&'static str>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make one operation (`launch_app`, `power_action`, ...) fail
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str, detail: String) -> Outcome {
        self.calls.lock().unwrap().push(format!("{operation}:{detail}"));
        if self.failing.contains(operation) {
            Outcome::failed(format!("{operation} failed"))
        } else {
            Outcome::ok()
        }
    }
}

#[async_trait]
impl PlatformExecutor for RecordingExecutor {
    fn name(&self) -> &str {
        "recording"
    }

    async fn launch_app(&self, app: &str) -> Outcome {
        self.record("launch_app", app.to_string())
    }

    async fn close_app(&self, app: &str) -> Outcome {
        self.record("close_app", app.to_string())
    }

    async fn power_action(&self, action: PowerAction) -> Outcome {
        self.record("power_action", action.as_str().to_string())
    }

    async fn set_volume(&self, change: VolumeChange) -> Outcome {
        self.record("set_volume", format!("{change:?}"))
    }

    async fn window_gesture(&self, gesture: WindowGesture) -> Outcome {
        self.record("window_gesture", format!("{gesture:?}"))
    }

    async fn open_url(&self, url: &str) -> Outcome {
        self.record("open_url", url.to_string())
    }
}

/// Classifier with fixed answers; anything else is `unknown`
#[derive(Default)]
pub struct CannedClassifier {
    answers: HashMap<String, Intent>,
    seen: Mutex<Vec<String>>,
}

impl CannedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, utterance: &str, intent: Intent) -> Self {
        self.answers.insert(utterance.to_string(), intent);
        self
    }

    /// Utterances classified so far
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for CannedClassifier {
    async fn classify(&self, text: &str) -> Intent {
        self.seen.lock().unwrap().push(text.to_string());
        self.answers
            .get(text)
            .cloned()
            .unwrap_or_else(|| Intent::unknown("Command not recognized.", text))
    }
}

/// Action settings rooted in a scratch directory
pub fn test_actions(dir: &Path) -> ActionConfig {
    let mut actions = ActionConfig::with_data_dir(dir);
    actions.files_dir = dir.to_path_buf();
    actions
}

pub fn test_conversation() -> ConversationConfig {
    ConversationConfig::default()
}

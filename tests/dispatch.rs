//! Action dispatch integration tests
//!
//! Each test runs one intent through the dispatcher against a recording
//! executor and a scratch directory

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Map;
use tokio_util::sync::CancellationToken;

use alpha_assistant::config::{ActionConfig, CaptureWindow};
use alpha_assistant::intent::{ActionKind, Intent};
use alpha_assistant::voice::Capture;
use alpha_assistant::{ActionResult, DispatchContext, Dispatcher};

mod common;
use common::{RecordingExecutor, ScriptedListener, recording_feedback, test_actions};

struct Run {
    result: ActionResult,
    spoken: Vec<String>,
}

async fn dispatch_with(
    executor: &Arc<RecordingExecutor>,
    actions: ActionConfig,
    listener: ScriptedListener,
    intent: &Intent,
    utterance: &str,
) -> Run {
    let dispatcher = Dispatcher::new(Arc::clone(executor) as _, actions, CaptureWindow::SHORT);
    let mut listener = listener;
    let (mut feedback, spoken) = recording_feedback();
    let cancel = CancellationToken::new();

    let mut ctx = DispatchContext {
        listener: &mut listener,
        feedback: &mut feedback,
        cancel: &cancel,
        allow_followup: true,
    };
    let result = dispatcher.dispatch(intent, utterance, &mut ctx).await;

    let spoken = spoken.lock().unwrap().clone();
    Run { result, spoken }
}

async fn dispatch(dir: &Path, executor: &Arc<RecordingExecutor>, intent: &Intent) -> Run {
    dispatch_with(executor, test_actions(dir), ScriptedListener::new(), intent, "").await
}

fn intent(kind: ActionKind) -> Intent {
    Intent::new(kind, Map::new())
}

#[tokio::test]
async fn append_creates_then_extends_note() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let add = |item: &str| {
        intent(ActionKind::FileIo)
            .with_param("operation", "append")
            .with_param("file_name", "list")
            .with_param("content", item)
    };

    let run = dispatch(dir.path(), &executor, &add("milk")).await;
    assert_eq!(run.result, ActionResult::done());
    assert_eq!(run.spoken, vec!["Successfully added milk to list.txt."]);
    assert_eq!(fs::read_to_string(dir.path().join("list.txt")).unwrap(), "milk");

    dispatch(dir.path(), &executor, &add("eggs")).await;
    assert_eq!(
        fs::read_to_string(dir.path().join("list.txt")).unwrap(),
        "milk\neggs"
    );
}

#[tokio::test]
async fn unsupported_file_operation_is_spoken() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::FileIo)
            .with_param("operation", "rename")
            .with_param("file_name", "list"),
    )
    .await;

    assert_eq!(run.result, ActionResult::failed());
    assert_eq!(run.spoken, vec!["The file operation 'rename' is not supported."]);
}

#[tokio::test]
async fn failed_power_action_names_the_command() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new().failing("power_action"));
    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::SystemControl).with_param("command", "shutdown"),
    )
    .await;

    assert_eq!(run.result, ActionResult::failed());
    assert_eq!(
        run.spoken,
        vec!["Sorry, the system control command 'shutdown' failed."]
    );
}

#[tokio::test]
async fn unrecognized_power_command_never_reaches_executor() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::SystemControl).with_param("command", "self destruct"),
    )
    .await;

    assert!(!run.result.succeeded);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn lock_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::SystemControl).with_param("command", "lock"),
    )
    .await;

    assert_eq!(executor.calls(), vec!["power_action:lock"]);
    assert_eq!(run.spoken, vec!["System locked."]);
}

#[tokio::test]
async fn knowledge_reply_saved_on_yes() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let answer = intent(ActionKind::KnowledgeReply).with_param("answer", "Paris.");

    let run = dispatch_with(
        &executor,
        test_actions(dir.path()),
        ScriptedListener::new().hear("yes please"),
        &answer,
        "what is the capital of france",
    )
    .await;

    assert_eq!(run.result, ActionResult::done());
    assert_eq!(run.spoken[0], "Paris.");
    assert_eq!(run.spoken.last().unwrap(), "Saved the response to my memory.");

    let log = fs::read_to_string(dir.path().join("responses.txt")).unwrap();
    assert!(log.contains("Question: what is the capital of france"));
    assert!(log.contains("\nParis.\n"));
}

#[tokio::test]
async fn knowledge_reply_asks_again_after_silence() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let answer = intent(ActionKind::KnowledgeReply).with_param("answer", "Paris.");

    let run = dispatch_with(
        &executor,
        test_actions(dir.path()),
        ScriptedListener::new().then(Capture::Silence).hear("yes"),
        &answer,
        "capital of france",
    )
    .await;

    assert!(run.spoken.contains(
        &"I didn't catch that. Do you want me to save it? Say yes or no.".to_string()
    ));
    assert!(dir.path().join("responses.txt").exists());
}

#[tokio::test]
async fn knowledge_reply_not_saved_on_no_or_silence() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let answer = intent(ActionKind::KnowledgeReply).with_param("answer", "Paris.");

    let run = dispatch_with(
        &executor,
        test_actions(dir.path()),
        ScriptedListener::new().hear("no, don't save"),
        &answer,
        "capital of france",
    )
    .await;
    assert_eq!(run.spoken.last().unwrap(), "Okay, I won't save it.");

    // Both listens silent
    let run = dispatch_with(
        &executor,
        test_actions(dir.path()),
        ScriptedListener::new(),
        &answer,
        "capital of france",
    )
    .await;
    assert_eq!(run.spoken.last().unwrap(), "Okay, I won't save it.");
    assert!(!dir.path().join("responses.txt").exists());
}

#[tokio::test]
async fn web_search_uses_requested_or_default_engine() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());

    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::WebSearch)
            .with_param("query", "rust async")
            .with_param("engine", "duckduckgo"),
    )
    .await;
    assert_eq!(run.spoken, vec!["Searching DuckDuckGo for: rust async"]);

    dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::WebSearch).with_param("query", "tokio"),
    )
    .await;

    assert_eq!(
        executor.calls(),
        vec![
            "open_url:https://duckduckgo.com/?q=rust+async",
            "open_url:https://www.google.com/search?q=tokio",
        ]
    );
}

#[tokio::test]
async fn website_gets_scheme_and_browser_failure_is_spoken() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new().failing("open_url"));
    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::OpenWebsite).with_param("url", "example.com"),
    )
    .await;

    assert_eq!(executor.calls(), vec!["open_url:https://example.com"]);
    assert_eq!(run.result, ActionResult::failed());
    assert_eq!(
        run.spoken,
        vec![
            "Opening https://example.com",
            "Sorry, I couldn't open the browser."
        ]
    );
}

#[tokio::test]
async fn volume_operations() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());

    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::VolumeControl)
            .with_param("operation", "set")
            .with_param("value", 60),
    )
    .await;
    assert_eq!(run.spoken, vec!["Volume set to 60 percent."]);

    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::VolumeControl).with_param("operation", "increase"),
    )
    .await;
    assert_eq!(run.spoken, vec!["Volume increased by 10 percent."]);

    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::VolumeControl).with_param("operation", "set"),
    )
    .await;
    assert_eq!(run.spoken, vec!["I need a volume level to set."]);

    assert_eq!(
        executor.calls(),
        vec!["set_volume:Set(60)", "set_volume:Increase(10)"]
    );
}

#[tokio::test]
async fn close_failure_is_spoken() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new().failing("close_app"));
    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::CloseApplication).with_param("app_name", "spotify"),
    )
    .await;

    assert_eq!(
        run.spoken,
        vec![
            "Attempting to close spotify.",
            "Sorry, I couldn't close the application or it wasn't running: spotify."
        ]
    );
}

#[tokio::test]
async fn missing_parameters_prompt_without_executing() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());

    let run = dispatch(dir.path(), &executor, &intent(ActionKind::OpenApplication)).await;
    assert_eq!(run.spoken, vec!["I need an application name to open."]);

    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::WindowControl).with_param("command", "shrink"),
    )
    .await;
    assert_eq!(run.spoken, vec!["Unknown window control command: shrink"]);

    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn low_confidence_becomes_unknown_when_gated() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let mut actions = test_actions(dir.path());
    actions.min_confidence = 0.5;

    let guess = intent(ActionKind::OpenApplication)
        .with_param("app_name", "chrome")
        .with_confidence(0.2);
    let run = dispatch_with(&executor, actions, ScriptedListener::new(), &guess, "blorp").await;

    assert!(executor.calls().is_empty());
    assert_eq!(
        run.spoken,
        vec!["I'm sorry, I didn't understand the command. The NLU reason was: low confidence"]
    );
}

#[tokio::test]
async fn unknown_with_cue_requests_relisten() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let vague = Intent::unknown("ambiguous", "tell me about");

    let run = dispatch_with(
        &executor,
        test_actions(dir.path()),
        ScriptedListener::new(),
        &vague,
        "tell me about",
    )
    .await;

    assert_eq!(run.result, ActionResult::relisten());
    assert_eq!(run.spoken, vec!["What do you want me to explain about?"]);
}

#[tokio::test]
async fn window_gesture_runs_and_is_confirmed() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::WindowControl).with_param("command", "Minimize"),
    )
    .await;

    assert_eq!(run.result, ActionResult::done());
    assert_eq!(executor.calls(), vec!["window_gesture:Minimize"]);
    assert_eq!(run.spoken, vec!["Window minimized."]);
}

#[tokio::test]
async fn youtube_search_opens_results_page() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let run = dispatch(
        dir.path(),
        &executor,
        &intent(ActionKind::YoutubeSearch).with_param("query", "rust & tokio"),
    )
    .await;

    assert_eq!(run.result, ActionResult::done());
    assert_eq!(run.spoken, vec!["Searching YouTube for: rust & tokio"]);
    assert_eq!(
        executor.calls(),
        vec!["open_url:https://www.youtube.com/results?search_query=rust+%26+tokio"]
    );
}

#[tokio::test]
async fn response_log_failure_is_spoken() {
    let dir = tempfile::tempdir().unwrap();
    let executor = Arc::new(RecordingExecutor::new());

    // A regular file where the log's directory should be
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let mut actions = test_actions(dir.path());
    actions.responses_path = blocker.join("responses.txt");

    let run = dispatch_with(
        &executor,
        actions,
        ScriptedListener::new().hear("yes"),
        &intent(ActionKind::KnowledgeReply).with_param("answer", "Paris."),
        "capital of france",
    )
    .await;

    assert_eq!(run.result, ActionResult::done());
    assert_eq!(
        run.spoken.last().unwrap(),
        "Sorry, I couldn't save the response due to an error."
    );
}

#[tokio::test]
async fn file_paths_cannot_leave_files_dir() {
    let outer = tempfile::tempdir().unwrap();
    let files = outer.path().join("files");
    fs::create_dir(&files).unwrap();
    let executor = Arc::new(RecordingExecutor::new());

    let run = dispatch(
        &files,
        &executor,
        &intent(ActionKind::FileIo)
            .with_param("operation", "create")
            .with_param("file_name", "../outside")
            .with_param("content", "x"),
    )
    .await;

    assert_eq!(run.result, ActionResult::failed());
    assert_eq!(
        run.spoken,
        vec!["Sorry, I can only work with files inside my files folder, not '../outside'."]
    );
    assert!(!outer.path().join("outside.txt").exists());
}

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use alpha_assistant::config::file::config_file_path;
use alpha_assistant::config::{LOG_FILE_NAME, data_dir_from};
use alpha_assistant::display::run_console_display;
use alpha_assistant::platform::{self, DryRunExecutor};
use alpha_assistant::voice::{
    AudioCapture, AudioPlayback, ConsoleListener, ConsoleSpeaker, DetectorState, Listener,
    MicListener, POLL_INTERVAL, Pcm, SAMPLE_RATE, Speaker, SpeechToText, TextToSpeech,
    VoiceSpeaker, WakeWordDetector, rms_energy,
};
use alpha_assistant::{
    Config, ConversationLoop, Dispatcher, Feedback, GeminiClassifier, IntentClassifier,
    PlatformExecutor, status_channel,
};

/// Alpha - wake-word voice assistant for the desktop
#[derive(Parser)]
#[command(name = "alpha", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Read commands from stdin and print replies instead of using audio
    #[arg(long, env = "ALPHA_TEXT_MODE")]
    text: bool,

    /// Log actions instead of executing them
    #[arg(long)]
    dry_run: bool,

    /// Override the configured wake phrase
    #[arg(short, long)]
    wake_word: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a command and print the resulting intent
    Classify {
        /// Command text, as it would be transcribed
        text: String,
    },
    /// Show microphone levels and detected speech
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Play a chime on the default output device
    TestSpeaker,
    /// Speak text through the configured TTS provider
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Print where the config file is read from
    ConfigPath,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,alpha_assistant=info",
        1 => "info,alpha_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    let log_path = data_dir_from(|key| std::env::var(key).ok()).join(LOG_FILE_NAME);

    // Console output plus a plain-text copy in the data directory
    let (file_layer, log_error) = match open_log_file(&log_path) {
        Ok(file) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(e) = log_error {
        tracing::warn!(path = %log_path.display(), error = %e, "log file unavailable");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Open the log for appending, creating its directory first
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Classify { text } => classify(&text).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&text).await,
            Command::ConfigPath => {
                match config_file_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("no config directory on this platform"),
                }
                Ok(())
            }
        };
    }

    let mut config = Config::load_with_options(cli.text);
    if let Some(wake_word) = cli.wake_word {
        config.wake_words = vec![wake_word.trim().to_lowercase()];
    }
    tracing::debug!(?config, "loaded configuration");

    tracing::info!(
        wake_words = ?config.wake_words,
        voice = config.voice.enabled,
        dry_run = cli.dry_run,
        "starting alpha"
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received");
                cancel.cancel();
            }
        });
    }

    let (status_tx, status_rx) = status_channel();
    let display = tokio::spawn(run_console_display(status_rx));

    let (listener, speaker) = build_io(&config);
    let executor: Arc<dyn PlatformExecutor> = if cli.dry_run {
        Arc::new(DryRunExecutor)
    } else {
        platform::native()
    };
    tracing::info!(executor = executor.name(), "platform executor ready");

    let classifier: Arc<dyn IntentClassifier> = Arc::new(GeminiClassifier::new(
        config.api_keys.gemini.clone(),
        config.nlu.model.clone(),
        config.nlu.timeout,
    ));
    let dispatcher = Dispatcher::new(
        executor,
        config.actions.clone(),
        config.conversation.short_window,
    );
    let feedback = Feedback::new(speaker, status_tx);

    let wake_word = config
        .wake_words
        .first()
        .cloned()
        .unwrap_or_else(|| alpha_assistant::config::DEFAULT_WAKE_WORD.to_string());

    let mut conversation = ConversationLoop::new(
        listener,
        classifier,
        dispatcher,
        feedback,
        config.conversation.clone(),
    )
    .with_wake_word(wake_word)
    .with_listening_prompt(config.listening_prompt.clone());

    let result = conversation.run(&cancel).await;

    // Closes the status channel so the display drains and exits
    drop(conversation);
    let _ = display.await;

    result.map_err(Into::into)
}

/// Microphone and TTS when voice works, console otherwise
fn build_io(config: &Config) -> (Box<dyn Listener>, Box<dyn Speaker>) {
    let console = || -> (Box<dyn Listener>, Box<dyn Speaker>) {
        (
            Box::new(ConsoleListener::stdin(config.wake_words.clone())),
            Box::new(ConsoleSpeaker),
        )
    };

    if !config.voice.enabled {
        tracing::info!("text mode, reading commands from stdin");
        return console();
    }

    match build_voice_io(config) {
        Ok(io) => io,
        Err(e) => {
            tracing::warn!(error = %e, "voice unavailable, falling back to text mode");
            console()
        }
    }
}

fn build_voice_io(
    config: &Config,
) -> alpha_assistant::Result<(Box<dyn Listener>, Box<dyn Speaker>)> {
    let detector = WakeWordDetector::new(config.wake_words.clone())?;
    let stt = SpeechToText::from_config(&config.voice, &config.api_keys)?;
    let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;

    let speaker = VoiceSpeaker::new(tts)?;
    let listener = MicListener::new(detector, stt)?;
    Ok((Box::new(listener), Box::new(speaker)))
}

/// Classify one command and print the intent as JSON
async fn classify(text: &str) -> anyhow::Result<()> {
    let config = Config::load();
    let classifier = GeminiClassifier::new(
        config.api_keys.gemini.clone(),
        config.nlu.model.clone(),
        config.nlu.timeout,
    );

    let intent = classifier.classify(text).await;
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}

/// Show input levels and whether the detector would hear speech
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    let mut capture = AudioCapture::new()?;
    let mut detector = WakeWordDetector::new(vec!["test".to_string()])?;
    capture.start()?;

    println!("Listening for {duration}s at {SAMPLE_RATE} Hz; say something.");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(duration);
    let mut loudest = 0.0f32;
    let mut segments = 0u32;

    while tokio::time::Instant::now() < deadline {
        tokio::time::sleep(POLL_INTERVAL * 3).await;

        let samples = capture.take_buffer();
        let level = rms_energy(&samples);
        loudest = loudest.max(level);

        if detector.process(&samples) {
            segments += 1;
            detector.reset();
        }
        let speaking = detector.state() == DetectorState::Listening;

        println!("{} {level:.4}{}", level_bar(level), if speaking { "  (speech)" } else { "" });
    }

    capture.stop();

    println!("Loudest level {loudest:.4}, {segments} speech segment(s) detected.");
    if segments == 0 {
        println!("No speech was detected. Check the default input device and its gain.");
    }
    Ok(())
}

/// Fixed-width text meter for an RMS level
fn level_bar(level: f32) -> String {
    const WIDTH: usize = 40;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    let filled = ((level * 4.0).min(1.0) * WIDTH as f32) as usize;
    format!("|{}{}|", "#".repeat(filled), ".".repeat(WIDTH - filled))
}

/// Play a three-note chime through the resampling playback path
#[allow(clippy::future_not_send)]
async fn test_speaker() -> anyhow::Result<()> {
    const RATE: u32 = 22_050;
    const NOTES: [f32; 3] = [523.25, 659.25, 783.99];
    const NOTE_SECS: f32 = 0.4;

    let mut playback = AudioPlayback::new()?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let note_len = (RATE as f32 * NOTE_SECS) as usize;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = NOTES
        .iter()
        .flat_map(|&freq| {
            (0..note_len).map(move |i| {
                let t = i as f32 / RATE as f32;
                // Short fade keeps note edges from clicking
                let fade = (1.0 - t / NOTE_SECS).min(t * 50.0).clamp(0.0, 1.0);
                (std::f32::consts::TAU * freq * t).sin() * 0.25 * fade
            })
        })
        .collect();

    println!("Playing a rising chime ({RATE} Hz source)...");
    playback
        .play(Pcm {
            samples,
            sample_rate: RATE,
        })
        .await?;
    println!("Done. Three rising notes means output and resampling both work.");

    Ok(())
}

/// Speak `text` the way the assistant would
#[allow(clippy::future_not_send)]
async fn test_tts(text: &str) -> anyhow::Result<()> {
    let config = Config::load();
    let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;
    let provider = tts.provider();
    let mut speaker = VoiceSpeaker::new(tts)?;

    let started = std::time::Instant::now();
    speaker.speak(text).await?;
    println!(
        "Spoke {} characters via {provider:?} in {:.1}s.",
        text.chars().count(),
        started.elapsed().as_secs_f32()
    );

    Ok(())
}

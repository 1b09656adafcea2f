//! Text-mode listener and speaker (stdin/stdout)

use std::io::BufRead;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::listener::{Capture, Listener, Speaker, Wake, until_cancelled};
use super::wake_word::strip_wake_word;
use crate::Result;
use crate::config::CaptureWindow;

/// Lines read ahead of the conversation loop
const LINE_QUEUE: usize = 16;

/// Reads utterances line by line
///
/// A line containing a wake phrase is treated like speech after the wake
/// word; any other non-empty line is taken as a command directly so the
/// phrase doesn't have to be typed every time.
///
/// Lines arrive over a channel fed by a reader task, so a pending read
/// never holds up cancellation or shutdown.
pub struct ConsoleListener {
    lines: mpsc::Receiver<String>,
    wake_words: Vec<String>,
}

impl ConsoleListener {
    /// Listener over the process's stdin
    ///
    /// Stdin is read on its own OS thread; a blocked read there is simply
    /// abandoned when the process exits.
    #[must_use]
    pub fn stdin(wake_words: Vec<String>) -> Self {
        let (tx, rx) = mpsc::channel(LINE_QUEUE);

        let spawned = std::thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.blocking_send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to read stdin");
                            break;
                        }
                    }
                }
            });

        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to start stdin reader");
        }

        Self::from_channel(rx, wake_words)
    }

    /// Listener over any async line source; must be called inside a runtime
    #[must_use]
    pub fn new<R>(reader: R, wake_words: Vec<String>) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_QUEUE);

        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read console input");
                        break;
                    }
                }
            }
        });

        Self::from_channel(rx, wake_words)
    }

    /// Listener over lines already in flight
    #[must_use]
    pub const fn from_channel(lines: mpsc::Receiver<String>, wake_words: Vec<String>) -> Self {
        Self { lines, wake_words }
    }

    /// `None` on cancellation, `Some(None)` at end of input
    async fn next_line(&mut self, cancel: &CancellationToken) -> Option<Option<String>> {
        until_cancelled(cancel, self.lines.recv()).await
    }
}

#[async_trait(?Send)]
impl Listener for ConsoleListener {
    async fn wait_for_wake_word(&mut self, cancel: &CancellationToken) -> Result<Wake> {
        let Some(line) = self.next_line(cancel).await else {
            return Ok(Wake::Cancelled);
        };
        let Some(line) = line else {
            return Ok(Wake::Closed);
        };

        let line = line.trim();
        let command = self
            .wake_words
            .iter()
            .find_map(|w| strip_wake_word(line, w))
            .unwrap_or_else(|| line.to_string());

        let trailing = (!command.is_empty()).then_some(command);
        Ok(Wake::Detected { trailing })
    }

    async fn capture(&mut self, window: CaptureWindow, cancel: &CancellationToken) -> Capture {
        let Ok(line) = tokio::time::timeout(window.timeout, self.next_line(cancel)).await else {
            tracing::debug!(timeout = ?window.timeout, "no console input within window");
            return Capture::Silence;
        };

        match line {
            None => Capture::Cancelled,
            Some(None) => Capture::Silence,
            Some(Some(line)) if line.trim().is_empty() => Capture::Silence,
            Some(Some(line)) => Capture::Heard(line.trim().to_string()),
        }
    }
}

/// Prints what would be spoken
#[derive(Debug, Default)]
pub struct ConsoleSpeaker;

#[async_trait(?Send)]
impl Speaker for ConsoleSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        println!("Alpha: {text}");
        Ok(())
    }
}

//! Console presentation surface
//!
//! Renders [`StatusEvent`]s to stderr so they don't interleave with text
//! mode's stdout. Runs as its own task and never touches conversation state.

use std::io::Write;

use tokio::sync::mpsc;

use crate::feedback::StatusEvent;

/// Renders status events as terminal lines
pub struct ConsoleDisplay<W> {
    out: W,
    listening: bool,
}

impl<W: Write> ConsoleDisplay<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out,
            listening: false,
        }
    }

    /// Render one event
    ///
    /// # Errors
    ///
    /// Returns error if the writer fails
    pub fn render(&mut self, event: &StatusEvent) -> std::io::Result<()> {
        let indicator = if self.listening { "●" } else { "○" };
        match event {
            StatusEvent::Status(text) => writeln!(self.out, "{indicator} {text}"),
            StatusEvent::Log(text) => writeln!(self.out, "  {text}"),
            StatusEvent::Listening(listening) => {
                if *listening == self.listening {
                    return Ok(());
                }
                self.listening = *listening;
                let label = if *listening { "● listening" } else { "○ idle" };
                writeln!(self.out, "{label}")
            }
        }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Drain the presentation channel until every sender is dropped
pub async fn run_console_display(mut rx: mpsc::UnboundedReceiver<StatusEvent>) {
    let mut display = ConsoleDisplay::new(std::io::stderr());
    while let Some(event) = rx.recv().await {
        if let Err(e) = display.render(&event) {
            tracing::debug!(error = %e, "display write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_status_with_indicator() {
        let mut display = ConsoleDisplay::new(Vec::new());
        display.render(&StatusEvent::Status("Idle".to_string())).unwrap();
        display.render(&StatusEvent::Listening(true)).unwrap();
        display
            .render(&StatusEvent::Status("Listening for command".to_string()))
            .unwrap();
        display.render(&StatusEvent::Log("User: open chrome".to_string())).unwrap();

        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(
            out,
            "○ Idle\n● listening\n● Listening for command\n  User: open chrome\n"
        );
    }

    #[test]
    fn repeated_listening_state_is_not_rerendered() {
        let mut display = ConsoleDisplay::new(Vec::new());
        display.render(&StatusEvent::Listening(false)).unwrap();
        assert!(display.into_inner().is_empty());
    }
}

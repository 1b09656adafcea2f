//! Context cues for clarifying an unrecognized command
//!
//! Checked in a fixed order; the first cue that matches decides the
//! single clarifying question asked.

use std::sync::LazyLock;

use regex::Regex;

static EXPLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(explain|tell me about)\b").expect("valid regex"));

static PLAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bplay\b").expect("valid regex"));

static OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(open|go to|launch)\b").expect("valid regex"));

/// What kind of request a vague command looked like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Explain,
    Play,
    Open,
}

impl Cue {
    /// The clarifying question for this cue
    #[must_use]
    pub const fn question(self) -> &'static str {
        match self {
            Self::Explain => "What do you want me to explain about?",
            Self::Play => "What song or video should I play?",
            Self::Open => "What application or website do you want me to open?",
        }
    }
}

/// Find the highest-priority cue in `command`
#[must_use]
pub fn detect_cue(command: &str) -> Option<Cue> {
    [(Cue::Explain, &*EXPLAIN), (Cue::Play, &*PLAY), (Cue::Open, &*OPEN)]
        .into_iter()
        .find(|(_, re)| re.is_match(command))
        .map(|(cue, _)| cue)
}

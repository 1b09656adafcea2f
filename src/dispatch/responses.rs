//! Append-only log of saved knowledge replies

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::Result;

const ENTRY_RULE: &str = "============================================================";
const BODY_RULE: &str = "------------------------------------------------------------";

const AFFIRMATIVE: &[&str] = &["yes", "yeah", "yep", "yup", "sure", "save", "ok", "okay"];
const NEGATIVE: &[&str] = &["no", "nope", "not", "don't", "dont"];

/// Whether a confirmation reply means "yes, save it"
///
/// Any negation wins over an affirmative word ("no, don't save").
#[must_use]
pub fn is_affirmative(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();

    if words.iter().any(|w| NEGATIVE.contains(w)) {
        return false;
    }
    words.iter().any(|w| AFFIRMATIVE.contains(w))
}

/// Render one log entry
#[must_use]
pub fn format_entry(timestamp: &str, question: &str, answer: &str) -> String {
    format!(
        "{ENTRY_RULE}\nSaved: {timestamp}\nQuestion: {question}\n{BODY_RULE}\n{}\n\n",
        answer.trim()
    )
}

/// Append-only UTF-8 response log
#[derive(Debug, Clone)]
pub struct ResponseLog {
    path: PathBuf,
}

impl ResponseLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a timestamped entry, creating the file and its directory
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written
    pub fn append(&self, question: &str, answer: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let entry = format_entry(&timestamp, question, answer);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;

        tracing::info!(path = %self.path.display(), "saved response");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_words() {
        assert!(is_affirmative("Yes"));
        assert!(is_affirmative("yeah sure!"));
        assert!(is_affirmative("please save it"));
        assert!(is_affirmative("OK."));
    }

    #[test]
    fn negations_and_others_are_not_affirmative() {
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("no, don't save"));
        assert!(!is_affirmative("maybe later"));
        assert!(!is_affirmative(""));
        // Substrings don't count
        assert!(!is_affirmative("yesterday"));
    }

    #[test]
    fn entry_layout() {
        let entry = format_entry("2024-05-01 09:30:00", "what is rust", "  A language.  ");
        let lines: Vec<&str> = entry.split('\n').collect();
        assert_eq!(lines[0].len(), 60);
        assert!(lines[0].chars().all(|c| c == '='));
        assert_eq!(lines[1], "Saved: 2024-05-01 09:30:00");
        assert_eq!(lines[2], "Question: what is rust");
        assert_eq!(lines[3].len(), 60);
        assert!(lines[3].chars().all(|c| c == '-'));
        assert_eq!(lines[4], "A language.");
        assert_eq!(&entry[entry.len() - 2..], "\n\n");
    }

    #[test]
    fn append_accumulates_entries() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResponseLog::new(dir.path().join("nested").join("responses.txt"));

        log.append("q1", "a1").unwrap();
        log.append("q2", "a2").unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches("Saved: ").count(), 2);
        assert!(content.find("Question: q1").unwrap() < content.find("Question: q2").unwrap());
    }
}

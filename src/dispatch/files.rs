//! Notes and file operations
//!
//! Names resolve against a base directory and must stay inside it: absolute
//! paths and `..` components are refused. For note operations,
//! bare names without an extension get the default one unless they name an
//! existing directory, so "shopping list" and "shopping list.txt" address
//! the same note. Listing takes directory names as given.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

/// A filesystem operation requested by voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Create,
    Append,
    Read,
    Delete,
    List,
}

impl FileOperation {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "create" | "write" => Some(Self::Create),
            "append" | "add" => Some(Self::Append),
            "read" => Some(Self::Read),
            "delete" | "remove" => Some(Self::Delete),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Append => "append",
            Self::Read => "read",
            Self::Delete => "delete",
            Self::List => "list",
        }
    }
}

/// What to say after a file operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReply {
    pub message: String,
    pub succeeded: bool,
}

impl FileReply {
    fn ok(message: String) -> Self {
        Self {
            message,
            succeeded: true,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            message,
            succeeded: false,
        }
    }
}

/// File operations rooted at a base directory
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
    default_extension: String,
    read_budget: usize,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>, default_extension: &str, read_budget: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            default_extension: default_extension.trim_start_matches('.').to_string(),
            read_budget,
        }
    }

    /// Resolve a spoken file name to a path
    ///
    /// Idempotent: resolving the result's file name again yields the same path.
    #[must_use]
    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = self.base_dir.join(name.trim());
        if path.extension().is_some() || path.is_dir() || self.default_extension.is_empty() {
            return path;
        }
        let mut with_ext = path.into_os_string();
        with_ext.push(".");
        with_ext.push(&self.default_extension);
        PathBuf::from(with_ext)
    }

    /// Run `operation`, turning every outcome into a spoken reply
    #[must_use]
    pub fn perform(
        &self,
        operation: FileOperation,
        file_name: Option<&str>,
        content: Option<&str>,
    ) -> FileReply {
        if let Some(name) = file_name.filter(|name| !is_contained(name)) {
            tracing::warn!(
                operation = operation.as_str(),
                name,
                "refusing path outside the files directory"
            );
            return FileReply::failed(format!(
                "Sorry, I can only work with files inside my files folder, not '{}'.",
                name.trim()
            ));
        }

        let path = match (operation, file_name) {
            (FileOperation::List, None) => self.base_dir.clone(),
            (FileOperation::List, Some(name)) => self.base_dir.join(name.trim()),
            (_, Some(name)) => self.resolve(name),
            (op, None) => {
                return FileReply::failed(format!(
                    "Please specify a file name for the '{}' operation.",
                    op.as_str()
                ));
            }
        };
        let shown = self.display_name(&path);
        let content = content.unwrap_or_default();

        let result = match operation {
            FileOperation::Create => create(&path, content)
                .map(|()| format!("Successfully created or overwritten file {shown}.")),
            FileOperation::Append => append(&path, content)
                .map(|()| format!("Successfully added {content} to {shown}.")),
            FileOperation::Read => fs::read_to_string(&path).map(|text| {
                if text.is_empty() {
                    format!("File {shown} is empty.")
                } else {
                    format!("The content of {shown} is: {}", self.truncate(&text))
                }
            }),
            FileOperation::Delete => fs::remove_file(&path)
                .map(|()| format!("File {shown} has been permanently deleted.")),
            FileOperation::List => list(&path).map(|items| {
                if items.is_empty() {
                    format!("The directory {shown} is empty or doesn't exist.")
                } else {
                    format!("The contents of {shown} are: {}", items.join(", "))
                }
            }),
        };

        match result {
            Ok(message) => {
                tracing::info!(operation = operation.as_str(), path = %path.display(), "file operation complete");
                FileReply::ok(message)
            }
            Err(e) => {
                tracing::warn!(
                    operation = operation.as_str(),
                    path = %path.display(),
                    error = %e,
                    "file operation failed"
                );
                FileReply::failed(describe_error(&e, &shown))
            }
        }
    }

    /// Path as spoken back: relative to the base directory when possible
    fn display_name(&self, path: &Path) -> String {
        match path.strip_prefix(&self.base_dir) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
            _ => path.display().to_string(),
        }
    }

    fn truncate(&self, text: &str) -> String {
        if text.chars().count() <= self.read_budget {
            return text.to_string();
        }
        let mut shown: String = text.chars().take(self.read_budget).collect();
        shown.push_str("...");
        shown
    }
}

/// Relative, with no `..` or root components
fn is_contained(name: &str) -> bool {
    Path::new(name.trim())
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn create(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, content)
}

/// Append, separating from existing content with exactly one newline
fn append(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let existing = file.metadata()?.len();
    if existing > 0 && !content.trim().is_empty() {
        file.write_all(b"\n")?;
    }
    file.write_all(content.as_bytes())
}

/// Sorted directory entries, hidden ones skipped
fn list(path: &Path) -> std::io::Result<Vec<String>> {
    let mut items: Vec<String> = fs::read_dir(path)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    items.sort();
    Ok(items)
}

fn describe_error(error: &std::io::Error, shown: &str) -> String {
    match error.kind() {
        ErrorKind::NotFound => format!("Error: The file or directory '{shown}' was not found."),
        ErrorKind::PermissionDenied => {
            format!("Error: I do not have permission to access or modify '{shown}'.")
        }
        ErrorKind::IsADirectory => format!(
            "Error: '{shown}' is a directory. Please use the 'list' operation to view its contents."
        ),
        _ => format!("A general error occurred during the file operation on {shown}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> FileStore {
        FileStore::new(dir, "txt", 200)
    }

    #[test]
    fn bare_names_gain_extension_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let first = store.resolve("list");
        assert_eq!(first, dir.path().join("list.txt"));

        let again = store.resolve(first.file_name().unwrap().to_str().unwrap());
        assert_eq!(again, first);
    }

    #[test]
    fn existing_directories_keep_their_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("documents")).unwrap();
        assert_eq!(store(dir.path()).resolve("documents"), dir.path().join("documents"));
    }

    #[test]
    fn append_separates_with_single_newline() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let reply = store.perform(FileOperation::Append, Some("list"), Some("milk"));
        assert!(reply.succeeded);
        assert_eq!(reply.message, "Successfully added milk to list.txt.");
        assert_eq!(fs::read_to_string(dir.path().join("list.txt")).unwrap(), "milk");

        store.perform(FileOperation::Append, Some("list"), Some("eggs"));
        assert_eq!(
            fs::read_to_string(dir.path().join("list.txt")).unwrap(),
            "milk\neggs"
        );
    }

    #[test]
    fn append_to_empty_file_has_no_separator() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        store.perform(FileOperation::Create, Some("notes"), None);
        store.perform(FileOperation::Append, Some("notes"), Some("first"));
        assert_eq!(
            fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "first"
        );
    }

    #[test]
    fn blank_append_adds_no_newline() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::write(dir.path().join("a.txt"), "x").unwrap();

        store.perform(FileOperation::Append, Some("a"), Some("   "));
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "x   ");
    }

    #[test]
    fn read_truncates_to_budget() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "txt", 5);
        fs::write(dir.path().join("long.txt"), "abcdefgh").unwrap();

        let reply = store.perform(FileOperation::Read, Some("long"), None);
        assert_eq!(reply.message, "The content of long.txt is: abcde...");

        fs::write(dir.path().join("short.txt"), "abc").unwrap();
        let reply = store.perform(FileOperation::Read, Some("short.txt"), None);
        assert_eq!(reply.message, "The content of short.txt is: abc");
    }

    #[test]
    fn read_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.txt"), "").unwrap();
        let reply = store(dir.path()).perform(FileOperation::Read, Some("empty"), None);
        assert_eq!(reply.message, "File empty.txt is empty.");
    }

    #[test]
    fn errors_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::create_dir(dir.path().join("docs")).unwrap();

        let missing = store.perform(FileOperation::Delete, Some("ghost"), None);
        assert!(!missing.succeeded);
        assert_eq!(
            missing.message,
            "Error: The file or directory 'ghost.txt' was not found."
        );

        let is_dir = store.perform(FileOperation::Read, Some("docs"), None);
        assert!(!is_dir.succeeded);
        assert!(is_dir.message.contains("is a directory"), "{}", is_dir.message);
    }

    #[test]
    fn file_name_required_except_for_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let reply = store.perform(FileOperation::Read, None, None);
        assert!(!reply.succeeded);
        assert_eq!(
            reply.message,
            "Please specify a file name for the 'read' operation."
        );

        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        let reply = store.perform(FileOperation::List, None, None);
        assert!(reply.succeeded);
        assert!(reply.message.ends_with("are: a.txt, b.txt"), "{}", reply.message);
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.perform(FileOperation::Create, Some("tmp"), Some("x"));

        let reply = store.perform(FileOperation::Delete, Some("tmp"), None);
        assert_eq!(reply.message, "File tmp.txt has been permanently deleted.");
        assert!(!dir.path().join("tmp.txt").exists());
    }

    #[test]
    fn paths_outside_base_are_refused() {
        let outer = tempfile::tempdir().unwrap();
        let base = outer.path().join("files");
        fs::create_dir(&base).unwrap();
        let store = store(&base);

        let escape = outer.path().join("escaped.txt");
        let absolute = escape.to_string_lossy().into_owned();
        for name in ["../escaped", "notes/../../escaped", absolute.as_str()] {
            let reply = store.perform(FileOperation::Create, Some(name), Some("x"));
            assert!(!reply.succeeded, "{name}");
            assert!(reply.message.starts_with("Sorry, I can only work with files inside"));
        }
        assert!(!escape.exists());

        let listed = store.perform(FileOperation::List, Some(".."), None);
        assert!(!listed.succeeded);

        // Subfolders and `./` stay inside
        fs::create_dir(base.join("work")).unwrap();
        assert!(store.perform(FileOperation::Create, Some("./work/todo"), Some("x")).succeeded);
        assert!(base.join("work/todo.txt").exists());
    }

    #[test]
    fn permission_error_message() {
        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert_eq!(
            describe_error(&denied, "secret.txt"),
            "Error: I do not have permission to access or modify 'secret.txt'."
        );
    }

    #[cfg(unix)]
    #[test]
    fn read_only_directory_reports_permission() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits don't bind a superuser
        let enforced = fs::write(locked.join("check"), "").is_err();

        let reply = store(dir.path()).perform(FileOperation::Create, Some("locked/note"), Some("x"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if enforced {
            assert!(!reply.succeeded);
            assert_eq!(
                reply.message,
                "Error: I do not have permission to access or modify 'locked/note.txt'."
            );
        }
    }
}

//! Platform executor: OS-specific side effects behind one interface
//!
//! The dispatcher only ever talks to [`PlatformExecutor`]. The concrete
//! implementation is picked once at startup by [`native`] (or replaced with
//! [`DryRunExecutor`]), so no handler branches on the operating system.
//!
//! Shell-backed executors are split in two: a [`PlatformCommands`] table
//! that builds [`Invocation`]s without running anything, and
//! [`ShellExecutor`] which runs them. Every command table compiles on every
//! OS so each one can be tested anywhere.

mod dry_run;
mod linux;
mod macos;
mod windows;

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::{Error, Result};

pub use dry_run::DryRunExecutor;
pub use linux::LinuxCommands;
pub use macos::MacCommands;
pub use windows::WindowsCommands;

/// Default timeout for a blocking platform command
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Power or session state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Restart,
    Sleep,
    Lock,
}

impl PowerAction {
    /// Parse a spoken command name
    #[must_use]
    pub fn parse(command: &str) -> Option<Self> {
        match command.trim().to_lowercase().as_str() {
            "shutdown" | "shut down" | "power off" => Some(Self::Shutdown),
            "restart" | "reboot" => Some(Self::Restart),
            "sleep" | "suspend" => Some(Self::Sleep),
            "lock" => Some(Self::Lock),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Restart => "restart",
            Self::Sleep => "sleep",
            Self::Lock => "lock",
        }
    }
}

/// Output volume adjustment; percentages are clamped to 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChange {
    Set(u8),
    Increase(u8),
    Decrease(u8),
    Mute,
    Unmute,
}

/// Gesture sent to the active window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowGesture {
    Minimize,
    Maximize,
}

impl WindowGesture {
    #[must_use]
    pub fn parse(command: &str) -> Option<Self> {
        match command.trim().to_lowercase().as_str() {
            "minimize" | "minimise" => Some(Self::Minimize),
            "maximize" | "maximise" => Some(Self::Maximize),
            _ => None,
        }
    }
}

/// Result of a platform operation
///
/// The core only branches on `success`; `diagnostic` is for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub diagnostic: Option<String>,
}

impl Outcome {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            diagnostic: None,
        }
    }

    #[must_use]
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// Capability interface over OS-specific side effects
#[async_trait]
pub trait PlatformExecutor: Send + Sync {
    /// Short name for logs ("linux", "macos", "dry-run", ...)
    fn name(&self) -> &str;

    /// Launch an application by spoken name
    async fn launch_app(&self, app: &str) -> Outcome;

    /// Terminate a running application by spoken name
    async fn close_app(&self, app: &str) -> Outcome;

    /// Change power or session state
    async fn power_action(&self, action: PowerAction) -> Outcome;

    /// Adjust output volume
    async fn set_volume(&self, change: VolumeChange) -> Outcome;

    /// Minimize or maximize the active window
    async fn window_gesture(&self, gesture: WindowGesture) -> Outcome;

    /// Open a URL in the default handler
    async fn open_url(&self, url: &str) -> Outcome;
}

/// A single process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Spawn and return immediately instead of waiting for exit
    pub detached: bool,
}

impl Invocation {
    /// A command that is waited on and must exit successfully
    pub fn run<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            detached: false,
        }
    }

    /// A command that is spawned and left running
    pub fn spawn<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            detached: true,
            ..Self::run(program, args)
        }
    }
}

/// Per-OS command table; `None` means the operation is unsupported
pub trait PlatformCommands: Send + Sync {
    fn name(&self) -> &'static str;

    /// Map a spoken application name to the platform's program name
    fn resolve_app(&self, app: &str) -> String;

    fn launch_app(&self, program: &str) -> Option<Invocation>;

    fn close_app(&self, program: &str) -> Option<Invocation>;

    fn power_action(&self, action: PowerAction) -> Option<Invocation>;

    fn set_volume(&self, change: VolumeChange) -> Option<Invocation>;

    fn window_gesture(&self, gesture: WindowGesture) -> Option<Invocation>;

    fn open_url(&self, url: &str) -> Option<Invocation>;
}

/// Normalize a spoken app name into an alias-table key
pub(crate) fn alias_key(app: &str) -> String {
    app.trim().to_lowercase().replace(' ', "")
}

/// Runs a [`PlatformCommands`] table as real processes
pub struct ShellExecutor<P> {
    commands: P,
    timeout: Duration,
}

impl<P: PlatformCommands> ShellExecutor<P> {
    pub const fn new(commands: P) -> Self {
        Self {
            commands,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn execute(&self, operation: &str, invocation: Option<Invocation>) -> Outcome {
        let Some(invocation) = invocation else {
            tracing::warn!(
                platform = self.commands.name(),
                operation,
                "operation not supported on this platform"
            );
            return Outcome::failed(format!("{operation} is not supported on {}", self.commands.name()));
        };

        tracing::debug!(
            program = %invocation.program,
            args = ?invocation.args,
            detached = invocation.detached,
            operation,
            "running platform command"
        );

        match run_invocation(&invocation, self.timeout).await {
            Ok(()) => Outcome::ok(),
            Err(e) => {
                tracing::warn!(operation, program = %invocation.program, error = %e, "platform command failed");
                Outcome::failed(e.to_string())
            }
        }
    }
}

async fn run_invocation(invocation: &Invocation, limit: Duration) -> Result<()> {
    let program = &invocation.program;
    let mut command = Command::new(program);
    command.args(&invocation.args).stdin(Stdio::null());

    if invocation.detached {
        command.stdout(Stdio::null()).stderr(Stdio::null());
        command
            .spawn()
            .map_err(|e| Error::Executor(format!("failed to spawn {program}: {e}")))?;
        return Ok(());
    }

    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    let output = timeout(limit, command.output())
        .await
        .map_err(|_| Error::Executor(format!("{program} timed out after {limit:?}")))?
        .map_err(|e| Error::Executor(format!("failed to run {program}: {e}")))?;

    if output.status.success() {
        return Ok(());
    }

    let code = output.status.code().unwrap_or(-1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(Error::Executor(format!(
        "{program} exited with code {code}: {}",
        stderr.trim()
    )))
}

#[async_trait]
impl<P: PlatformCommands> PlatformExecutor for ShellExecutor<P> {
    fn name(&self) -> &str {
        self.commands.name()
    }

    async fn launch_app(&self, app: &str) -> Outcome {
        let program = self.commands.resolve_app(app);
        self.execute("launch_app", self.commands.launch_app(&program))
            .await
    }

    async fn close_app(&self, app: &str) -> Outcome {
        let program = self.commands.resolve_app(app);
        self.execute("close_app", self.commands.close_app(&program))
            .await
    }

    async fn power_action(&self, action: PowerAction) -> Outcome {
        self.execute(action.as_str(), self.commands.power_action(action))
            .await
    }

    async fn set_volume(&self, change: VolumeChange) -> Outcome {
        self.execute("set_volume", self.commands.set_volume(change))
            .await
    }

    async fn window_gesture(&self, gesture: WindowGesture) -> Outcome {
        self.execute("window_gesture", self.commands.window_gesture(gesture))
            .await
    }

    async fn open_url(&self, url: &str) -> Outcome {
        self.execute("open_url", self.commands.open_url(url)).await
    }
}

/// The executor for the OS this binary was built for
#[must_use]
pub fn native() -> Arc<dyn PlatformExecutor> {
    if cfg!(target_os = "macos") {
        Arc::new(ShellExecutor::new(MacCommands))
    } else if cfg!(target_os = "windows") {
        Arc::new(ShellExecutor::new(WindowsCommands))
    } else {
        Arc::new(ShellExecutor::new(LinuxCommands))
    }
}

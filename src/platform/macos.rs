//! macOS command table (`open`, `osascript`, `pmset`)

use super::{Invocation, PlatformCommands, PowerAction, VolumeChange, WindowGesture, alias_key};

const ALIASES: &[(&str, &str)] = &[
    ("vscode", "Visual Studio Code"),
    ("visualstudiocode", "Visual Studio Code"),
    ("code", "Visual Studio Code"),
    ("chrome", "Google Chrome"),
    ("googlechrome", "Google Chrome"),
    ("calculator", "Calculator"),
    ("calc", "Calculator"),
    ("notepad", "TextEdit"),
    ("textedit", "TextEdit"),
    ("terminal", "Terminal"),
    ("cmd", "Terminal"),
    ("finder", "Finder"),
    ("fileexplorer", "Finder"),
    ("spotify", "Spotify"),
    ("safari", "Safari"),
    ("camera", "Photo Booth"),
];

fn osascript(script: impl Into<String>) -> Invocation {
    Invocation::run("osascript", ["-e".to_string(), script.into()])
}

/// Quote text as an AppleScript string literal
fn applescript_string(text: &str) -> String {
    let escaped = text.replace('\\', r"\\").replace('"', r#"\""#);
    format!("\"{escaped}\"")
}

fn keystroke(key: &str, modifiers: &str) -> Invocation {
    osascript(format!(
        r#"tell application "System Events" to keystroke "{key}" using {modifiers}"#
    ))
}

/// Commands for macOS
#[derive(Debug, Clone, Copy, Default)]
pub struct MacCommands;

impl PlatformCommands for MacCommands {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn resolve_app(&self, app: &str) -> String {
        let key = alias_key(app);
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map_or_else(|| app.trim().to_string(), |(_, name)| (*name).to_string())
    }

    fn launch_app(&self, program: &str) -> Option<Invocation> {
        Some(Invocation::run("open", ["-a", program]))
    }

    fn close_app(&self, program: &str) -> Option<Invocation> {
        Some(osascript(format!("quit app {}", applescript_string(program))))
    }

    fn power_action(&self, action: PowerAction) -> Option<Invocation> {
        Some(match action {
            PowerAction::Shutdown => Invocation::run("shutdown", ["-h", "now"]),
            PowerAction::Restart => Invocation::run("shutdown", ["-r", "now"]),
            PowerAction::Sleep => Invocation::run("pmset", ["sleepnow"]),
            PowerAction::Lock => keystroke("q", "{control down, command down}"),
        })
    }

    fn set_volume(&self, change: VolumeChange) -> Option<Invocation> {
        let script = match change {
            VolumeChange::Set(v) => format!("set volume output volume {}", v.min(100)),
            VolumeChange::Increase(step) => format!(
                "set volume output volume ((output volume of (get volume settings)) + {step})"
            ),
            VolumeChange::Decrease(step) => format!(
                "set volume output volume ((output volume of (get volume settings)) - {step})"
            ),
            VolumeChange::Mute => "set volume with output muted".to_string(),
            VolumeChange::Unmute => "set volume without output muted".to_string(),
        };
        Some(osascript(script))
    }

    fn window_gesture(&self, gesture: WindowGesture) -> Option<Invocation> {
        Some(match gesture {
            WindowGesture::Minimize => keystroke("m", "command down"),
            WindowGesture::Maximize => keystroke("f", "{control down, command down}"),
        })
    }

    fn open_url(&self, url: &str) -> Option<Invocation> {
        Some(Invocation::run("open", [url]))
    }
}

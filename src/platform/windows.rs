//! Windows command table (`cmd`, `taskkill`, `shutdown`, `PowerShell`)

use super::{Invocation, PlatformCommands, PowerAction, VolumeChange, WindowGesture, alias_key};

const ALIASES: &[(&str, &str)] = &[
    ("vscode", "code"),
    ("visualstudiocode", "code"),
    ("calculator", "calc"),
    ("chrome", "chrome"),
    ("googlechrome", "chrome"),
    ("notepad", "notepad"),
    ("terminal", "cmd"),
    ("fileexplorer", "explorer"),
    ("files", "explorer"),
    ("word", "winword"),
    ("camera", "microsoft.windows.camera:"),
];

/// Characters `cmd` treats as syntax; names holding any are never launched
const CMD_METACHARACTERS: &[char] = &['&', '|', '^', '<', '>', '%', '!', '"', '(', ')', '\n', '\r'];

/// Each volume key press moves the mixer by two percent
const VOLUME_KEY_STEP: u8 = 2;

fn powershell(script: impl Into<String>) -> Invocation {
    Invocation::run(
        "powershell",
        [
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            script.into(),
        ],
    )
}

fn volume_keys(key: u8, presses: u8) -> Invocation {
    powershell(format!(
        "$w = New-Object -ComObject WScript.Shell; 1..{presses} | ForEach-Object {{ $w.SendKeys([char]{key}) }}"
    ))
}

fn show_window(command: u8) -> Invocation {
    powershell(format!(
        "Add-Type -Name Win -Namespace Alpha -MemberDefinition '\
[DllImport(\"user32.dll\")] public static extern bool ShowWindow(IntPtr h, int c); \
[DllImport(\"user32.dll\")] public static extern IntPtr GetForegroundWindow();'; \
[Alpha.Win]::ShowWindow([Alpha.Win]::GetForegroundWindow(), {command}) | Out-Null"
    ))
}

/// Commands for Windows
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsCommands;

impl PlatformCommands for WindowsCommands {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn resolve_app(&self, app: &str) -> String {
        let key = alias_key(app);
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map_or(key, |(_, program)| (*program).to_string())
    }

    fn launch_app(&self, program: &str) -> Option<Invocation> {
        if program.contains(CMD_METACHARACTERS) {
            tracing::warn!(program, "refusing to launch name with shell metacharacters");
            return None;
        }
        Some(Invocation::run("cmd", ["/C", "start", "", program]))
    }

    fn close_app(&self, program: &str) -> Option<Invocation> {
        let image = if program.to_lowercase().ends_with(".exe") {
            program.to_string()
        } else {
            format!("{program}.exe")
        };
        Some(Invocation::run(
            "taskkill",
            ["/F".to_string(), "/IM".to_string(), image],
        ))
    }

    fn power_action(&self, action: PowerAction) -> Option<Invocation> {
        match action {
            PowerAction::Shutdown => Some(Invocation::run("shutdown", ["/s", "/t", "1"])),
            PowerAction::Restart => Some(Invocation::run("shutdown", ["/r", "/t", "1"])),
            PowerAction::Lock => Some(Invocation::run(
                "rundll32.exe",
                ["user32.dll,LockWorkStation"],
            )),
            // Needs admin rights or a third-party utility
            PowerAction::Sleep => None,
        }
    }

    fn set_volume(&self, change: VolumeChange) -> Option<Invocation> {
        let presses = |step: u8| (step.min(100) / VOLUME_KEY_STEP).max(1);
        match change {
            VolumeChange::Increase(step) => Some(volume_keys(175, presses(step))),
            VolumeChange::Decrease(step) => Some(volume_keys(174, presses(step))),
            VolumeChange::Mute | VolumeChange::Unmute => Some(volume_keys(173, 1)),
            // Key presses are relative; no absolute level without a mixer API
            VolumeChange::Set(_) => None,
        }
    }

    fn window_gesture(&self, gesture: WindowGesture) -> Option<Invocation> {
        Some(match gesture {
            WindowGesture::Minimize => show_window(6),
            WindowGesture::Maximize => show_window(3),
        })
    }

    fn open_url(&self, url: &str) -> Option<Invocation> {
        Some(Invocation::run(
            "rundll32",
            ["url.dll,FileProtocolHandler", url],
        ))
    }
}

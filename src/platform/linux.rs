//! Linux command table (X11/GNOME-flavoured desktop tools)

use super::{Invocation, PlatformCommands, PowerAction, VolumeChange, WindowGesture, alias_key};

const ALIASES: &[(&str, &str)] = &[
    ("vscode", "code"),
    ("visualstudiocode", "code"),
    ("calculator", "gnome-calculator"),
    ("calc", "gnome-calculator"),
    ("chrome", "google-chrome"),
    ("googlechrome", "google-chrome"),
    ("notepad", "gedit"),
    ("texteditor", "gedit"),
    ("terminal", "gnome-terminal"),
    ("cmd", "gnome-terminal"),
    ("files", "nautilus"),
    ("fileexplorer", "nautilus"),
    ("camera", "cheese"),
];

/// Commands for Linux desktops
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxCommands;

impl PlatformCommands for LinuxCommands {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn resolve_app(&self, app: &str) -> String {
        let key = alias_key(app);
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map_or(key, |(_, program)| (*program).to_string())
    }

    fn launch_app(&self, program: &str) -> Option<Invocation> {
        Some(Invocation::spawn(program, Vec::<String>::new()))
    }

    fn close_app(&self, program: &str) -> Option<Invocation> {
        Some(Invocation::run("pkill", ["-f", program]))
    }

    fn power_action(&self, action: PowerAction) -> Option<Invocation> {
        Some(match action {
            PowerAction::Shutdown => Invocation::run("shutdown", ["now"]),
            PowerAction::Restart => Invocation::run("reboot", Vec::<String>::new()),
            PowerAction::Sleep => Invocation::run("systemctl", ["suspend"]),
            PowerAction::Lock => Invocation::run("loginctl", ["lock-session"]),
        })
    }

    fn set_volume(&self, change: VolumeChange) -> Option<Invocation> {
        let level = match change {
            VolumeChange::Set(v) => format!("{}%", v.min(100)),
            VolumeChange::Increase(step) => format!("{}%+", step.min(100)),
            VolumeChange::Decrease(step) => format!("{}%-", step.min(100)),
            VolumeChange::Mute => "mute".to_string(),
            VolumeChange::Unmute => "unmute".to_string(),
        };
        Some(Invocation::run("amixer", ["set".to_string(), "Master".to_string(), level]))
    }

    fn window_gesture(&self, gesture: WindowGesture) -> Option<Invocation> {
        let keys = match gesture {
            WindowGesture::Minimize => "alt+F9",
            WindowGesture::Maximize => "alt+F10",
        };
        Some(Invocation::run("xdotool", ["key", keys]))
    }

    fn open_url(&self, url: &str) -> Option<Invocation> {
        Some(Invocation::spawn("xdg-open", [url]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aliases_and_passes_through_others() {
        let linux = LinuxCommands;
        assert_eq!(linux.resolve_app("VS Code"), "code");
        assert_eq!(linux.resolve_app("Chrome"), "google-chrome");
        assert_eq!(linux.resolve_app("firefox"), "firefox");
    }

    #[test]
    fn launch_is_detached() {
        let inv = LinuxCommands.launch_app("firefox").unwrap();
        assert_eq!(inv.program, "firefox");
        assert!(inv.detached);
    }

    #[test]
    fn close_uses_pkill() {
        let inv = LinuxCommands.close_app("spotify").unwrap();
        assert_eq!(inv.program, "pkill");
        assert_eq!(inv.args, vec!["-f", "spotify"]);
        assert!(!inv.detached);
    }

    #[test]
    fn volume_uses_amixer() {
        let inv = LinuxCommands.set_volume(VolumeChange::Increase(10)).unwrap();
        assert_eq!(inv.args, vec!["set", "Master", "10%+"]);

        let inv = LinuxCommands.set_volume(VolumeChange::Set(150)).unwrap();
        assert_eq!(inv.args, vec!["set", "Master", "100%"]);
    }

    #[test]
    fn every_power_action_is_supported() {
        for action in [
            PowerAction::Shutdown,
            PowerAction::Restart,
            PowerAction::Sleep,
            PowerAction::Lock,
        ] {
            assert!(LinuxCommands.power_action(action).is_some());
        }
    }
}

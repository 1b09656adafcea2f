//! Executor that logs instead of acting

use async_trait::async_trait;

use super::{Outcome, PlatformExecutor, PowerAction, VolumeChange, WindowGesture};

/// Reports success for every operation without touching the system
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl PlatformExecutor for DryRunExecutor {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn launch_app(&self, app: &str) -> Outcome {
        tracing::info!(app, "dry run: launch application");
        Outcome::ok()
    }

    async fn close_app(&self, app: &str) -> Outcome {
        tracing::info!(app, "dry run: close application");
        Outcome::ok()
    }

    async fn power_action(&self, action: PowerAction) -> Outcome {
        tracing::info!(action = action.as_str(), "dry run: power action");
        Outcome::ok()
    }

    async fn set_volume(&self, change: VolumeChange) -> Outcome {
        tracing::info!(?change, "dry run: volume");
        Outcome::ok()
    }

    async fn window_gesture(&self, gesture: WindowGesture) -> Outcome {
        tracing::info!(?gesture, "dry run: window gesture");
        Outcome::ok()
    }

    async fn open_url(&self, url: &str) -> Outcome {
        tracing::info!(url, "dry run: open url");
        Outcome::ok()
    }
}

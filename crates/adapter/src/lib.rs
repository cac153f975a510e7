//! EmuPilot Game Adapters
//!
//! An adapter drives one target application once the emulator is Ready:
//! launch via the home-screen search, log in, run scripted tasks. Per-game
//! business logic lives in adapter implementations; the generic adapter
//! covers the launch/login/task-dispatch skeleton.

pub mod factory;
pub mod generic;
pub mod tap_plugin;

pub use factory::{AdapterContext, AdapterFactory};
pub use generic::GenericAdapter;
pub use tap_plugin::TapControlPlugin;

use async_trait::async_trait;

/// Adapter errors
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("unsupported adapter kind: {0}")]
    UnsupportedKind(String),
}

/// Capability set of one game adapter.
#[async_trait]
pub trait GameAdapter: Send + Sync {
    /// From the emulator home screen to the tapped game icon.
    async fn launch_game(&mut self) -> bool;

    /// From the started game to its main screen.
    async fn login(&mut self) -> bool;

    /// Run a single named task.
    async fn run_task(&mut self, task: &str) -> bool;

    /// Run a batch of named tasks. Default: sequentially, all must succeed.
    async fn run_tasks(&mut self, tasks: &[String]) -> bool {
        let mut all_ok = true;
        for task in tasks {
            if !self.run_task(task).await {
                all_ok = false;
            }
        }
        all_ok
    }
}

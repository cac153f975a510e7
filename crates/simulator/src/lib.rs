//! EmuPilot Simulator Layer
//!
//! The boot sequence for PC Android emulators (detect-or-start, bridge
//! connect, display verification, interstitial dismissal), the window
//! presence probe, the home-screen icon search, and the kind factory.

pub mod app_launch;
pub mod factory;
pub mod mumu;
pub mod window;

pub use app_launch::{AppLauncher, LauncherSurface};
pub use factory::{SimulatorContext, SimulatorFactory};
pub use mumu::MuMuSimulator;
pub use window::{CommandWindowProbe, WindowProbe};

use async_trait::async_trait;

/// Simulator errors
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("unsupported simulator kind: {0}")]
    UnsupportedKind(String),
}

/// Boot progression of one emulator instance.
///
/// `NotRunning → Starting → Running → Connected → Verified → Ready`;
/// already-running emulators skip `Starting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStage {
    NotRunning,
    Starting,
    Running,
    Connected,
    Verified,
    Ready,
}

/// Capability set of one emulator kind.
///
/// `run` drives the whole boot sequence for a single attempt and reports a
/// boolean; it never loops internally — retry policy belongs to the caller.
#[async_trait]
pub trait Simulator: Send + Sync {
    /// Detect or start the emulator, connect the bridge, verify the
    /// display. True means the instance reached `Ready`.
    async fn run(&mut self) -> bool;

    /// Launch the emulator process and wait for it to settle.
    async fn start(&mut self) -> bool;

    /// Shut the control channel down, best-effort.
    async fn stop(&mut self) -> bool;

    /// Whether the emulator window is currently present.
    async fn is_running(&self) -> bool;

    /// Connect the device bridge.
    async fn connect(&self) -> bool;

    /// Disconnect the device bridge.
    async fn disconnect(&self) -> bool;

    /// Current boot stage, for diagnostics.
    fn stage(&self) -> BootStage;
}

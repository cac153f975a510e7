//! EmuPilot - Android Emulator Automation Agent
//!
//! Detects or boots a PC Android emulator, connects over ADB, locates UI
//! elements from uiautomator layout dumps, and drives jittered taps and
//! swipes to open a target application and run scripted task plugins.
//! Sessions are keyed by (port, account) and run concurrently.
//!
//! ## Architecture
//!
//! - `emupilot-core`: error taxonomy, configuration, log helpers
//! - `emupilot-bridge`: ADB controller, UI locator, session registry
//! - `emupilot-simulator`: boot sequence, window probe, app launcher
//! - `emupilot-plugins`: priority-ordered automation plugin framework
//! - `emupilot-adapter`: per-game adapters and the generic skeleton

// Re-export main components for library usage
pub use emupilot_adapter as adapter;
pub use emupilot_bridge as bridge;
pub use emupilot_core as core;
pub use emupilot_plugins as plugins;
pub use emupilot_simulator as simulator;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "EmuPilot";

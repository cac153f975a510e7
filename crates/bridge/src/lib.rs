//! EmuPilot Device Bridge
//!
//! Talks to one emulator instance over ADB: connect/disconnect, jittered
//! input, layout-snapshot pulls, and the UI locator built on top of them.
//! Also owns the concurrency-safe session registry that hands out exclusive
//! per-(port, account, worker) controller bundles.

pub mod adb;
pub mod jitter;
pub mod locator;
pub mod ocr;
pub mod session;

pub use adb::{AdbBridge, BridgeError};
pub use jitter::{Jitter, SwipeOptions, TapOptions};
pub use locator::{Point, ScreenLocator, ScreenPosition, UiQuery};
pub use ocr::{OcrClient, OcrError, TextRecognizer, TextRegion};
pub use session::{SessionInstance, SessionKey, SessionRegistry, SessionSettings, WorkerId};

/// On-device path `uiautomator dump` writes to before the pull
pub const DEVICE_DUMP_PATH: &str = "/sdcard/window_dump.xml";

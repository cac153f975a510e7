//! EmuPilot Core - Shared error types, configuration and log helpers
//!
//! This crate provides the pieces every other EmuPilot crate leans on:
//! the error taxonomy, the TOML configuration layer, and logging setup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, JitterSettings, SessionProfile};
pub use error::{EmuPilotError, Result};

/// EmuPilot version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "EmuPilot";

//! Error types for EmuPilot
//!
//! Centralized error handling using thiserror. The low-level controllers
//! keep their own per-module error enums; this is the taxonomy the binary
//! and configuration layers speak.

use thiserror::Error;

/// Main error type for EmuPilot
#[derive(Error, Debug)]
pub enum EmuPilotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Simulator error: {0}")]
    Simulator(String),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Unsupported kind: {0}")]
    UnsupportedKind(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Aborted: {0}")]
    Aborted(String),
}

/// Result type alias for EmuPilot operations
pub type Result<T> = std::result::Result<T, EmuPilotError>;

impl EmuPilotError {
    /// Check if this error is recoverable at the session level
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EmuPilotError::Bridge(_) | EmuPilotError::Timeout(_) | EmuPilotError::NotFound(_)
        )
    }
}

//! Application Configuration
//!
//! All settings the agent needs at startup: ADB invocation, input jitter,
//! display baseline, OCR sidecar, and the per-account session profiles.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EmuPilotError, Result};

/// ADB invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdbSettings {
    /// ADB binary name or absolute path
    pub binary: String,
    /// Host the emulator control channel listens on
    pub host: String,
    /// Per-command timeout in seconds (tap, swipe, dump, pull)
    pub command_timeout_secs: u64,
    /// Connect/disconnect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            binary: "adb".to_string(),
            host: "127.0.0.1".to_string(),
            command_timeout_secs: 5,
            connect_timeout_secs: 10,
        }
    }
}

/// Synthetic-input jitter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JitterSettings {
    /// Maximum tap offset in pixels, applied per axis
    pub tap_max_offset: i32,
    /// Maximum swipe endpoint offset in pixels, applied per axis
    pub swipe_max_offset: i32,
    /// Minimum pre-command delay in milliseconds
    pub min_delay_ms: u64,
    /// Maximum pre-command delay in milliseconds
    pub max_delay_ms: u64,
    /// Fixed RNG seed; None samples from entropy
    pub seed: Option<u64>,
}

impl Default for JitterSettings {
    fn default() -> Self {
        Self {
            tap_max_offset: 10,
            swipe_max_offset: 5,
            min_delay_ms: 100,
            max_delay_ms: 500,
            seed: None,
        }
    }
}

/// Required display baseline for automation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub required_width: u32,
    pub required_height: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            required_width: 1920,
            required_height: 1080,
        }
    }
}

/// Text-recognition sidecar settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Path to the OCR sidecar binary; None disables text recognition
    pub binary: Option<PathBuf>,
}

/// One automated (port, account) session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Simulator kind registered with the simulator factory
    pub simulator: String,
    /// Adapter kind registered with the adapter factory
    pub adapter: String,
    /// Emulator window title, used for running-state detection
    pub window_name: String,
    /// Emulator window class
    pub window_class: String,
    /// Emulator executable path
    pub emulator_path: PathBuf,
    /// ADB port of this emulator instance
    pub port: u16,
    /// Logical account driven in this session
    pub account: String,
    /// Home-screen icon label of the target application
    pub icon: String,
    /// Package id of the target application
    pub game_package: String,
    /// resource-id of the in-game entry control tapped at login
    pub login_control: Option<String>,
    /// Plugin task names executed after login, in priority order
    pub tasks: Vec<String>,
}

impl Default for SessionProfile {
    fn default() -> Self {
        Self {
            simulator: "mumu".to_string(),
            adapter: "generic".to_string(),
            window_name: "MuMu Player 12".to_string(),
            window_class: "Qt5156QWindowIcon".to_string(),
            emulator_path: PathBuf::from("C:/Program Files/MuMu Player 12/shell/MuMuPlayer.exe"),
            port: 16384,
            account: "default".to_string(),
            icon: String::new(),
            game_package: String::new(),
            login_control: None,
            tasks: Vec::new(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// ADB settings
    pub adb: AdbSettings,
    /// Input jitter settings
    pub jitter: JitterSettings,
    /// Display baseline
    pub display: DisplaySettings,
    /// OCR sidecar settings
    pub ocr: OcrSettings,
    /// Directory layout snapshots are pulled into; defaults to the OS temp dir
    pub snapshot_dir: Option<PathBuf>,
    /// Session profiles, one worker each
    pub sessions: Vec<SessionProfile>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            adb: AdbSettings::default(),
            jitter: JitterSettings::default(),
            display: DisplaySettings::default(),
            ocr: OcrSettings::default(),
            snapshot_dir: None,
            sessions: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "emupilot", "EmuPilot")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Resolve the snapshot directory
    pub fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("emupilot"))
    }

    /// Load configuration from file, creating defaults if absent
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| EmuPilotError::Config("Cannot determine config path".into()))?;

        if config_file.exists() {
            debug!("Loading config from {:?}", config_file);
            let contents = tokio::fs::read_to_string(&config_file).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| EmuPilotError::Config("Cannot determine config path".into()))?;

        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_file, contents).await?;

        debug!("Config saved to {:?}", config_file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.adb.binary, "adb");
        assert_eq!(config.adb.host, "127.0.0.1");
        assert_eq!(config.jitter.tap_max_offset, 10);
        assert_eq!(config.display.required_width, 1920);
        assert!(config.sessions.is_empty());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.sessions.push(SessionProfile {
            port: 16416,
            account: "alt".to_string(),
            icon: "Sky Trade".to_string(),
            game_package: "com.example.skytrade".to_string(),
            tasks: vec!["daily_signin".to_string()],
            ..SessionProfile::default()
        });

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.sessions.len(), 1);
        assert_eq!(parsed.sessions[0].port, 16416);
        assert_eq!(parsed.sessions[0].account, "alt");
        assert_eq!(parsed.sessions[0].tasks, vec!["daily_signin".to_string()]);
    }

    #[test]
    fn test_snapshot_dir_fallback() {
        let config = AppConfig::default();
        assert!(config.snapshot_dir().ends_with("emupilot"));

        let explicit = AppConfig {
            snapshot_dir: Some(PathBuf::from("/var/tmp/dumps")),
            ..AppConfig::default()
        };
        assert_eq!(explicit.snapshot_dir(), PathBuf::from("/var/tmp/dumps"));
    }
}

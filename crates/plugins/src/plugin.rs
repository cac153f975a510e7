//! Plugin Trait, Control Flags and Reports

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use emupilot_bridge::session::SessionInstance;

/// Interval of the cooperative pause spin
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Execution parameters handed to plugins
pub type PluginParams = serde_json::Value;

/// Plugin errors
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin not found: {0}")]
    NotFound(String),
    #[error("plugin not executable: {0}")]
    NotExecutable(String),
    #[error("plugin {plugin} failed: {message}")]
    Failed { plugin: String, message: String },
    #[error("execution aborted at plugin {0}")]
    Aborted(String),
}

impl PluginError {
    /// Convenience for plugin bodies reporting a failure.
    pub fn failed(plugin: &str, message: impl Into<String>) -> Self {
        PluginError::Failed {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }
}

/// Context a plugin runs against: the owning session and its identity.
pub struct PluginContext {
    pub port: u16,
    pub account: String,
    pub session: Arc<SessionInstance>,
}

impl PluginContext {
    pub fn new(session: Arc<SessionInstance>) -> Self {
        Self {
            port: session.port(),
            account: session.account().to_string(),
            session,
        }
    }
}

#[derive(Debug, Default)]
struct ControlFlags {
    running: bool,
    paused: bool,
}

/// Mutable running/paused state of one plugin, guarded by its own lock.
#[derive(Debug, Default)]
pub struct PluginControl {
    flags: Mutex<ControlFlags>,
}

impl PluginControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin(&self) {
        self.flags.lock().running = true;
    }

    pub(crate) fn finish(&self) {
        self.flags.lock().running = false;
    }

    pub fn pause(&self) {
        self.flags.lock().paused = true;
    }

    pub fn resume(&self) {
        self.flags.lock().paused = false;
    }

    pub fn stop(&self) {
        self.flags.lock().running = false;
    }

    pub fn is_running(&self) -> bool {
        self.flags.lock().running
    }

    pub fn is_paused(&self) -> bool {
        self.flags.lock().paused
    }

    /// Cooperative pause point. Long-running `execute` bodies call this
    /// between steps; it spins while paused and still running.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && self.is_running() {
            tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
        }
    }
}

/// One discrete unit of automation work.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique plugin name; the registry key.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn version(&self) -> &str {
        "1.0.0"
    }

    /// Lower runs earlier in priority batches.
    fn priority(&self) -> i32 {
        100
    }

    fn category(&self) -> &str {
        "general"
    }

    fn context(&self) -> &PluginContext;

    fn control(&self) -> &PluginControl;

    /// Whether the plugin can run right now. Default: the session bridge is
    /// connected.
    fn can_execute(&self) -> bool {
        self.context().session.adb().is_connected()
    }

    /// Called once at registration.
    fn setup(&self) {
        debug!("plugin {} setup", self.name());
    }

    /// Called once at unregistration.
    fn teardown(&self) {
        debug!("plugin {} teardown", self.name());
    }

    /// Run the plugin. Returned JSON becomes the report detail.
    async fn execute(&self, params: &PluginParams) -> Result<serde_json::Value, PluginError>;
}

/// Per-call execution outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    Success,
    UserResolved,
    Skipped,
    Error,
}

/// Result of one plugin execution, also the per-plugin entry of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct PluginReport {
    pub plugin: String,
    pub account: String,
    pub status: PluginStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PluginReport {
    pub fn success(plugin: &str, account: &str, detail: serde_json::Value) -> Self {
        Self {
            plugin: plugin.to_string(),
            account: account.to_string(),
            status: PluginStatus::Success,
            detail: Some(detail),
            error: None,
        }
    }

    pub fn user_resolved(plugin: &str, account: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            account: account.to_string(),
            status: PluginStatus::UserResolved,
            detail: None,
            error: None,
        }
    }

    pub fn skipped(plugin: &str, account: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            account: account.to_string(),
            status: PluginStatus::Skipped,
            detail: None,
            error: None,
        }
    }

    pub fn error(plugin: &str, account: &str, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.to_string(),
            account: account.to_string(),
            status: PluginStatus::Error,
            detail: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            PluginStatus::Success | PluginStatus::UserResolved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_control_flag_transitions() {
        let control = PluginControl::new();
        assert!(!control.is_running());
        assert!(!control.is_paused());

        control.begin();
        assert!(control.is_running());

        control.pause();
        assert!(control.is_paused());
        control.resume();
        assert!(!control.is_paused());

        control.stop();
        assert!(!control.is_running());
    }

    #[tokio::test]
    async fn test_wait_if_paused_passes_through_when_unpaused() {
        let control = PluginControl::new();
        control.begin();
        let start = Instant::now();
        control.wait_if_paused().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_wait_if_paused_spins_until_resumed() {
        let control = Arc::new(PluginControl::new());
        control.begin();
        control.pause();

        let waiter = Arc::clone(&control);
        let handle = tokio::spawn(async move { waiter.wait_if_paused().await });

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!handle.is_finished());

        control.resume();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_stop_releases_a_paused_spin() {
        let control = Arc::new(PluginControl::new());
        control.begin();
        control.pause();

        let waiter = Arc::clone(&control);
        let handle = tokio::spawn(async move { waiter.wait_if_paused().await });

        control.stop();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_report_serialization_skips_empty_fields() {
        let report = PluginReport::skipped("daily_signin", "alice");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "skipped");
        assert!(json.get("detail").is_none());
        assert!(json.get("error").is_none());
    }
}

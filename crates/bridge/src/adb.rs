//! ADB Device Bridge Controller
//!
//! Translates high-level actions (connect, tap, swipe, layout dump) into
//! ADB commands against one emulator instance. Every command runs under a
//! fixed timeout; transient failures are logged with their cause and
//! collapse to a boolean for callers — connect, input and force-stop are
//! advisory best-effort operations, never fatal faults.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, error, info};

use emupilot_core::config::{AdbSettings, JitterSettings};

use crate::jitter::{Jitter, SwipeOptions, TapOptions};
use crate::DEVICE_DUMP_PATH;

/// Bridge errors; distinguished for diagnostics, collapsed to bool for callers
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("adb binary not found")]
    BinaryMissing,
    #[error("permission denied executing adb")]
    PermissionDenied,
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("command failed (exit {code:?}): {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },
    #[error("unexpected output: {0}")]
    UnexpectedOutput(String),
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => BridgeError::BinaryMissing,
            std::io::ErrorKind::PermissionDenied => BridgeError::PermissionDenied,
            _ => BridgeError::Io(err),
        }
    }
}

/// ADB controller scoped to one (port, account) emulator instance.
pub struct AdbBridge {
    binary: String,
    host: String,
    port: u16,
    account: String,
    command_timeout: Duration,
    connect_timeout: Duration,
    jitter: Jitter,
    connected: AtomicBool,
}

impl AdbBridge {
    pub fn new(adb: &AdbSettings, jitter: &JitterSettings, port: u16, account: &str) -> Self {
        Self {
            binary: adb.binary.clone(),
            host: adb.host.clone(),
            port,
            account: account.to_string(),
            command_timeout: Duration::from_secs(adb.command_timeout_secs),
            connect_timeout: Duration::from_secs(adb.connect_timeout_secs),
            jitter: Jitter::new(jitter.seed),
            connected: AtomicBool::new(false),
        }
    }

    /// Device serial as addressed by `-s`
    pub fn serial(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Whether the last connect attempt succeeded and no disconnect followed
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Run an adb command and return its stdout
    async fn exec(&self, args: &[&str], timeout: Duration) -> Result<String, BridgeError> {
        debug!("adb {:?}", args);

        let output = tokio::time::timeout(
            timeout,
            Command::new(&self.binary)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| BridgeError::Timeout(timeout))??;

        if !output.status.success() {
            return Err(BridgeError::CommandFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run an adb command against this instance's serial
    async fn exec_device(&self, args: &[&str], timeout: Duration) -> Result<String, BridgeError> {
        let serial = self.serial();
        let mut full_args = vec!["-s", serial.as_str()];
        full_args.extend(args);
        self.exec(&full_args, timeout).await
    }

    /// Connect to the emulator control channel. Idempotent: "already
    /// connected" output counts as success.
    pub async fn connect(&self) -> bool {
        let target = self.serial();
        info!("connecting to emulator at {}", target);

        match self.exec(&["connect", &target], self.connect_timeout).await {
            Ok(stdout) => {
                let normalized = stdout.to_lowercase();
                if normalized.contains("connected") || normalized.contains("already") {
                    info!("connected to emulator at {}", target);
                    self.connected.store(true, Ordering::SeqCst);
                    true
                } else {
                    error!(
                        "connect to {} returned unexpected output: {}",
                        target,
                        stdout.trim()
                    );
                    false
                }
            }
            Err(e) => {
                error!("connect to {} failed: {}", target, e);
                false
            }
        }
    }

    /// Disconnect from the emulator. Advisory: completion counts as success
    /// even if the target was not connected.
    pub async fn disconnect(&self) -> bool {
        let target = self.serial();
        info!("disconnecting from emulator at {}", target);

        match self.exec(&["disconnect", &target], self.connect_timeout).await {
            Ok(_) => {
                self.connected.store(false, Ordering::SeqCst);
                true
            }
            Err(e) => {
                error!("disconnect from {} failed: {}", target, e);
                false
            }
        }
    }

    /// Issue one jittered tap.
    pub async fn tap(&self, x: i32, y: i32, opts: &TapOptions) -> bool {
        if opts.before_sleep {
            tokio::time::sleep(Duration::from_millis(opts.before_sleep_ms)).await;
        }

        let delay = self.jitter.delay(opts.min_delay_ms, opts.max_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let (ax, ay) = self.jitter.jittered_point(x, y, opts.max_offset);
        let (ax_s, ay_s) = (ax.to_string(), ay.to_string());

        let result = self
            .exec_device(
                &["shell", "input", "tap", &ax_s, &ay_s],
                self.command_timeout,
            )
            .await;

        match result {
            Ok(_) => {
                debug!(
                    "tap ok | delay: {:?} | base: ({},{}) | final: ({},{})",
                    delay, x, y, ax, ay
                );
                if opts.after_sleep {
                    tokio::time::sleep(Duration::from_millis(opts.after_sleep_ms)).await;
                }
                true
            }
            Err(e) => {
                error!("tap at ({},{}) failed: {}", x, y, e);
                false
            }
        }
    }

    /// Issue one jittered swipe; offsets apply independently to both endpoints.
    pub async fn swipe(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration_ms: u32,
        opts: &SwipeOptions,
    ) -> bool {
        let delay = self.jitter.delay(opts.min_delay_ms, opts.max_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let (ax1, ay1) = self.jitter.jittered_point(x1, y1, opts.max_offset);
        let (ax2, ay2) = self.jitter.jittered_point(x2, y2, opts.max_offset);
        let args = [
            ax1.to_string(),
            ay1.to_string(),
            ax2.to_string(),
            ay2.to_string(),
            duration_ms.to_string(),
        ];

        let result = self
            .exec_device(
                &[
                    "shell", "input", "swipe", &args[0], &args[1], &args[2], &args[3], &args[4],
                ],
                self.command_timeout,
            )
            .await;

        match result {
            Ok(_) => {
                debug!(
                    "swipe ok | delay: {:?} | base: ({},{})->({},{}) | final: ({},{})->({},{}) | {}ms",
                    delay, x1, y1, x2, y2, ax1, ay1, ax2, ay2, duration_ms
                );
                true
            }
            Err(e) => {
                error!(
                    "swipe ({},{})->({},{}) failed: {}",
                    x1, y1, x2, y2, e
                );
                false
            }
        }
    }

    /// Swipe toward the previous home-screen page.
    pub async fn swipe_left(&self) -> bool {
        let ok = self
            .swipe(480, 540, 1440, 540, 900, &SwipeOptions::default())
            .await;
        debug!("swipe left");
        ok
    }

    /// Swipe toward the next home-screen page.
    pub async fn swipe_right(&self) -> bool {
        let ok = self
            .swipe(1440, 540, 480, 540, 900, &SwipeOptions::default())
            .await;
        debug!("swipe right");
        ok
    }

    /// Dump the current UI hierarchy on-device and pull it to `dest`.
    /// Partial output is not success: both steps must complete.
    pub async fn pull_layout_snapshot(&self, dest: &Path) -> bool {
        info!("pulling layout snapshot to {:?}", dest);

        if let Some(parent) = dest.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("creating snapshot dir {:?} failed: {}", parent, e);
                return false;
            }
        }

        if let Err(e) = self
            .exec_device(
                &["shell", "uiautomator", "dump", DEVICE_DUMP_PATH],
                self.command_timeout,
            )
            .await
        {
            error!("uiautomator dump failed: {}", e);
            return false;
        }

        let dest_str = dest.to_string_lossy();
        match self
            .exec_device(&["pull", DEVICE_DUMP_PATH, &dest_str], self.command_timeout)
            .await
        {
            Ok(_) => {
                debug!("layout snapshot pulled: {:?}", dest);
                true
            }
            Err(e) => {
                error!("pulling layout snapshot failed: {}", e);
                false
            }
        }
    }

    /// Best-effort force-stop of the target package.
    pub async fn force_stop(&self, package: &str) -> bool {
        info!("force-stopping {}", package);
        match self
            .exec_device(
                &["shell", "am", "force-stop", package],
                self.command_timeout,
            )
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!("force-stop {} failed: {}", package, e);
                false
            }
        }
    }

    /// Current display resolution (`cur=WxH`), orientation-sensitive.
    pub async fn current_display_resolution(&self) -> Option<(u32, u32)> {
        let stdout = match self
            .exec_device(
                &["shell", "dumpsys", "window", "displays"],
                self.command_timeout,
            )
            .await
        {
            Ok(out) => out,
            Err(e) => {
                error!("reading display resolution failed: {}", e);
                return None;
            }
        };

        match parse_current_resolution(&stdout) {
            Some(res) => Some(res),
            None => {
                error!("no cur=WxH resolution found in dumpsys output");
                None
            }
        }
    }

    /// Stop the local adb server. Used during simulator shutdown.
    pub async fn kill_server(&self) -> bool {
        match self.exec(&["kill-server"], self.connect_timeout).await {
            Ok(_) => true,
            Err(e) => {
                error!("adb kill-server failed: {}", e);
                false
            }
        }
    }
}

/// Extract the current `cur=WxH` resolution from dumpsys output.
pub(crate) fn parse_current_resolution(output: &str) -> Option<(u32, u32)> {
    if let Ok(re) = Regex::new(r"cur=(\d+)x(\d+)") {
        if let Some(caps) = re.captures(output) {
            let w = caps.get(1)?.as_str().parse().ok()?;
            let h = caps.get(2)?.as_str().parse().ok()?;
            return Some((w, h));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> AdbBridge {
        let adb = AdbSettings::default();
        let jitter = JitterSettings {
            seed: Some(1),
            ..JitterSettings::default()
        };
        AdbBridge::new(&adb, &jitter, 16384, "test")
    }

    #[test]
    fn test_serial_format() {
        assert_eq!(bridge().serial(), "127.0.0.1:16384");
    }

    #[test]
    fn test_parse_current_resolution() {
        let out = "Display: mDisplayId=0\n  init=1920x1080 420dpi cur=1920x1080 app=1920x1080";
        assert_eq!(parse_current_resolution(out), Some((1920, 1080)));
        assert_eq!(parse_current_resolution("no resolution here"), None);
    }

    #[test]
    fn test_starts_disconnected() {
        assert!(!bridge().is_connected());
    }

    #[tokio::test]
    async fn test_missing_binary_collapses_to_false() {
        let adb = AdbSettings {
            binary: "adb-binary-that-does-not-exist".to_string(),
            ..AdbSettings::default()
        };
        let bridge = AdbBridge::new(&adb, &JitterSettings::default(), 16384, "test");
        assert!(!bridge.connect().await);
        assert!(!bridge.force_stop("com.example.app").await);
        assert!(!bridge.tap(500, 500, &TapOptions::exact()).await);
        assert!(bridge.current_display_resolution().await.is_none());
    }
}

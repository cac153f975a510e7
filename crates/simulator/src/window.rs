//! Emulator Window Probe
//!
//! The core only needs a boolean "is the emulator window present"; the
//! platform lookup itself is a thin OS call behind this trait so the boot
//! sequence stays testable.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Capability: check whether a window with the given class/title exists.
#[async_trait]
pub trait WindowProbe: Send + Sync {
    async fn is_present(&self, window_class: &str, window_name: &str) -> bool;
}

/// Probe that shells out to the platform's process/window listing.
#[derive(Debug, Default)]
pub struct CommandWindowProbe;

#[async_trait]
impl WindowProbe for CommandWindowProbe {
    #[cfg(windows)]
    async fn is_present(&self, _window_class: &str, window_name: &str) -> bool {
        let filter = format!("WINDOWTITLE eq {}", window_name);
        match Command::new("tasklist")
            .args(["/FI", &filter, "/NH"])
            .output()
            .await
        {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let present = output.status.success() && !stdout.contains("No tasks");
                debug!("window '{}' present: {}", window_name, present);
                present
            }
            Err(e) => {
                debug!("window probe failed: {}", e);
                false
            }
        }
    }

    #[cfg(not(windows))]
    async fn is_present(&self, _window_class: &str, window_name: &str) -> bool {
        match Command::new("pgrep")
            .args(["-f", window_name])
            .output()
            .await
        {
            Ok(output) => {
                let present = output.status.success();
                debug!("window '{}' present: {}", window_name, present);
                present
            }
            Err(e) => {
                debug!("window probe failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_window() {
        let probe = CommandWindowProbe;
        assert!(
            !probe
                .is_present("NoSuchClass", "emupilot-window-that-does-not-exist")
                .await
        );
    }
}

//! Tap-Control Plugin
//!
//! Smallest useful unit of automation work: locate a control by resource-id
//! (from the call parameters) and tap it. Game-specific plugins compose the
//! same session calls; this one doubles as the framework's reference
//! implementation.

use async_trait::async_trait;
use serde_json::json;

use emupilot_bridge::jitter::TapOptions;
use emupilot_bridge::locator::UiQuery;
use emupilot_plugins::{Plugin, PluginContext, PluginControl, PluginError, PluginParams};

pub struct TapControlPlugin {
    context: PluginContext,
    control: PluginControl,
}

impl TapControlPlugin {
    pub fn new(context: PluginContext) -> Self {
        Self {
            context,
            control: PluginControl::new(),
        }
    }
}

#[async_trait]
impl Plugin for TapControlPlugin {
    fn name(&self) -> &str {
        "tap_control"
    }

    fn description(&self) -> &str {
        "Locate a control by resource-id and tap it"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn category(&self) -> &str {
        "ui"
    }

    fn context(&self) -> &PluginContext {
        &self.context
    }

    fn control(&self) -> &PluginControl {
        &self.control
    }

    async fn execute(&self, params: &PluginParams) -> Result<serde_json::Value, PluginError> {
        let resource_id = params
            .get("resource_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PluginError::failed(self.name(), "missing resource_id parameter"))?;

        self.control.wait_if_paused().await;

        let session = &self.context.session;
        let point = session
            .locator()
            .locate(&UiQuery::by_resource_id(resource_id))
            .await
            .ok_or_else(|| {
                PluginError::failed(self.name(), format!("control {} not found", resource_id))
            })?;

        if !session.adb().tap(point.x, point.y, &TapOptions::default()).await {
            return Err(PluginError::failed(self.name(), "tap failed"));
        }

        Ok(json!({ "resource_id": resource_id, "x": point.x, "y": point.y }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emupilot_bridge::session::{SessionRegistry, SessionSettings, WorkerId};
    use emupilot_core::config::{AdbSettings, JitterSettings};

    fn plugin() -> TapControlPlugin {
        let registry = SessionRegistry::new(SessionSettings {
            adb: AdbSettings {
                binary: "adb-binary-that-does-not-exist".to_string(),
                ..AdbSettings::default()
            },
            jitter: JitterSettings::default(),
            snapshot_dir: std::env::temp_dir().join("emupilot-test"),
            ocr_binary: None,
        });
        TapControlPlugin::new(PluginContext::new(registry.acquire(
            16384,
            "test",
            WorkerId::next(),
        )))
    }

    #[tokio::test]
    async fn test_missing_parameter_is_a_plugin_fault() {
        let plugin = plugin();
        let err = plugin.execute(&json!({})).await.unwrap_err();
        assert!(matches!(err, PluginError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_session_fails_cleanly() {
        let plugin = plugin();
        let err = plugin
            .execute(&json!({ "resource_id": "com.example:id/confirm" }))
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::Failed { .. }));
    }
}

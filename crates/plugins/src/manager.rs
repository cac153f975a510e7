//! Plugin Manager
//!
//! Registry and priority-ordered executor. A single plugin's failure is
//! contained: it becomes that plugin's report entry and never corrupts the
//! registry or halts a batch.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::plugin::{Plugin, PluginError, PluginParams, PluginReport};

struct Entry {
    plugin: Arc<dyn Plugin>,
    /// Registration sequence, the tie-breaker for equal priorities
    order: usize,
}

/// Descriptive listing entry
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
    pub version: String,
    pub priority: i32,
    pub category: String,
}

/// Thread-safe plugin registry and executor.
#[derive(Default)]
pub struct PluginManager {
    plugins: Mutex<HashMap<String, Entry>>,
    next_order: Mutex<usize>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its declared name and run its setup hook.
    /// Re-registration under an existing name overwrites with a warning.
    pub fn register(&self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        plugin.setup();

        let order = {
            let mut next = self.next_order.lock();
            *next += 1;
            *next
        };

        let mut plugins = self.plugins.lock();
        if plugins.contains_key(&name) {
            warn!("plugin {} already registered, overwriting", name);
        }
        plugins.insert(name.clone(), Entry { plugin, order });
        info!("plugin {} registered", name);
    }

    /// Run the plugin's teardown hook and remove it.
    pub fn unregister(&self, name: &str) -> bool {
        let entry = self.plugins.lock().remove(name);
        match entry {
            Some(entry) => {
                entry.plugin.teardown();
                info!("plugin {} unregistered", name);
                true
            }
            None => {
                warn!("plugin {} not registered", name);
                false
            }
        }
    }

    /// Unregister every plugin.
    pub fn unregister_all(&self) {
        let names: Vec<String> = self.plugins.lock().keys().cloned().collect();
        for name in names {
            self.unregister(&name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.lock().get(name).map(|e| Arc::clone(&e.plugin))
    }

    /// Registered plugins, ascending by priority.
    pub fn list(&self) -> Vec<PluginInfo> {
        let mut infos: Vec<(i32, usize, PluginInfo)> = self
            .plugins
            .lock()
            .values()
            .map(|e| {
                (
                    e.plugin.priority(),
                    e.order,
                    PluginInfo {
                        name: e.plugin.name().to_string(),
                        description: e.plugin.description().to_string(),
                        version: e.plugin.version().to_string(),
                        priority: e.plugin.priority(),
                        category: e.plugin.category().to_string(),
                    },
                )
            })
            .collect();
        infos.sort_by_key(|(priority, order, _)| (*priority, *order));
        infos.into_iter().map(|(_, _, info)| info).collect()
    }

    /// Execute one plugin by name.
    ///
    /// NotFound and NotExecutable are usage faults; a fault raised inside
    /// the plugin body is caught and normalized to `PluginError::Failed`.
    pub async fn execute(
        &self,
        name: &str,
        params: &PluginParams,
    ) -> Result<PluginReport, PluginError> {
        let plugin = self
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        if !plugin.can_execute() {
            return Err(PluginError::NotExecutable(name.to_string()));
        }

        info!("executing plugin: {}", name);
        plugin.control().begin();
        let result = plugin.execute(params).await;
        plugin.control().finish();

        let account = plugin.context().account.clone();
        match result {
            Ok(detail) => {
                info!("plugin {} finished", name);
                Ok(PluginReport::success(name, &account, detail))
            }
            Err(e) => {
                error!("plugin {} failed: {}", name, e);
                Err(PluginError::Failed {
                    plugin: name.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Execute the named plugins ascending by (priority, registration
    /// order). Unknown names are skipped with a warning; one plugin's
    /// failure becomes its report entry and the batch continues.
    pub async fn execute_by_priority(
        &self,
        names: &[String],
        params: &PluginParams,
    ) -> BTreeMap<String, PluginReport> {
        let mut selected: Vec<(i32, usize, Arc<dyn Plugin>)> = Vec::new();
        {
            let plugins = self.plugins.lock();
            for name in names {
                match plugins.get(name) {
                    Some(entry) => selected.push((
                        entry.plugin.priority(),
                        entry.order,
                        Arc::clone(&entry.plugin),
                    )),
                    None => warn!("plugin {} not registered, skipping", name),
                }
            }
        }
        selected.sort_by_key(|(priority, order, _)| (*priority, *order));

        let mut results = BTreeMap::new();
        for (_, _, plugin) in selected {
            let name = plugin.name().to_string();
            let account = plugin.context().account.clone();
            let report = match self.execute(&name, params).await {
                Ok(report) => report,
                Err(e) => PluginReport::error(&name, &account, e.to_string()),
            };
            results.insert(name, report);
        }
        results
    }

    /// Pause the named plugin's execution at its next cooperative check.
    pub fn pause(&self, name: &str) -> bool {
        match self.get(name) {
            Some(plugin) => {
                plugin.control().pause();
                info!("plugin {} paused", name);
                true
            }
            None => false,
        }
    }

    /// Resume the named plugin.
    pub fn resume(&self, name: &str) -> bool {
        match self.get(name) {
            Some(plugin) => {
                plugin.control().resume();
                info!("plugin {} resumed", name);
                true
            }
            None => false,
        }
    }

    /// Stop the named plugin; a paused body exits its pause spin.
    pub fn stop(&self, name: &str) -> bool {
        match self.get(name) {
            Some(plugin) => {
                plugin.control().stop();
                info!("plugin {} stopped", name);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{PluginContext, PluginControl, PluginStatus};
    use async_trait::async_trait;
    use emupilot_bridge::session::{SessionRegistry, SessionSettings, WorkerId};
    use emupilot_core::config::{AdbSettings, JitterSettings};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn context() -> PluginContext {
        let registry = SessionRegistry::new(SessionSettings {
            adb: AdbSettings::default(),
            jitter: JitterSettings::default(),
            snapshot_dir: std::env::temp_dir().join("emupilot-test"),
            ocr_binary: None,
        });
        PluginContext::new(registry.acquire(16384, "alice", WorkerId::next()))
    }

    struct TestPlugin {
        name: String,
        priority: i32,
        fail: bool,
        executable: bool,
        executions: AtomicU32,
        context: PluginContext,
        control: PluginControl,
    }

    impl TestPlugin {
        fn build(name: &str, priority: i32, fail: bool, executable: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                priority,
                fail,
                executable,
                executions: AtomicU32::new(0),
                context: context(),
                control: PluginControl::new(),
            })
        }

        fn new(name: &str, priority: i32, fail: bool) -> Arc<Self> {
            Self::build(name, priority, fail, true)
        }

        fn unexecutable(name: &str) -> Arc<Self> {
            Self::build(name, 100, false, false)
        }
    }

    #[async_trait]
    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "test plugin"
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn context(&self) -> &PluginContext {
            &self.context
        }

        fn control(&self) -> &PluginControl {
            &self.control
        }

        fn can_execute(&self) -> bool {
            self.executable
        }

        async fn execute(&self, _params: &PluginParams) -> Result<serde_json::Value, PluginError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PluginError::failed(&self.name, "scripted failure"))
            } else {
                Ok(json!({ "done": true }))
            }
        }
    }

    #[tokio::test]
    async fn test_execute_unknown_plugin() {
        let manager = PluginManager::new();
        let err = manager.execute("missing", &json!({})).await.unwrap_err();
        assert!(matches!(err, PluginError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_execute_not_executable() {
        let manager = PluginManager::new();
        manager.register(TestPlugin::unexecutable("blocked"));
        let err = manager.execute("blocked", &json!({})).await.unwrap_err();
        assert!(matches!(err, PluginError::NotExecutable(_)));
    }

    #[tokio::test]
    async fn test_execute_success_and_failure() {
        let manager = PluginManager::new();
        manager.register(TestPlugin::new("good", 10, false));
        manager.register(TestPlugin::new("bad", 20, true));

        let report = manager.execute("good", &json!({})).await.unwrap();
        assert_eq!(report.status, PluginStatus::Success);
        assert_eq!(report.account, "alice");

        let err = manager.execute("bad", &json!({})).await.unwrap_err();
        assert!(matches!(err, PluginError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_priority_order_and_fault_containment() {
        let manager = PluginManager::new();
        // Registered out of priority order on purpose.
        let p50 = TestPlugin::new("fifty", 50, false);
        let p10 = TestPlugin::new("ten", 10, true);
        let p30 = TestPlugin::new("thirty", 30, false);
        manager.register(Arc::clone(&p50) as Arc<dyn Plugin>);
        manager.register(Arc::clone(&p10) as Arc<dyn Plugin>);
        manager.register(Arc::clone(&p30) as Arc<dyn Plugin>);

        let names = vec!["fifty".to_string(), "ten".to_string(), "thirty".to_string()];
        let results = manager.execute_by_priority(&names, &json!({})).await;

        // The listing confirms execution order 10 -> 30 -> 50.
        let listed: Vec<String> = manager.list().into_iter().map(|i| i.name).collect();
        assert_eq!(listed, vec!["ten", "thirty", "fifty"]);

        // The priority-10 failure did not halt the batch.
        assert_eq!(results.len(), 3);
        assert_eq!(results["ten"].status, PluginStatus::Error);
        assert_eq!(results["thirty"].status, PluginStatus::Success);
        assert_eq!(results["fifty"].status, PluginStatus::Success);
        assert_eq!(p50.executions.load(Ordering::SeqCst), 1);
        assert_eq!(p30.executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reregistration_overwrites() {
        let manager = PluginManager::new();
        manager.register(TestPlugin::new("dup", 10, true));
        manager.register(TestPlugin::new("dup", 10, false));

        let report = manager.execute("dup", &json!({})).await.unwrap();
        assert_eq!(report.status, PluginStatus::Success);
    }

    #[tokio::test]
    async fn test_unregister() {
        let manager = PluginManager::new();
        manager.register(TestPlugin::new("gone", 10, false));
        assert!(manager.unregister("gone"));
        assert!(!manager.unregister("gone"));
        assert!(manager.get("gone").is_none());
    }

    #[tokio::test]
    async fn test_batch_skips_unknown_names() {
        let manager = PluginManager::new();
        manager.register(TestPlugin::new("known", 10, false));

        let names = vec!["known".to_string(), "phantom".to_string()];
        let results = manager.execute_by_priority(&names, &json!({})).await;
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("known"));
    }

    #[tokio::test]
    async fn test_pause_resume_stop_flags() {
        let manager = PluginManager::new();
        let plugin = TestPlugin::new("controlled", 10, false);
        manager.register(Arc::clone(&plugin) as Arc<dyn Plugin>);

        assert!(manager.pause("controlled"));
        assert!(plugin.control.is_paused());
        assert!(manager.resume("controlled"));
        assert!(!plugin.control.is_paused());
        assert!(manager.stop("controlled"));
        assert!(!manager.pause("missing"));
    }
}

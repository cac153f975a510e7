//! Generic Adapter
//!
//! Reference adapter covering the parts every game shares: home-screen
//! launch, a single configured entry tap for login, and task dispatch into
//! the plugin manager's priority batch.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info, warn};

use emupilot_bridge::jitter::TapOptions;
use emupilot_bridge::locator::UiQuery;
use emupilot_bridge::session::SessionInstance;
use emupilot_core::config::SessionProfile;
use emupilot_plugins::PluginManager;
use emupilot_simulator::AppLauncher;

use crate::GameAdapter;

pub struct GenericAdapter {
    profile: SessionProfile,
    session: Arc<SessionInstance>,
    plugins: Arc<PluginManager>,
}

impl GenericAdapter {
    pub fn new(
        profile: SessionProfile,
        session: Arc<SessionInstance>,
        plugins: Arc<PluginManager>,
    ) -> Self {
        Self {
            profile,
            session,
            plugins,
        }
    }
}

#[async_trait]
impl GameAdapter for GenericAdapter {
    async fn launch_game(&mut self) -> bool {
        let icon = UiQuery::by_text(&self.profile.icon);
        AppLauncher::new(self.session.as_ref())
            .launch(&icon, &self.profile.game_package)
            .await
    }

    async fn login(&mut self) -> bool {
        let Some(ref control) = self.profile.login_control else {
            debug!("no login control configured, skipping login step");
            return true;
        };

        info!("looking for the entry control {}", control);
        match self
            .session
            .locator()
            .locate(&UiQuery::by_resource_id(control))
            .await
        {
            Some(point) => {
                self.session
                    .adb()
                    .tap(point.x, point.y, &TapOptions::default())
                    .await
            }
            None => {
                warn!("entry control {} not found", control);
                false
            }
        }
    }

    async fn run_task(&mut self, task: &str) -> bool {
        match self.plugins.execute(task, &json!({})).await {
            Ok(report) => report.is_success(),
            Err(e) => {
                error!("task {} failed: {}", task, e);
                false
            }
        }
    }

    /// Tasks run as one priority-ordered batch; a single task's failure
    /// does not stop the rest.
    async fn run_tasks(&mut self, tasks: &[String]) -> bool {
        if tasks.is_empty() {
            return true;
        }

        let results = self.plugins.execute_by_priority(tasks, &json!({})).await;
        let failed: Vec<&str> = results
            .iter()
            .filter(|(_, report)| !report.is_success())
            .map(|(name, _)| name.as_str())
            .collect();

        if failed.is_empty() {
            info!("all {} tasks finished", results.len());
            true
        } else {
            warn!("tasks failed: {}", failed.join(", "));
            false
        }
    }
}

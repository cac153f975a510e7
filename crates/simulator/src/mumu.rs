//! MuMu Simulator
//!
//! Boot sequence for the MuMu player: detect the window or launch the
//! executable, connect the device bridge, verify the display baseline and
//! dismiss the startup interstitial. Each `run` is a single attempt;
//! looping on failure is the caller's decision.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use emupilot_bridge::jitter::TapOptions;
use emupilot_bridge::locator::UiQuery;
use emupilot_bridge::session::SessionInstance;
use emupilot_core::config::{DisplaySettings, SessionProfile};
use emupilot_core::logging::section;

use crate::window::WindowProbe;
use crate::{BootStage, Simulator};

/// resource-id of the startup interstitial's close control
const INTERSTITIAL_CLOSE_ID: &str = "com.mumu.launcher:id/close";

/// Fixed settle interval after spawning the emulator process
const SETTLE_INTERVAL: Duration = Duration::from_secs(20);

pub struct MuMuSimulator {
    profile: SessionProfile,
    display: DisplaySettings,
    session: Arc<SessionInstance>,
    probe: Arc<dyn WindowProbe>,
    stage: BootStage,
}

impl MuMuSimulator {
    pub fn new(
        profile: SessionProfile,
        display: DisplaySettings,
        session: Arc<SessionInstance>,
        probe: Arc<dyn WindowProbe>,
    ) -> Self {
        Self {
            profile,
            display,
            session,
            probe,
            stage: BootStage::NotRunning,
        }
    }

    fn set_stage(&mut self, stage: BootStage) {
        debug!("boot stage: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    async fn boot(&mut self) -> bool {
        if self.is_running().await {
            info!("MuMu emulator already running");
            self.set_stage(BootStage::Running);
        } else {
            info!("emulator not running, starting it");
            self.set_stage(BootStage::Starting);
            if !self.start().await {
                error!("starting the MuMu emulator failed");
                return false;
            }
            self.set_stage(BootStage::Running);
        }

        if !self.connect().await {
            error!("connecting to the MuMu emulator failed");
            return false;
        }
        self.set_stage(BootStage::Connected);

        if !self.verify().await {
            return false;
        }
        self.set_stage(BootStage::Verified);

        self.set_stage(BootStage::Ready);
        true
    }

    /// Post-connect checks: display baseline, then the startup interstitial.
    async fn verify(&self) -> bool {
        section("simulator verification - start");
        let ok = self
            .session
            .locator()
            .check_display_resolution(self.display.required_width, self.display.required_height)
            .await
            && self.dismiss_interstitial().await;
        section("simulator verification - end");
        ok
    }

    /// Dismiss the startup interstitial if one is showing. Absence of the
    /// close control means no interstitial — that is success.
    async fn dismiss_interstitial(&self) -> bool {
        info!("checking for a startup interstitial");
        match self
            .session
            .locator()
            .locate(&UiQuery::by_resource_id(INTERSTITIAL_CLOSE_ID))
            .await
        {
            Some(point) => {
                self.session
                    .adb()
                    .tap(point.x, point.y, &TapOptions::default())
                    .await;
                info!("startup interstitial dismissed");
                true
            }
            None => {
                info!("no startup interstitial present");
                true
            }
        }
    }
}

#[async_trait]
impl Simulator for MuMuSimulator {
    async fn run(&mut self) -> bool {
        section("simulator boot - start");
        let ok = self.boot().await;
        section("simulator boot - end");
        ok
    }

    async fn start(&mut self) -> bool {
        let path = &self.profile.emulator_path;
        if !path.exists() {
            error!("emulator path does not exist: {:?}", path);
            return false;
        }

        info!("launching emulator process {:?}", path);
        let mut command = Command::new(path);
        if let Some(dir) = path.parent() {
            command.current_dir(dir);
        }

        match command.spawn() {
            Ok(_child) => {
                // The emulator owns its own lifetime; give it a fixed
                // interval to settle, then trust the window check.
                tokio::time::sleep(SETTLE_INTERVAL).await;
                self.is_running().await
            }
            Err(e) => {
                error!("spawning emulator process failed: {}", e);
                false
            }
        }
    }

    async fn stop(&mut self) -> bool {
        info!("stopping MuMu emulator {}", self.profile.window_name);

        if !self.session.adb().disconnect().await {
            warn!("bridge disconnect failed during stop");
        }

        let ok = self.session.adb().kill_server().await;
        self.set_stage(BootStage::NotRunning);
        ok
    }

    async fn is_running(&self) -> bool {
        info!("checking MuMu emulator running state");
        self.probe
            .is_present(&self.profile.window_class, &self.profile.window_name)
            .await
    }

    async fn connect(&self) -> bool {
        info!("connecting to the MuMu emulator");
        self.session.adb().connect().await
    }

    async fn disconnect(&self) -> bool {
        info!("disconnecting from the MuMu emulator");
        self.session.adb().disconnect().await
    }

    fn stage(&self) -> BootStage {
        self.stage
    }
}

//! Home-Screen App Launcher
//!
//! Multi-page icon search: try the icon on the current screen first, then
//! swipe across home-screen pages using the page indicator to pick a
//! direction, re-trying after every swipe. The search is bounded by the
//! reported page count and reports a boolean — exhaustion is an expected
//! outcome, not an error.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use emupilot_bridge::jitter::TapOptions;
use emupilot_bridge::locator::{Point, ScreenPosition, UiQuery};
use emupilot_bridge::session::SessionInstance;
use emupilot_core::logging::section;

/// Surface the search runs against. Implemented by `SessionInstance`; tests
/// substitute a scripted fake.
#[async_trait]
pub trait LauncherSurface: Send + Sync {
    async fn force_stop(&self, package: &str) -> bool;
    async fn locate_icon(&self, query: &UiQuery) -> Option<Point>;
    async fn tap(&self, point: Point) -> bool;
    async fn swipe_left(&self) -> bool;
    async fn swipe_right(&self) -> bool;
    async fn screen_position(&self) -> Option<ScreenPosition>;
}

#[async_trait]
impl LauncherSurface for SessionInstance {
    async fn force_stop(&self, package: &str) -> bool {
        self.adb().force_stop(package).await
    }

    async fn locate_icon(&self, query: &UiQuery) -> Option<Point> {
        self.locator().locate(query).await
    }

    async fn tap(&self, point: Point) -> bool {
        self.adb().tap(point.x, point.y, &TapOptions::default()).await
    }

    async fn swipe_left(&self) -> bool {
        self.adb().swipe_left().await
    }

    async fn swipe_right(&self) -> bool {
        self.adb().swipe_right().await
    }

    async fn screen_position(&self) -> Option<ScreenPosition> {
        self.locator().screen_position().await
    }
}

/// Icon search over a launcher surface.
pub struct AppLauncher<'a, S: LauncherSurface + ?Sized> {
    surface: &'a S,
}

impl<'a, S: LauncherSurface + ?Sized> AppLauncher<'a, S> {
    pub fn new(surface: &'a S) -> Self {
        Self { surface }
    }

    /// Locate and tap the target icon, swiping across home-screen pages as
    /// needed. Every locate pulls a fresh snapshot.
    pub async fn launch(&self, icon: &UiQuery, package: &str) -> bool {
        section("app launch - start");
        let result = self.search(icon, package).await;
        section("app launch - end");
        result
    }

    async fn search(&self, icon: &UiQuery, package: &str) -> bool {
        // Best-effort: a clean start avoids resuming mid-game screens the
        // locator cannot anchor on.
        self.surface.force_stop(package).await;

        if self.try_launch(icon).await {
            return true;
        }

        let Some(position) = self.surface.screen_position().await else {
            // Without the indicator neither direction nor iteration count
            // can be determined safely.
            warn!("page indicator unavailable, aborting page search");
            return false;
        };

        debug!("page search, up to {} swipe attempts", position.total);
        for attempt in 1..=position.total {
            if position.current > 1 {
                // Off the first page: search left first, alternating.
                if attempt % 2 == 1 {
                    self.surface.swipe_left().await;
                } else {
                    self.surface.swipe_right().await;
                }
            } else {
                // On the first page icons are reachable to the right.
                self.surface.swipe_right().await;
            }

            if self.try_launch(icon).await {
                return true;
            }
        }

        info!("icon {}='{}' not found on any page", icon.attribute, icon.value);
        false
    }

    async fn try_launch(&self, icon: &UiQuery) -> bool {
        info!("trying to locate and launch the target icon");
        match self.surface.locate_icon(icon).await {
            Some(point) => {
                debug!("icon located at ({}, {})", point.x, point.y);
                self.surface.tap(point).await;
                true
            }
            None => {
                debug!("icon not on the current screen");
                false
            }
        }
    }
}

//! Screen Locator
//!
//! Resolves screen coordinates of UI elements from uiautomator layout
//! snapshots: pull a fresh dump, depth-first scan for the first node whose
//! attribute matches the query, return the integer midpoint of its bounds.
//! Snapshots are single-query files named per (port, account) and deleted
//! after every lookup.

use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::adb::AdbBridge;

/// resource-id of the launcher's page indicator node
const PAGE_INDICATOR_ID: &str = "com.mumu.launcher:id/page_indicator";
/// Delimiter between the indicator label and the page text
const PAGE_TEXT_DELIMITER: char = '：';
/// Page text pattern, e.g. "第1屏，共2屏"
const PAGE_TEXT_PATTERN: &str = r"第(\d+)屏，共(\d+)屏";

/// Locator errors
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("layout snapshot pull failed")]
    SnapshotPull,
    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("malformed bounds: {0}")]
    MalformedBounds(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A screen coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Attribute predicate matched against snapshot nodes
#[derive(Debug, Clone)]
pub struct UiQuery {
    pub attribute: String,
    pub value: String,
}

impl UiQuery {
    pub fn new(attribute: &str, value: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    /// Match on the visible text label
    pub fn by_text(value: &str) -> Self {
        Self::new("text", value)
    }

    /// Match on the resource-id
    pub fn by_resource_id(value: &str) -> Self {
        Self::new("resource-id", value)
    }
}

/// Current/total home-screen pages from the page indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenPosition {
    pub current: u32,
    pub total: u32,
}

/// Per-session UI locator built on the device bridge.
pub struct ScreenLocator {
    adb: Arc<AdbBridge>,
    snapshot_dir: PathBuf,
}

impl ScreenLocator {
    pub fn new(adb: Arc<AdbBridge>, snapshot_dir: PathBuf) -> Self {
        Self { adb, snapshot_dir }
    }

    /// Snapshot path unique per (port, account) so concurrent sessions
    /// sharing a filesystem never race on the same file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_dir.join(format!(
            "window_dump_{}_{}.xml",
            self.adb.port(),
            self.adb.account()
        ))
    }

    /// Locate the first node matching `query` and return its center point.
    ///
    /// Pulls a fresh snapshot for every call; the file is removed again in
    /// every outcome. Parse problems are logged and reported as not-found.
    pub async fn locate(&self, query: &UiQuery) -> Option<Point> {
        let path = self.snapshot_path();

        if !self.adb.pull_layout_snapshot(&path).await {
            error!("layout snapshot unavailable, cannot locate node");
            return None;
        }

        info!("searching snapshot for {}='{}'", query.attribute, query.value);
        let xml = match read_and_remove(&path).await {
            Ok(xml) => xml,
            Err(e) => {
                error!("reading layout snapshot failed: {}", e);
                return None;
            }
        };

        match find_node_center(&xml, query) {
            Ok(Some(point)) => {
                debug!(
                    "node {}='{}' located at ({}, {})",
                    query.attribute, query.value, point.x, point.y
                );
                Some(point)
            }
            Ok(None) => {
                debug!("no node with {}='{}'", query.attribute, query.value);
                None
            }
            Err(e) => {
                error!("snapshot scan failed: {}", e);
                None
            }
        }
    }

    /// Read the page indicator. None when the node is missing or its text
    /// does not match the expected format.
    pub async fn screen_position(&self) -> Option<ScreenPosition> {
        let path = self.snapshot_path();

        if !self.adb.pull_layout_snapshot(&path).await {
            error!("layout snapshot unavailable, cannot read page indicator");
            return None;
        }

        let xml = match read_and_remove(&path).await {
            Ok(xml) => xml,
            Err(e) => {
                error!("reading layout snapshot failed: {}", e);
                return None;
            }
        };

        match parse_screen_position(&xml) {
            Some(pos) => {
                info!("home screen page {} of {}", pos.current, pos.total);
                Some(pos)
            }
            None => {
                warn!("page indicator missing or malformed");
                None
            }
        }
    }

    /// Validate the device display against the required baseline.
    ///
    /// Size must reach the target in at least one orientation and the
    /// aspect ratio must match within 1%. Orientation mismatch alone is a
    /// warning, not a failure.
    pub async fn check_display_resolution(&self, target_w: u32, target_h: u32) -> bool {
        info!("checking display resolution");
        let Some((cw, ch)) = self.adb.current_display_resolution().await else {
            error!("display resolution unavailable");
            return false;
        };

        match evaluate_resolution((cw, ch), (target_w, target_h)) {
            ResolutionVerdict::Ok => {
                debug!("resolution ok: {}x{}", cw, ch);
                true
            }
            ResolutionVerdict::OrientationMismatch => {
                warn!(
                    "orientation mismatch: current {}x{}, expected {}x{}",
                    cw,
                    ch,
                    target_w.max(target_h),
                    target_w.min(target_h)
                );
                true
            }
            ResolutionVerdict::TooSmall => {
                error!(
                    "resolution {}x{} below required {}x{}",
                    cw, ch, target_w, target_h
                );
                false
            }
            ResolutionVerdict::RatioMismatch => {
                error!(
                    "aspect ratio mismatch: current {}x{}, required near {}x{}",
                    cw, ch, target_w, target_h
                );
                false
            }
        }
    }
}

/// Resolution check outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolutionVerdict {
    Ok,
    OrientationMismatch,
    TooSmall,
    RatioMismatch,
}

pub(crate) fn evaluate_resolution(current: (u32, u32), target: (u32, u32)) -> ResolutionVerdict {
    let (cw, ch) = current;
    let (tw, th) = target;

    // Size must be sufficient in at least one orientation.
    if (cw < tw && ch < th) || (cw < th && ch < tw) {
        return ResolutionVerdict::TooSmall;
    }

    let ratio = |w: u32, h: u32| w.max(h) as f64 / w.min(h) as f64;
    if (ratio(cw, ch) - ratio(tw, th)).abs() > 0.01 {
        return ResolutionVerdict::RatioMismatch;
    }

    if (cw < ch) != (tw < th) {
        return ResolutionVerdict::OrientationMismatch;
    }

    ResolutionVerdict::Ok
}

/// Read the snapshot then remove it; the file's lifetime is one query.
pub(crate) async fn read_and_remove(path: &std::path::Path) -> Result<String, LocatorError> {
    let xml = tokio::fs::read_to_string(path).await?;
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("removing snapshot {:?} failed: {}", path, e);
    }
    Ok(xml)
}

/// Depth-first scan for the first node whose `query.attribute` equals
/// `query.value`; returns the bounds midpoint. Document order, first match.
pub(crate) fn find_node_center(xml: &str, query: &UiQuery) -> Result<Option<Point>, LocatorError> {
    let doc = roxmltree::Document::parse(xml)?;

    for node in doc.descendants().filter(|n| n.is_element()) {
        if node.attribute(query.attribute.as_str()) != Some(query.value.as_str()) {
            continue;
        }
        if let Some(bounds) = node.attribute("bounds") {
            let (left, top, right, bottom) = parse_bounds(bounds)
                .ok_or_else(|| LocatorError::MalformedBounds(bounds.to_string()))?;
            return Ok(Some(Point {
                x: (left + right) / 2,
                y: (top + bottom) / 2,
            }));
        }
    }

    Ok(None)
}

/// Parse a bounds string of the form `[left,top][right,bottom]`.
pub(crate) fn parse_bounds(bounds: &str) -> Option<(i32, i32, i32, i32)> {
    let mut values = bounds
        .split(['[', ']', ','])
        .filter(|s| !s.is_empty())
        .map(|s| s.trim().parse::<i32>());

    let left = values.next()?.ok()?;
    let top = values.next()?.ok()?;
    let right = values.next()?.ok()?;
    let bottom = values.next()?.ok()?;
    Some((left, top, right, bottom))
}

/// Parse the page indicator's content-desc into a ScreenPosition.
pub(crate) fn parse_screen_position(xml: &str) -> Option<ScreenPosition> {
    let doc = roxmltree::Document::parse(xml).ok()?;

    let indicator = doc
        .descendants()
        .find(|n| n.attribute("resource-id") == Some(PAGE_INDICATOR_ID))?;

    let content_desc = indicator.attribute("content-desc")?;
    if content_desc.is_empty() {
        return None;
    }

    // "当前屏幕：第1屏，共2屏" -> "第1屏，共2屏"
    let page_text = content_desc
        .split(PAGE_TEXT_DELIMITER)
        .nth(1)?
        .split(',')
        .next()?
        .trim();

    let re = Regex::new(PAGE_TEXT_PATTERN).ok()?;
    let caps = re.captures(page_text)?;
    let current = caps.get(1)?.as_str().parse().ok()?;
    let total = caps.get(2)?.as_str().parse().ok()?;
    Some(ScreenPosition { current, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hierarchy rotation="0">
  <node class="android.widget.FrameLayout" bounds="[0,0][1920,1080]">
    <node resource-id="X" text="Sky Trade" class="android.widget.TextView" bounds="[100,200][300,400]"/>
    <node resource-id="X" text="duplicate" class="android.widget.TextView" bounds="[500,500][700,700]"/>
  </node>
</hierarchy>"#;

    #[test]
    fn test_parse_bounds() {
        assert_eq!(parse_bounds("[100,200][300,400]"), Some((100, 200, 300, 400)));
        assert_eq!(parse_bounds("[0,0][1920,1080]"), Some((0, 0, 1920, 1080)));
        assert_eq!(parse_bounds("[100,200]"), None);
        assert_eq!(parse_bounds("garbage"), None);
    }

    #[test]
    fn test_find_node_center_first_match() {
        let query = UiQuery::by_resource_id("X");
        let point = find_node_center(SNAPSHOT, &query).unwrap().unwrap();
        assert_eq!(point, Point { x: 200, y: 300 });
    }

    #[test]
    fn test_find_node_center_by_text() {
        let query = UiQuery::by_text("Sky Trade");
        let point = find_node_center(SNAPSHOT, &query).unwrap().unwrap();
        assert_eq!(point, Point { x: 200, y: 300 });
    }

    #[test]
    fn test_find_node_center_no_match() {
        let query = UiQuery::by_resource_id("missing");
        assert!(find_node_center(SNAPSHOT, &query).unwrap().is_none());
    }

    #[test]
    fn test_find_node_center_malformed_bounds() {
        let xml = r#"<hierarchy><node resource-id="X" bounds="[a,b][c,d]"/></hierarchy>"#;
        let query = UiQuery::by_resource_id("X");
        assert!(matches!(
            find_node_center(xml, &query),
            Err(LocatorError::MalformedBounds(_))
        ));
    }

    #[test]
    fn test_parse_screen_position() {
        let xml = format!(
            r#"<hierarchy><node resource-id="{}" content-desc="当前屏幕：第1屏，共2屏"/></hierarchy>"#,
            PAGE_INDICATOR_ID
        );
        assert_eq!(
            parse_screen_position(&xml),
            Some(ScreenPosition { current: 1, total: 2 })
        );
    }

    #[test]
    fn test_parse_screen_position_missing_or_malformed() {
        assert!(parse_screen_position("<hierarchy/>").is_none());

        let empty = format!(
            r#"<hierarchy><node resource-id="{}" content-desc=""/></hierarchy>"#,
            PAGE_INDICATOR_ID
        );
        assert!(parse_screen_position(&empty).is_none());

        let bad = format!(
            r#"<hierarchy><node resource-id="{}" content-desc="unexpected text"/></hierarchy>"#,
            PAGE_INDICATOR_ID
        );
        assert!(parse_screen_position(&bad).is_none());
    }

    #[test]
    fn test_evaluate_resolution() {
        assert_eq!(
            evaluate_resolution((1920, 1080), (1920, 1080)),
            ResolutionVerdict::Ok
        );
        assert_eq!(
            evaluate_resolution((1080, 1920), (1920, 1080)),
            ResolutionVerdict::OrientationMismatch
        );
        assert_eq!(
            evaluate_resolution((800, 600), (1920, 1080)),
            ResolutionVerdict::TooSmall
        );
        assert_eq!(
            evaluate_resolution((1920, 1440), (1920, 1080)),
            ResolutionVerdict::RatioMismatch
        );
    }

    #[tokio::test]
    async fn test_read_and_remove_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window_dump_16384_test.xml");
        tokio::fs::write(&path, SNAPSHOT).await.unwrap();

        let xml = read_and_remove(&path).await.unwrap();
        assert!(xml.contains("Sky Trade"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_read_and_remove_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.xml");
        assert!(read_and_remove(&path).await.is_err());
    }
}

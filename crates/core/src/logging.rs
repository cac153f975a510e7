//! Logging setup and section banners
//!
//! Thin wrapper over tracing-subscriber plus the rule-line helper used to
//! mark phase boundaries in the session logs.

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG`; falls back to `info` when unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Emit a section banner around a phase boundary.
pub fn section(title: &str) {
    info!("──────── {} ────────", title);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_does_not_panic_without_subscriber() {
        section("boot");
    }
}

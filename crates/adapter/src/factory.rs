//! Adapter Factory
//!
//! Same open-registration shape as the simulator factory: kind string to
//! constructor closure, unknown kind is a synchronous configuration fault.

use std::collections::HashMap;
use std::sync::Arc;

use emupilot_bridge::session::SessionInstance;
use emupilot_core::config::SessionProfile;
use emupilot_plugins::PluginManager;

use crate::generic::GenericAdapter;
use crate::{AdapterError, GameAdapter};

/// Everything an adapter constructor needs.
pub struct AdapterContext {
    pub profile: SessionProfile,
    pub session: Arc<SessionInstance>,
    pub plugins: Arc<PluginManager>,
}

type AdapterCtor = Box<dyn Fn(AdapterContext) -> Box<dyn GameAdapter> + Send + Sync>;

pub struct AdapterFactory {
    ctors: HashMap<String, AdapterCtor>,
}

impl AdapterFactory {
    /// Factory with the built-in kinds registered.
    pub fn new() -> Self {
        let mut factory = Self {
            ctors: HashMap::new(),
        };
        factory.register(
            "generic",
            Box::new(|ctx| Box::new(GenericAdapter::new(ctx.profile, ctx.session, ctx.plugins))),
        );
        factory
    }

    /// Register a constructor for a new kind.
    pub fn register(&mut self, kind: &str, ctor: AdapterCtor) {
        self.ctors.insert(kind.to_string(), ctor);
    }

    /// Create an adapter of the given kind.
    pub fn create(
        &self,
        kind: &str,
        ctx: AdapterContext,
    ) -> Result<Box<dyn GameAdapter>, AdapterError> {
        match self.ctors.get(kind) {
            Some(ctor) => Ok(ctor(ctx)),
            None => Err(AdapterError::UnsupportedKind(kind.to_string())),
        }
    }

    /// Registered kind names.
    pub fn supported_kinds(&self) -> Vec<&str> {
        self.ctors.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for AdapterFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emupilot_bridge::session::{SessionRegistry, SessionSettings, WorkerId};
    use emupilot_core::config::{AdbSettings, JitterSettings};

    fn context() -> AdapterContext {
        let registry = SessionRegistry::new(SessionSettings {
            adb: AdbSettings::default(),
            jitter: JitterSettings::default(),
            snapshot_dir: std::env::temp_dir().join("emupilot-test"),
            ocr_binary: None,
        });
        AdapterContext {
            profile: SessionProfile::default(),
            session: registry.acquire(16384, "test", WorkerId::next()),
            plugins: Arc::new(PluginManager::new()),
        }
    }

    #[test]
    fn test_unknown_kind_is_a_config_fault() {
        let factory = AdapterFactory::new();
        assert!(matches!(
            factory.create("star_trade", context()),
            Err(AdapterError::UnsupportedKind(_))
        ));
    }

    #[test]
    fn test_builtin_kind_creates() {
        let factory = AdapterFactory::new();
        assert!(factory.create("generic", context()).is_ok());
        assert!(factory.supported_kinds().contains(&"generic"));
    }
}

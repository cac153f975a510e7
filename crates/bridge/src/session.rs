//! Session Instances and Registry
//!
//! One SessionInstance bundles the controllers for a single (port, account)
//! pair. The registry hands out exactly one instance per
//! (port, account, worker) key and is the sole owner of their lifecycle:
//! instances are created lazily on first acquire and torn down only through
//! an explicit release. The registry is constructed once at process start
//! and passed by handle — there is no global.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use emupilot_core::config::{AdbSettings, AppConfig, JitterSettings};

use crate::adb::AdbBridge;
use crate::locator::ScreenLocator;
use crate::ocr::{OcrClient, TextRecognizer};

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque id of the worker task owning a session.
///
/// Workers are tokio tasks, so OS thread ids are not stable owner
/// identities; each worker draws one id at spawn and uses it for every
/// registry call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(u64);

impl WorkerId {
    /// Draw a fresh process-unique id.
    pub fn next() -> Self {
        Self(NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Registry key: one live instance per (port, account, owner)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub port: u16,
    pub account: String,
    pub owner: WorkerId,
}

/// Everything needed to construct session controllers
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub adb: AdbSettings,
    pub jitter: JitterSettings,
    pub snapshot_dir: PathBuf,
    pub ocr_binary: Option<PathBuf>,
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            adb: config.adb.clone(),
            jitter: config.jitter.clone(),
            snapshot_dir: config.snapshot_dir(),
            ocr_binary: config.ocr.binary.clone(),
        }
    }
}

/// Controller bundle for one (port, account) pair, owned by one worker.
pub struct SessionInstance {
    port: u16,
    account: String,
    adb: Arc<AdbBridge>,
    locator: ScreenLocator,
    ocr: Option<Arc<dyn TextRecognizer>>,
}

impl SessionInstance {
    fn new(settings: &SessionSettings, port: u16, account: &str) -> Self {
        let adb = Arc::new(AdbBridge::new(&settings.adb, &settings.jitter, port, account));
        let locator = ScreenLocator::new(Arc::clone(&adb), settings.snapshot_dir.clone());
        let ocr: Option<Arc<dyn TextRecognizer>> = settings
            .ocr_binary
            .as_ref()
            .map(|binary| Arc::new(OcrClient::new(binary.clone())) as Arc<dyn TextRecognizer>);

        Self {
            port,
            account: account.to_string(),
            adb,
            locator,
            ocr,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn adb(&self) -> &AdbBridge {
        &self.adb
    }

    pub fn locator(&self) -> &ScreenLocator {
        &self.locator
    }

    pub fn ocr(&self) -> Option<&Arc<dyn TextRecognizer>> {
        self.ocr.as_ref()
    }

    /// Release device-side resources. Called by the registry on release.
    pub async fn cleanup(&self) {
        self.adb.disconnect().await;
    }
}

/// Concurrency-safe factory and cache of session instances.
///
/// The map mutex is held only for lookup/insert/remove. Instance
/// construction performs no I/O (the bridge connects later), so
/// constructing under the lock still publishes exactly one instance per
/// key without stalling other sessions.
pub struct SessionRegistry {
    settings: SessionSettings,
    sessions: Mutex<HashMap<SessionKey, Arc<SessionInstance>>>,
}

impl SessionRegistry {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached instance for this key, constructing it on first use.
    pub fn acquire(&self, port: u16, account: &str, owner: WorkerId) -> Arc<SessionInstance> {
        let key = SessionKey {
            port,
            account: account.to_string(),
            owner,
        };

        let mut sessions = self.sessions.lock();
        if let Some(instance) = sessions.get(&key) {
            return Arc::clone(instance);
        }

        debug!("creating session instance for {}:{} ({:?})", port, account, owner);
        let instance = Arc::new(SessionInstance::new(&self.settings, port, account));
        sessions.insert(key, Arc::clone(&instance));
        instance
    }

    /// Tear down and evict the instance for this key. The entry is removed
    /// under the lock; the disconnect runs after the lock is dropped.
    pub async fn release(&self, port: u16, account: &str, owner: WorkerId) -> bool {
        let key = SessionKey {
            port,
            account: account.to_string(),
            owner,
        };

        let instance = self.sessions.lock().remove(&key);
        match instance {
            Some(instance) => {
                info!("releasing session instance for {}:{}", port, account);
                instance.cleanup().await;
                true
            }
            None => false,
        }
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(SessionSettings {
            adb: AdbSettings::default(),
            jitter: JitterSettings::default(),
            snapshot_dir: std::env::temp_dir().join("emupilot-test"),
            ocr_binary: None,
        })
    }

    #[test]
    fn test_same_key_returns_identical_instance() {
        let registry = registry();
        let owner = WorkerId::next();

        let a = registry.acquire(16384, "alice", owner);
        let b = registry.acquire(16384, "alice", owner);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_keys_return_distinct_instances() {
        let registry = registry();
        let owner = WorkerId::next();

        let a = registry.acquire(16384, "alice", owner);
        let b = registry.acquire(16416, "alice", owner);
        let c = registry.acquire(16384, "bob", owner);
        // Same port and account under a different owner is still distinct.
        let d = registry.acquire(16384, "alice", WorkerId::next());

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(!Arc::ptr_eq(&a, &d));
        assert_eq!(registry.len(), 4);
    }

    #[tokio::test]
    async fn test_release_evicts() {
        let registry = registry();
        let owner = WorkerId::next();

        let a = registry.acquire(16384, "alice", owner);
        assert!(registry.release(16384, "alice", owner).await);
        assert!(registry.is_empty());

        // A fresh acquire constructs a new instance.
        let b = registry.acquire(16384, "alice", owner);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_release_unknown_key() {
        let registry = registry();
        assert!(!registry.release(1, "nobody", WorkerId::next()).await);
    }

    #[test]
    fn test_worker_ids_are_unique() {
        let a = WorkerId::next();
        let b = WorkerId::next();
        assert_ne!(a, b);
    }
}

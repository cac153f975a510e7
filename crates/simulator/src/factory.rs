//! Simulator Factory
//!
//! Maps a kind string to a registered constructor closure so new emulator
//! kinds can be added without editing the factory. An unknown kind is a
//! configuration fault raised synchronously at creation time.

use std::collections::HashMap;
use std::sync::Arc;

use emupilot_bridge::session::SessionInstance;
use emupilot_core::config::{DisplaySettings, SessionProfile};

use crate::mumu::MuMuSimulator;
use crate::window::WindowProbe;
use crate::{Simulator, SimulatorError};

/// Everything a simulator constructor needs.
pub struct SimulatorContext {
    pub profile: SessionProfile,
    pub display: DisplaySettings,
    pub session: Arc<SessionInstance>,
    pub probe: Arc<dyn WindowProbe>,
}

type SimulatorCtor = Box<dyn Fn(SimulatorContext) -> Box<dyn Simulator> + Send + Sync>;

pub struct SimulatorFactory {
    ctors: HashMap<String, SimulatorCtor>,
}

impl SimulatorFactory {
    /// Factory with the built-in kinds registered.
    pub fn new() -> Self {
        let mut factory = Self {
            ctors: HashMap::new(),
        };
        factory.register(
            "mumu",
            Box::new(|ctx| {
                Box::new(MuMuSimulator::new(
                    ctx.profile,
                    ctx.display,
                    ctx.session,
                    ctx.probe,
                ))
            }),
        );
        factory
    }

    /// Register a constructor for a new kind. Re-registering a kind
    /// replaces the previous constructor.
    pub fn register(&mut self, kind: &str, ctor: SimulatorCtor) {
        self.ctors.insert(kind.to_string(), ctor);
    }

    /// Create a simulator of the given kind.
    pub fn create(
        &self,
        kind: &str,
        ctx: SimulatorContext,
    ) -> Result<Box<dyn Simulator>, SimulatorError> {
        match self.ctors.get(kind) {
            Some(ctor) => Ok(ctor(ctx)),
            None => Err(SimulatorError::UnsupportedKind(kind.to_string())),
        }
    }

    /// Registered kind names.
    pub fn supported_kinds(&self) -> Vec<&str> {
        self.ctors.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for SimulatorFactory {
    fn default() -> Self {
        Self::new()
    }
}

//! EmuPilot Plugin Framework
//!
//! Discrete units of automation work with priority-ordered batch execution,
//! cooperative pause/resume/stop, and an interactive error-resolution hook.
//! Plugins are registered explicitly — there is no code scanning.

pub mod manager;
pub mod plugin;
pub mod resolver;

pub use manager::{PluginInfo, PluginManager};
pub use plugin::{
    Plugin, PluginContext, PluginControl, PluginError, PluginParams, PluginReport, PluginStatus,
};
pub use resolver::{ErrorIncident, ErrorResolver, Resolution};

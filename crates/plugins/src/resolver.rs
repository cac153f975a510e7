//! Interactive Error Resolution
//!
//! When a plugin body faults, control passes to an external resolver with
//! the plugin name, the fault message and its context. The resolution
//! drives what happens next; `Retry` is bounded by an explicit ceiling the
//! caller chooses — an always-retry resolver cannot recurse forever.

use tracing::{error, info, warn};

use crate::manager::PluginManager;
use crate::plugin::{PluginError, PluginParams, PluginReport};

/// What the resolver decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The problem was fixed externally; synthesize a success result
    Resolved,
    /// Run the same execution again
    Retry,
    /// Skip this plugin; synthesize a skipped result
    Skip,
    /// Abort the whole batch; propagates out of the manager
    Stop,
    /// Leave the failure as an error result
    Fail,
}

/// Fault context handed to the resolver
#[derive(Debug, Clone)]
pub struct ErrorIncident {
    pub plugin: String,
    pub message: String,
    pub account: String,
    pub category: String,
}

/// External collaborator deciding what to do about a plugin fault.
pub trait ErrorResolver: Send + Sync {
    fn resolve(&self, incident: &ErrorIncident) -> Resolution;
}

impl PluginManager {
    /// Execute with interactive error escalation.
    ///
    /// Usage faults (NotFound, NotExecutable) propagate unchanged; only a
    /// fault inside the plugin body reaches the resolver. `max_retries`
    /// bounds the number of re-invocations a `Retry` resolution can cause;
    /// an exhausted budget is surfaced as an error report.
    pub async fn execute_with_resolution(
        &self,
        name: &str,
        params: &PluginParams,
        resolver: &dyn ErrorResolver,
        max_retries: u32,
    ) -> Result<PluginReport, PluginError> {
        let mut retries = 0;
        loop {
            let message = match self.execute(name, params).await {
                Ok(report) => return Ok(report),
                Err(PluginError::Failed { message, .. }) => message,
                Err(e) => return Err(e),
            };

            let (account, category) = match self.get(name) {
                Some(plugin) => (
                    plugin.context().account.clone(),
                    plugin.category().to_string(),
                ),
                None => (String::new(), String::new()),
            };
            let incident = ErrorIncident {
                plugin: name.to_string(),
                message,
                account,
                category,
            };

            match resolver.resolve(&incident) {
                Resolution::Resolved => {
                    info!("operator resolved the {} fault, continuing", name);
                    return Ok(PluginReport::user_resolved(name, &incident.account));
                }
                Resolution::Retry => {
                    if retries >= max_retries {
                        warn!(
                            "plugin {} retry budget exhausted after {} retries",
                            name, max_retries
                        );
                        return Ok(PluginReport::error(
                            name,
                            &incident.account,
                            format!(
                                "retry budget exhausted after {} retries: {}",
                                max_retries, incident.message
                            ),
                        ));
                    }
                    retries += 1;
                    info!("operator chose retry for {} ({}/{})", name, retries, max_retries);
                }
                Resolution::Skip => {
                    info!("operator skipped plugin {}", name);
                    return Ok(PluginReport::skipped(name, &incident.account));
                }
                Resolution::Stop => {
                    error!("operator stopped all tasks at plugin {}", name);
                    return Err(PluginError::Aborted(name.to_string()));
                }
                Resolution::Fail => {
                    return Ok(PluginReport::error(name, &incident.account, incident.message));
                }
            }
        }
    }
}

//! EmuPilot entry point
//!
//! Loads the configuration, builds the shared session registry, and runs
//! one worker per configured session profile. Each worker reports a single
//! boolean; configuration faults abort the worker immediately, everything
//! else is a logged failure.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{error, info, info_span, Instrument};

use emupilot::{APP_NAME, VERSION};
use emupilot_adapter::{AdapterContext, AdapterFactory, GameAdapter, TapControlPlugin};
use emupilot_bridge::session::{SessionRegistry, SessionSettings, WorkerId};
use emupilot_core::config::{AppConfig, DisplaySettings, SessionProfile};
use emupilot_plugins::{PluginContext, PluginManager};
use emupilot_simulator::{
    CommandWindowProbe, Simulator, SimulatorContext, SimulatorFactory, WindowProbe,
};

#[tokio::main]
async fn main() -> Result<()> {
    emupilot_core::logging::init();
    info!("{} v{} starting...", APP_NAME, VERSION);

    let config = AppConfig::load().await?;
    if config.sessions.is_empty() {
        info!("no session profiles configured, nothing to do");
        return Ok(());
    }

    let registry = Arc::new(SessionRegistry::new(SessionSettings::from(&config)));
    let simulators = Arc::new(SimulatorFactory::new());
    let adapters = Arc::new(AdapterFactory::new());
    let probe: Arc<dyn WindowProbe> = Arc::new(CommandWindowProbe);

    let mut workers = Vec::new();
    for profile in config.sessions.clone() {
        let span = info_span!("session", port = profile.port, account = %profile.account);
        let worker = run_session(
            profile,
            config.display.clone(),
            Arc::clone(&registry),
            Arc::clone(&simulators),
            Arc::clone(&adapters),
            Arc::clone(&probe),
        );
        workers.push(tokio::spawn(worker.instrument(span)));
    }

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for outcome in join_all(workers).await {
        match outcome {
            Ok(true) => succeeded += 1,
            Ok(false) => failed += 1,
            Err(e) => {
                error!("session worker panicked: {}", e);
                failed += 1;
            }
        }
    }

    info!("sessions finished: {} succeeded, {} failed", succeeded, failed);
    Ok(())
}

/// Drive one session end to end: boot, launch, login, tasks, release.
async fn run_session(
    profile: SessionProfile,
    display: DisplaySettings,
    registry: Arc<SessionRegistry>,
    simulators: Arc<SimulatorFactory>,
    adapters: Arc<AdapterFactory>,
    probe: Arc<dyn WindowProbe>,
) -> bool {
    let worker = WorkerId::next();
    let session = registry.acquire(profile.port, &profile.account, worker);

    let mut simulator = match simulators.create(
        &profile.simulator,
        SimulatorContext {
            profile: profile.clone(),
            display,
            session: Arc::clone(&session),
            probe,
        },
    ) {
        Ok(simulator) => simulator,
        Err(e) => {
            error!("{}", e);
            registry.release(profile.port, &profile.account, worker).await;
            return false;
        }
    };

    let mut ok = simulator.run().await;

    if ok {
        let plugins = Arc::new(PluginManager::new());
        plugins.register(Arc::new(TapControlPlugin::new(PluginContext::new(
            Arc::clone(&session),
        ))));

        match adapters.create(
            &profile.adapter,
            AdapterContext {
                profile: profile.clone(),
                session: Arc::clone(&session),
                plugins: Arc::clone(&plugins),
            },
        ) {
            Ok(mut adapter) => {
                ok = adapter.launch_game().await
                    && adapter.login().await
                    && adapter.run_tasks(&profile.tasks).await;
            }
            Err(e) => {
                error!("{}", e);
                ok = false;
            }
        }

        plugins.unregister_all();
    }

    registry.release(profile.port, &profile.account, worker).await;
    info!("session finished: {}", if ok { "success" } else { "failure" });
    ok
}

//! squid-ingress-cache operator entry point.
//!
//! The host runtime starts one process per hook. We work out which hook
//! fired, run the reconciler once and persist its state for the next hook.

use log::{error, info, warn};

mod backend;
mod config;
mod event;
mod reconciler;
mod relation;
mod render;
mod resolver;
mod runtime;
mod state;
mod types;

use backend::{FileBackend, HookTools, ModelBackend};
use config::{BackendKind, Config};
use event::EventKind;
use reconciler::{report_unreachable_workload, Reconciler};
use runtime::DockerRuntime;
use state::ReconcileState;

async fn run<B: ModelBackend>(backend: B, cfg: &Config, event: &EventKind) -> anyhow::Result<()> {
    let mut state = ReconcileState::load(&cfg.state_path).await;
    let workload = match DockerRuntime::connect(cfg.workload.clone()) {
        Ok(workload) => workload,
        Err(e) => {
            error!("Cannot reach workload runtime: {}", e);
            let status = report_unreachable_workload(&backend, &mut state, event).await;
            info!("Finished {:?} with status {}", event, status);
            return state.save(&cfg.state_path).await;
        }
    };

    let mut reconciler = Reconciler::new(backend, workload, cfg, state);
    let status = reconciler.handle_event(event).await;
    info!(
        "Finished {:?} in phase {:?} with status {}",
        event,
        reconciler.phase(),
        status
    );

    reconciler.state().save(&cfg.state_path).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    // Load configuration
    let cfg = Config::load()?;
    info!("Starting squid-ingress-cache with config: {:?}", cfg);

    let event = match EventKind::from_env(&cfg.workload.container) {
        Ok(event) => event,
        Err(e) => {
            warn!("Nothing to do: {}", e);
            return Ok(());
        }
    };

    let result = match cfg.backend {
        BackendKind::HookTools => run(HookTools::new(cfg.app_name.clone()), &cfg, &event).await,
        BackendKind::File => {
            let backend = FileBackend::open(&cfg.relation_data_path).await?;
            run(backend, &cfg, &event).await
        }
    };
    if let Err(e) = &result {
        error!("Hook {:?} failed: {}", event, e);
    }
    result
}

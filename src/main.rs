//! Lead desk service: binary entrypoint.
//! Boots the Axum HTTP server, wiring the desk, metrics, and the optional
//! harvest scheduler.

use std::sync::Arc;

use buzz_lead_desk::ingest::config::load_harvest_config_default;
use buzz_lead_desk::ingest::scheduler::{spawn_harvest_scheduler, HarvestSchedulerCfg};
use buzz_lead_desk::metrics::Metrics;
use buzz_lead_desk::{api, desk_from_config, AppState};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - LEADS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("LEADS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("harvest=info,desk=info,recipe=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let harvest_cfg = load_harvest_config_default()?;
    let metrics = Metrics::install()?;

    let desk = desk_from_config(&harvest_cfg)?;
    let state = AppState::new(desk);

    if let Some(cfg) = HarvestSchedulerCfg::from_env() {
        tracing::info!(interval_secs = cfg.interval_secs, "harvest scheduler enabled");
        spawn_harvest_scheduler(cfg, Arc::clone(&state.desk));
    }

    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}

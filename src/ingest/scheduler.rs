// src/ingest/scheduler.rs
use crate::desk::LeadDesk;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const ENV_HARVEST_INTERVAL_SECS: &str = "HARVEST_INTERVAL_SECS";

#[derive(Clone, Copy, Debug)]
pub struct HarvestSchedulerCfg {
    pub interval_secs: u64,
}

impl HarvestSchedulerCfg {
    /// `$HARVEST_INTERVAL_SECS` when set to a positive number.
    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_HARVEST_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&s| s > 0)
            .map(|interval_secs| Self { interval_secs })
    }
}

/// Spawn a background task that harvests on a fixed interval. The first tick
/// fires immediately.
pub fn spawn_harvest_scheduler(cfg: HarvestSchedulerCfg, desk: Arc<LeadDesk>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match desk.harvest().await {
                Ok((leads, report)) => tracing::info!(
                    target: "harvest",
                    kept = leads.len(),
                    dedup = report.dedup_dropped,
                    failed = report.failed_sources().len(),
                    "scheduled harvest tick"
                ),
                Err(e) => tracing::warn!(target: "harvest", error = %e, "scheduled harvest failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn interval_from_env_requires_positive_number() {
        std::env::set_var(ENV_HARVEST_INTERVAL_SECS, "0");
        assert!(HarvestSchedulerCfg::from_env().is_none());
        std::env::set_var(ENV_HARVEST_INTERVAL_SECS, "900");
        assert_eq!(HarvestSchedulerCfg::from_env().map(|c| c.interval_secs), Some(900));
        std::env::remove_var(ENV_HARVEST_INTERVAL_SECS);
        assert!(HarvestSchedulerCfg::from_env().is_none());
    }
}

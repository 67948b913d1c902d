// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod desk;
pub mod error;
pub mod ingest;
pub mod lead;
pub mod metrics;
pub mod recipe;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::desk::LeadDesk;
pub use crate::error::{LeadError, LeadResult};
pub use crate::lead::{Lead, LeadStatus, LeadType};

use crate::config::recipe::RecipeConfig;
use crate::ingest::config::HarvestConfig;
use crate::ingest::Aggregator;
use crate::recipe::build_generator;
use crate::store::LeadStore;
use tracing::{info, warn};

/// Wire a desk around an already loaded harvest config. A broken recipe config
/// disables generation instead of failing startup.
pub fn desk_from_config(harvest_cfg: &HarvestConfig) -> anyhow::Result<LeadDesk> {
    let recipe_cfg = RecipeConfig::load_default().unwrap_or_else(|e| {
        warn!(error = ?e, "recipe config unusable; generation disabled");
        RecipeConfig::default()
    });

    let aggregator = Aggregator::from_config(harvest_cfg);
    let store = LeadStore::from_env()?;
    let generator = build_generator(&recipe_cfg);
    info!(
        providers = ?aggregator.provider_names(),
        recipe_provider = generator.provider_name(),
        enforce_workflow = harvest_cfg.enforce_workflow,
        "lead desk configured"
    );

    Ok(LeadDesk::new(aggregator, store, generator)
        .with_workflow_enforced(harvest_cfg.enforce_workflow))
}

// src/ingest/types.rs
use anyhow::Result;

use crate::lead::LeadDraft;

/// One harvest source. Implementations return their leads in the source's own
/// ranking order; errors are absorbed by the aggregator.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<LeadDraft>>;
    fn name(&self) -> &'static str;
}

/// Outcome of a single provider within one harvest.
#[derive(Debug, Clone, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ProviderOutcome {
    Ok { provider: String, leads: usize },
    Failed { provider: String, error: String },
    TimedOut { provider: String },
}

impl ProviderOutcome {
    pub fn provider(&self) -> &str {
        match self {
            ProviderOutcome::Ok { provider, .. }
            | ProviderOutcome::Failed { provider, .. }
            | ProviderOutcome::TimedOut { provider } => provider,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ProviderOutcome::Ok { .. })
    }
}

/// Summary of one aggregator run, returned alongside the ranked leads.
#[derive(Debug, Clone, Default, serde::Serialize, PartialEq, Eq)]
pub struct HarvestReport {
    pub outcomes: Vec<ProviderOutcome>,
    pub fetched: usize,
    pub dedup_dropped: usize,
}

impl HarvestReport {
    pub fn failed_sources(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_ok())
            .map(|o| o.provider())
            .collect()
    }
}

//! Lead desk: the editorial operations over harvested leads.
//!
//! Each operation appends exactly one provenance entry per lead it mutates
//! and either applies fully or not at all.

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{LeadError, LeadResult};
use crate::ingest::types::HarvestReport;
use crate::ingest::Aggregator;
use crate::lead::{Lead, LeadStatus, ProvenanceAction};
use crate::recipe::DynRecipeGenerator;
use crate::store::LeadStore;

/// Provenance user recorded for harvested leads.
pub const HARVEST_USER: &str = "AI_Scanner_Bot";
/// Provenance user recorded for recipe generation.
pub const RECIPE_USER: &str = "AI_Recipe_Engine";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_gauge!("leads_in_store", "Leads currently held by the store.");
        describe_counter!("lead_status_changes_total", "Accepted lead status changes.");
        describe_counter!("recipe_generations_total", "Recipes generated and stored.");
        describe_counter!(
            "recipe_failures_total",
            "Recipe generations that failed upstream."
        );
    });
}

pub struct LeadDesk {
    aggregator: Aggregator,
    store: LeadStore,
    recipes: DynRecipeGenerator,
    enforce_workflow: bool,
}

impl LeadDesk {
    pub fn new(aggregator: Aggregator, store: LeadStore, recipes: DynRecipeGenerator) -> Self {
        ensure_metrics_described();
        Self {
            aggregator,
            store,
            recipes,
            enforce_workflow: true,
        }
    }

    /// `false` accepts any status after any other.
    pub fn with_workflow_enforced(mut self, enforce: bool) -> Self {
        self.enforce_workflow = enforce;
        self
    }

    pub fn store(&self) -> &LeadStore {
        &self.store
    }

    /// Run the aggregator and persist every returned lead as a new record.
    /// Source failures are in the report, never in the error.
    pub async fn harvest(&self) -> LeadResult<(Vec<Lead>, HarvestReport)> {
        let (drafts, report) = self.aggregator.run_once().await;
        let now = Utc::now();
        let leads: Vec<Lead> = drafts
            .into_iter()
            .map(|d| Lead::from_draft(d, HARVEST_USER, now))
            .collect();

        self.store.insert_many(leads.clone())?;
        gauge!("leads_in_store").set(self.store.len() as f64);

        let failed = report.failed_sources();
        if !failed.is_empty() {
            warn!(target: "desk", failed = ?failed, "harvest finished with failed sources");
        }
        info!(
            target: "desk",
            kept = leads.len(),
            fetched = report.fetched,
            dedup = report.dedup_dropped,
            "harvest stored"
        );
        Ok((leads, report))
    }

    pub fn get(&self, id: Uuid) -> LeadResult<Lead> {
        self.store.get(id)
    }

    pub fn list(&self, status: Option<LeadStatus>) -> LeadResult<Vec<Lead>> {
        self.store.list(status)
    }

    /// Ask the generator for a draft and store it, replacing any previous one.
    /// On failure the existing recipe is left untouched and nothing is logged
    /// to provenance.
    pub async fn generate_recipe(&self, id: Uuid) -> LeadResult<Lead> {
        let lead = self.store.get(id)?;
        let excerpt = lead
            .evidence
            .first()
            .map(|e| e.snippet.clone())
            .unwrap_or_default();

        let recipe = match self.recipes.generate(&lead.title, &excerpt).await {
            Ok(r) => r,
            Err(e) => {
                counter!("recipe_failures_total").increment(1);
                warn!(
                    target: "recipe",
                    %id,
                    provider = self.recipes.provider_name(),
                    error = %e,
                    "recipe generation failed"
                );
                return Err(LeadError::GenerationFailed(e.to_string()));
            }
        };

        let updated = self.store.update(id, |l| {
            l.content_recipe = Some(recipe);
            l.record(
                ProvenanceAction::AiGenerated,
                RECIPE_USER,
                Some(format!("Recipe generated by {}", self.recipes.provider_name())),
                Utc::now(),
            );
            Ok(())
        })?;
        counter!("recipe_generations_total").increment(1);
        info!(target: "desk", %id, "recipe stored");
        Ok(updated)
    }

    /// Set the status; claiming also assigns the acting user as editor.
    /// Same-state moves are allowed and still logged. Concurrent changes to one
    /// lead resolve last-writer-wins.
    pub fn set_status(&self, id: Uuid, status: LeadStatus, user: &str) -> LeadResult<Lead> {
        let enforce = self.enforce_workflow;
        let updated = self.store.update(id, |l| {
            if enforce && !l.status.can_transition_to(status) {
                return Err(LeadError::InvalidTransition {
                    from: l.status,
                    to: status,
                });
            }
            l.status = status;
            if status == LeadStatus::Claimed {
                l.assigned_editor = Some(user.to_string());
            }
            l.record(
                ProvenanceAction::StatusChange,
                user,
                Some(format!("Changed status to {status}")),
                Utc::now(),
            );
            Ok(())
        })?;
        counter!("lead_status_changes_total").increment(1);
        info!(target: "desk", %id, %status, user, "status changed");
        Ok(updated)
    }
}

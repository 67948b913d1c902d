// tests/desk_workflow.rs
mod common;

use std::sync::Arc;

use buzz_lead_desk::desk::{HARVEST_USER, RECIPE_USER};
use buzz_lead_desk::ingest::types::SourceProvider;
use buzz_lead_desk::lead::{LeadStatus, ProvenanceAction};
use buzz_lead_desk::recipe::{DisabledGenerator, RecipeGenerator};
use buzz_lead_desk::LeadError;
use common::{desk_with, draft, CountingGenerator, FailingProvider, FlakyGenerator, StaticProvider};
use uuid::Uuid;

fn providers() -> Vec<Arc<dyn SourceProvider>> {
    vec![
        Arc::new(FailingProvider("Google Trends")),
        Arc::new(StaticProvider {
            name: "RSS",
            leads: vec![
                draft("Zendaya's Vintage Versace Moment", "TMZ", 84),
                draft("Pop star trademark filing", "E! News", 72),
            ],
        }),
    ]
}

#[tokio::test]
async fn harvest_persists_leads_with_one_harvest_entry_each() {
    let desk = desk_with(providers(), Arc::new(DisabledGenerator));
    let (leads, report) = desk.harvest().await.expect("partial failure is success");

    assert_eq!(leads.len(), 2);
    assert_eq!(report.failed_sources(), vec!["Google Trends"]);
    assert_eq!(desk.store().len(), 2);
    for l in desk.list(None).unwrap() {
        assert_eq!(l.status, LeadStatus::New);
        assert_eq!(l.provenance().len(), 1);
        assert_eq!(l.provenance()[0].action, ProvenanceAction::Harvested);
        assert_eq!(l.provenance()[0].user, HARVEST_USER);
    }
}

#[tokio::test]
async fn claim_sets_editor_and_appends_exactly_one_entry() {
    let desk = desk_with(providers(), Arc::new(DisabledGenerator));
    let (leads, _) = desk.harvest().await.unwrap();
    let id = leads[0].id;

    let l = desk.set_status(id, LeadStatus::Claimed, "Alice").unwrap();
    assert_eq!(l.status, LeadStatus::Claimed);
    assert_eq!(l.assigned_editor.as_deref(), Some("Alice"));
    assert_eq!(l.provenance().len(), 2);
    let last = l.provenance().last().unwrap();
    assert_eq!(last.action, ProvenanceAction::StatusChange);
    assert_eq!(last.user, "Alice");
    assert_eq!(last.details.as_deref(), Some("Changed status to claimed"));
    assert_eq!(l.score(), leads[0].score(), "score never recomputed");
}

#[tokio::test]
async fn same_state_move_is_still_logged() {
    let desk = desk_with(providers(), Arc::new(DisabledGenerator));
    let (leads, _) = desk.harvest().await.unwrap();
    let id = leads[0].id;

    let l = desk.set_status(id, LeadStatus::New, "Bob").unwrap();
    assert_eq!(l.status, LeadStatus::New);
    assert_eq!(l.provenance().len(), 2);
}

#[tokio::test]
async fn unknown_id_is_not_found_and_logs_nothing() {
    let desk = desk_with(providers(), Arc::new(DisabledGenerator));
    desk.harvest().await.unwrap();
    let before: usize = desk.list(None).unwrap().iter().map(|l| l.provenance().len()).sum();

    let ghost = Uuid::new_v4();
    let err = desk.set_status(ghost, LeadStatus::Claimed, "Alice").unwrap_err();
    assert!(matches!(err, LeadError::NotFound(id) if id == ghost));

    let after: usize = desk.list(None).unwrap().iter().map(|l| l.provenance().len()).sum();
    assert_eq!(before, after);
}

#[tokio::test]
async fn workflow_rejects_skips_and_leaves_lead_untouched() {
    let desk = desk_with(providers(), Arc::new(DisabledGenerator));
    let (leads, _) = desk.harvest().await.unwrap();
    let id = leads[0].id;

    let err = desk.set_status(id, LeadStatus::Published, "Alice").unwrap_err();
    assert!(matches!(
        err,
        LeadError::InvalidTransition {
            from: LeadStatus::New,
            to: LeadStatus::Published
        }
    ));
    let l = desk.get(id).unwrap();
    assert_eq!(l.status, LeadStatus::New);
    assert_eq!(l.provenance().len(), 1);

    desk.set_status(id, LeadStatus::Claimed, "Alice").unwrap();
    desk.set_status(id, LeadStatus::Drafted, "Alice").unwrap();
    let l = desk.set_status(id, LeadStatus::Published, "Chief").unwrap();
    assert_eq!(l.status, LeadStatus::Published);
    assert_eq!(l.assigned_editor.as_deref(), Some("Alice"));
    assert!(desk.set_status(id, LeadStatus::Rejected, "Chief").is_err());
}

#[tokio::test]
async fn permissive_mode_accepts_any_transition() {
    let desk = desk_with(providers(), Arc::new(DisabledGenerator)).with_workflow_enforced(false);
    let (leads, _) = desk.harvest().await.unwrap();
    let id = leads[0].id;

    desk.set_status(id, LeadStatus::Published, "Alice").unwrap();
    let l = desk.set_status(id, LeadStatus::New, "Alice").unwrap();
    assert_eq!(l.status, LeadStatus::New);
    assert_eq!(l.provenance().len(), 3);
}

#[tokio::test]
async fn recipe_twice_keeps_latest_and_logs_both() {
    let generator = Arc::new(CountingGenerator::default());
    let desk = desk_with(providers(), generator.clone() as Arc<dyn RecipeGenerator>);
    let (leads, _) = desk.harvest().await.unwrap();
    let id = leads[0].id;

    desk.generate_recipe(id).await.unwrap();
    let l = desk.generate_recipe(id).await.unwrap();

    let recipe = l.content_recipe.as_ref().expect("recipe stored");
    assert!(recipe.title.ends_with("(draft 2)"));
    let generated: Vec<_> = l
        .provenance()
        .iter()
        .filter(|p| p.action == ProvenanceAction::AiGenerated)
        .collect();
    assert_eq!(generated.len(), 2);
    assert!(generated.iter().all(|p| p.user == RECIPE_USER));
}

#[tokio::test]
async fn failed_generation_preserves_previous_recipe() {
    let desk = desk_with(providers(), Arc::new(FlakyGenerator::default()));
    let (leads, _) = desk.harvest().await.unwrap();
    let id = leads[0].id;

    let first = desk.generate_recipe(id).await.unwrap();
    let err = desk.generate_recipe(id).await.unwrap_err();
    assert!(matches!(err, LeadError::GenerationFailed(_)));
    assert!(err.is_retryable());

    let l = desk.get(id).unwrap();
    assert_eq!(l.content_recipe, first.content_recipe);
    assert_eq!(l.provenance().len(), 2, "harvested + one ai_generated");
}

#[tokio::test]
async fn recipe_for_unknown_lead_is_not_found() {
    let desk = desk_with(providers(), Arc::new(CountingGenerator::default()));
    let err = desk.generate_recipe(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, LeadError::NotFound(_)));
}

// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use buzz_lead_desk::ingest::types::SourceProvider;
use buzz_lead_desk::ingest::Aggregator;
use buzz_lead_desk::lead::{ContentRecipe, LeadDraft, LeadMetrics, LeadType};
use buzz_lead_desk::recipe::{RecipeError, RecipeGenerator};
use buzz_lead_desk::store::LeadStore;
use buzz_lead_desk::LeadDesk;

pub fn draft(title: &str, source: &str, score: u8) -> LeadDraft {
    LeadDraft {
        title: title.to_string(),
        kind: LeadType::Story,
        source: source.to_string(),
        score,
        estimated_traffic: "10K+".to_string(),
        evidence: vec![],
        metrics: LeadMetrics::default(),
    }
}

/// Returns a fixed list.
pub struct StaticProvider {
    pub name: &'static str,
    pub leads: Vec<LeadDraft>,
}

#[async_trait]
impl SourceProvider for StaticProvider {
    async fn fetch_latest(&self) -> Result<Vec<LeadDraft>> {
        Ok(self.leads.clone())
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

/// Simulated network error.
pub struct FailingProvider(pub &'static str);

#[async_trait]
impl SourceProvider for FailingProvider {
    async fn fetch_latest(&self) -> Result<Vec<LeadDraft>> {
        Err(anyhow!("connection refused"))
    }
    fn name(&self) -> &'static str {
        self.0
    }
}

/// Never answers within any sane timeout.
pub struct HangingProvider;

#[async_trait]
impl SourceProvider for HangingProvider {
    async fn fetch_latest(&self) -> Result<Vec<LeadDraft>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![])
    }
    fn name(&self) -> &'static str {
        "Hanging"
    }
}

/// Panics inside the spawned fetch task.
pub struct PanickingProvider;

#[async_trait]
impl SourceProvider for PanickingProvider {
    async fn fetch_latest(&self) -> Result<Vec<LeadDraft>> {
        panic!("adapter bug")
    }
    fn name(&self) -> &'static str {
        "Panicking"
    }
}

pub fn aggregator(providers: Vec<Arc<dyn SourceProvider>>) -> Aggregator {
    Aggregator::new(providers, Duration::from_millis(200))
}

/// Numbers each recipe so consecutive calls are distinguishable.
#[derive(Default)]
pub struct CountingGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RecipeGenerator for CountingGenerator {
    async fn generate(&self, title: &str, _excerpt: &str) -> Result<ContentRecipe, RecipeError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ContentRecipe {
            title: format!("{title} (draft {n})"),
            excerpt: "teaser".to_string(),
            body: format!("<p>draft {n}</p>"),
            seo_title: title.to_string(),
            seo_description: String::new(),
            keywords: vec![],
        })
    }
    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// Returns a good recipe first, then fails every later call.
#[derive(Default)]
pub struct FlakyGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl RecipeGenerator for FlakyGenerator {
    async fn generate(&self, title: &str, _excerpt: &str) -> Result<ContentRecipe, RecipeError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(ContentRecipe {
                title: title.to_string(),
                excerpt: "first".to_string(),
                body: "<p>first</p>".to_string(),
                seo_title: String::new(),
                seo_description: String::new(),
                keywords: vec![],
            })
        } else {
            Err(RecipeError::InvalidJson("expected value at line 1".to_string()))
        }
    }
    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

pub fn desk_with(
    providers: Vec<Arc<dyn SourceProvider>>,
    generator: Arc<dyn RecipeGenerator>,
) -> LeadDesk {
    LeadDesk::new(aggregator(providers), LeadStore::in_memory(), generator)
}

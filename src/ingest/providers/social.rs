// src/ingest/providers/social.rs
//! Stand-in for a paid social-listening API. Returns a fixed set of exemplar
//! leads after a short delay so the fan-out sees realistic latency.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use crate::ingest::types::SourceProvider;
use crate::lead::{Evidence, LeadDraft, LeadMetrics, LeadType};

struct Exemplar {
    title: &'static str,
    kind: LeadType,
    source: &'static str,
    score: u8,
    traffic: &'static str,
    url: &'static str,
    snippet: &'static str,
    velocity: f32,
}

const EXEMPLARS: &[Exemplar] = &[
    Exemplar {
        title: "Fans spot cryptic lyric tease in pop star's latest Instagram story",
        kind: LeadType::Story,
        source: "X (Twitter)",
        score: 88,
        traffic: "25K+",
        url: "https://x.com/search?q=lyric%20tease",
        snippet: "Thousands of reposts in the last hour speculating about a surprise album drop.",
        velocity: 340.0,
    },
    Exemplar {
        title: "Viral red carpet 'quiet luxury' look sparks dupe hunt",
        kind: LeadType::Sponsor,
        source: "TikTok",
        score: 82,
        traffic: "15K+",
        url: "https://www.tiktok.com/tag/quietluxury",
        snippet: "Creators are tagging affordable alternatives; strong affiliate angle.",
        velocity: 210.0,
    },
];

pub struct SimulatedSocialProvider {
    delay: Duration,
}

impl SimulatedSocialProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl SourceProvider for SimulatedSocialProvider {
    async fn fetch_latest(&self) -> Result<Vec<LeadDraft>> {
        tokio::time::sleep(self.delay).await;
        let now = Utc::now();
        Ok(EXEMPLARS
            .iter()
            .map(|e| LeadDraft {
                title: e.title.to_string(),
                kind: e.kind,
                source: e.source.to_string(),
                score: e.score,
                estimated_traffic: e.traffic.to_string(),
                evidence: vec![Evidence {
                    source: e.source.to_string(),
                    url: Some(e.url.to_string()),
                    snippet: e.snippet.to_string(),
                    timestamp: now,
                }],
                metrics: LeadMetrics {
                    trend_velocity: e.velocity,
                    ..LeadMetrics::default()
                },
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "Social Listening (simulated)"
    }
}

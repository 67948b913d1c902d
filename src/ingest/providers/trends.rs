// src/ingest/providers/trends.rs
//! Daily-trends adapter. The upstream endpoint is unofficial and regularly
//! blocks or reshapes responses, so any parse problem fails closed.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;

use crate::ingest::config::HarvestConfig;
use crate::ingest::normalize_text;
use crate::ingest::types::SourceProvider;
use crate::lead::{Evidence, LeadDraft, LeadMetrics, LeadType};

pub const TRENDS_SOURCE: &str = "Google Trends";
const TRENDS_SCORE_FLOOR: u8 = 90;
const MAX_EVIDENCE: usize = 2;

#[derive(Debug, Deserialize)]
struct Envelope {
    default: DailyTrends,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyTrends {
    trending_searches_days: Vec<TrendDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendDay {
    #[serde(default)]
    trending_searches: Vec<TrendingSearch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendingSearch {
    title: TrendTitle,
    #[serde(default)]
    formatted_traffic: String,
    #[serde(default)]
    articles: Vec<TrendArticle>,
}

#[derive(Debug, Deserialize)]
struct TrendTitle {
    query: String,
}

#[derive(Debug, Deserialize)]
struct TrendArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    source: String,
    url: Option<String>,
    #[serde(default)]
    snippet: String,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        region: String,
        category: String,
        client: reqwest::Client,
    },
}

pub struct TrendsProvider {
    mode: Mode,
    limit: usize,
}

impl TrendsProvider {
    pub fn from_fixture(body: &str, limit: usize) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
            limit,
        }
    }

    pub fn from_config(cfg: &HarvestConfig) -> Self {
        Self {
            mode: Mode::Http {
                url: cfg.trends_url.clone(),
                region: cfg.trends_region.clone(),
                category: cfg.trends_category.clone(),
                client: super::http_client(cfg.adapter_timeout()),
            },
            limit: cfg.trends_limit,
        }
    }

    fn parse(&self, body: &str) -> Result<Vec<LeadDraft>> {
        // Responses carry an anti-JSON-hijacking prefix like `)]}',`.
        let start = body
            .find('{')
            .ok_or_else(|| anyhow!("trends body has no json object"))?;
        let env: Envelope =
            serde_json::from_str(&body[start..]).context("parsing daily trends json")?;

        let day = env
            .default
            .trending_searches_days
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("trends response has no days"))?;

        let now = Utc::now();
        let mut rng = rand::rng();
        let mut out = Vec::with_capacity(self.limit);
        for search in day.trending_searches.into_iter().take(self.limit) {
            let title = normalize_text(&search.title.query);
            if title.is_empty() {
                continue;
            }
            let score = TRENDS_SCORE_FLOOR + rng.random_range(0..10u8);
            let evidence = search
                .articles
                .into_iter()
                .take(MAX_EVIDENCE)
                .map(|a| Evidence {
                    source: if a.source.is_empty() {
                        TRENDS_SOURCE.to_string()
                    } else {
                        a.source
                    },
                    url: a.url,
                    snippet: normalize_text(&format!("{}. {}", a.title, a.snippet)),
                    timestamp: now,
                })
                .collect();

            out.push(LeadDraft {
                title,
                kind: LeadType::Seo,
                source: TRENDS_SOURCE.to_string(),
                score,
                estimated_traffic: search.formatted_traffic.clone(),
                evidence,
                metrics: LeadMetrics {
                    trend_velocity: traffic_in_thousands(&search.formatted_traffic),
                    ..LeadMetrics::default()
                },
            });
        }
        Ok(out)
    }
}

/// "200K+" -> 200.0, "1M+" -> 1000.0, "5,000+" -> 5.0. Unknown shapes -> 0.0.
fn traffic_in_thousands(s: &str) -> f32 {
    let t = s.trim().trim_end_matches('+').replace(',', "");
    let (num, mult) = match t.chars().last() {
        Some('K') | Some('k') => (&t[..t.len() - 1], 1.0),
        Some('M') | Some('m') => (&t[..t.len() - 1], 1000.0),
        _ => (t.as_str(), 0.001),
    };
    num.trim().parse::<f32>().map(|v| v * mult).unwrap_or(0.0)
}

#[async_trait]
impl SourceProvider for TrendsProvider {
    async fn fetch_latest(&self) -> Result<Vec<LeadDraft>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse(s),
            Mode::Http {
                url,
                region,
                category,
                client,
            } => {
                let body = client
                    .get(url)
                    .query(&[
                        ("hl", "en-US"),
                        ("tz", "0"),
                        ("geo", region.as_str()),
                        ("cat", category.as_str()),
                        ("ns", "15"),
                    ])
                    .send()
                    .await
                    .context("trends http get()")?
                    .error_for_status()
                    .context("trends non-2xx")?
                    .text()
                    .await
                    .context("trends http .text()")?;
                self.parse(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Google Trends"
    }
}

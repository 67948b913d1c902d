// src/ingest/providers/rss.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};
use tokio::task::JoinSet;

use crate::ingest::config::{FeedConfig, HarvestConfig};
use crate::ingest::normalize_text;
use crate::ingest::scoring::{traffic_estimate, Scorer};
use crate::ingest::types::SourceProvider;
use crate::lead::{Evidence, LeadDraft, LeadMetrics, LeadType};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_pub_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if let Ok(dt) = OffsetDateTime::parse(ts, &Rfc2822) {
        return DateTime::from_timestamp(dt.unix_timestamp(), 0);
    }
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

enum Mode {
    Fixture(String),
    Http { url: String },
}

/// One feed: where to read it and how to label its leads.
pub struct RssFeed {
    pub name: String,
    pub kind: LeadType,
    mode: Mode,
}

impl RssFeed {
    pub fn from_fixture(name: &str, kind: LeadType, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: &str, kind: LeadType, url: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            mode: Mode::Http {
                url: url.to_string(),
            },
        }
    }

    async fn body(&self, client: &reqwest::Client) -> Result<String> {
        match &self.mode {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http { url } => client
                .get(url)
                .send()
                .await
                .with_context(|| format!("{} http get()", self.name))?
                .error_for_status()
                .with_context(|| format!("{} non-2xx", self.name))?
                .text()
                .await
                .with_context(|| format!("{} http .text()", self.name)),
        }
    }

    async fn harvest(
        &self,
        client: &reqwest::Client,
        items_per_feed: usize,
        scorer: &Scorer,
    ) -> Result<Vec<LeadDraft>> {
        let body = self.body(client).await?;
        self.parse(&body, items_per_feed, scorer)
    }

    fn parse(&self, xml: &str, items_per_feed: usize, scorer: &Scorer) -> Result<Vec<LeadDraft>> {
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss =
            from_str(&xml_clean).with_context(|| format!("parsing {} rss xml", self.name))?;

        let now = Utc::now();
        let mut out = Vec::with_capacity(items_per_feed);
        for it in rss.channel.item {
            if out.len() >= items_per_feed {
                break;
            }
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            let published = it.pub_date.as_deref().and_then(parse_pub_date);
            let score = scorer.score(published, &self.name);
            let snippet = normalize_text(it.description.as_deref().unwrap_or_default());

            out.push(LeadDraft {
                title,
                kind: self.kind,
                source: self.name.clone(),
                score,
                estimated_traffic: traffic_estimate(score),
                evidence: vec![Evidence {
                    source: self.name.clone(),
                    url: it.link,
                    snippet,
                    timestamp: published.unwrap_or(now),
                }],
                metrics: LeadMetrics::default(),
            });
        }
        Ok(out)
    }
}

impl From<&FeedConfig> for RssFeed {
    fn from(f: &FeedConfig) -> Self {
        RssFeed::from_url(&f.name, f.kind, &f.url)
    }
}

/// Feed budget as a share of the whole adapter budget, so a slow feed gives
/// up before the aggregator drops the adapter.
fn feed_budget(adapter_timeout: Duration) -> Duration {
    adapter_timeout.mul_f64(0.75)
}

/// Reads a fixed list of feeds concurrently and keeps the top items of each.
/// A broken or slow feed is logged and skipped; the provider only errors when
/// every feed failed.
pub struct RssProvider {
    feeds: Vec<Arc<RssFeed>>,
    items_per_feed: usize,
    scorer: Arc<Scorer>,
    client: reqwest::Client,
    feed_timeout: Duration,
}

impl RssProvider {
    pub fn new(feeds: Vec<RssFeed>, items_per_feed: usize, scorer: Scorer) -> Self {
        let feed_timeout = feed_budget(Duration::from_secs(8));
        Self {
            feeds: feeds.into_iter().map(Arc::new).collect(),
            items_per_feed,
            scorer: Arc::new(scorer),
            client: super::http_client(feed_timeout),
            feed_timeout,
        }
    }

    pub fn from_config(cfg: &HarvestConfig, scorer: Scorer) -> Self {
        let feeds = cfg.feeds.iter().map(RssFeed::from).collect();
        Self::new(feeds, cfg.items_per_feed, scorer)
            .with_feed_timeout(feed_budget(cfg.adapter_timeout()))
    }

    /// Upper bound for fetching and parsing a single feed.
    pub fn with_feed_timeout(mut self, timeout: Duration) -> Self {
        self.feed_timeout = timeout;
        self.client = super::http_client(timeout);
        self
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<LeadDraft>> {
        let mut set = JoinSet::new();
        for (idx, feed) in self.feeds.iter().enumerate() {
            let feed = Arc::clone(feed);
            let scorer = Arc::clone(&self.scorer);
            let client = self.client.clone();
            let items = self.items_per_feed;
            let limit = self.feed_timeout;
            set.spawn(async move {
                let work = feed.harvest(&client, items, &scorer);
                let res = match tokio::time::timeout(limit, work).await {
                    Ok(r) => r,
                    Err(_) => Err(anyhow!("{} timed out after {}ms", feed.name, limit.as_millis())),
                };
                (idx, res)
            });
        }

        // Keep feed order regardless of completion order.
        let mut slots: Vec<Option<Vec<LeadDraft>>> = vec![None; self.feeds.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, Ok(leads))) => slots[idx] = Some(leads),
                Ok((idx, Err(e))) => {
                    tracing::warn!(target: "harvest", error = ?e, feed = %self.feeds[idx].name, "rss feed skipped");
                }
                Err(e) => {
                    tracing::warn!(target: "harvest", error = %e, "rss feed task aborted");
                }
            }
        }

        let failed = slots.iter().filter(|s| s.is_none()).count();
        if failed > 0 && failed == self.feeds.len() {
            return Err(anyhow!("all {failed} rss feeds failed"));
        }
        Ok(slots.into_iter().flatten().flatten().collect())
    }

    fn name(&self) -> &'static str {
        "RSS"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pub_date_accepts_rfc2822_and_rfc3339() {
        let a = parse_pub_date("Tue, 14 Oct 2025 18:30:00 +0000").unwrap();
        let b = parse_pub_date("2025-10-14T18:30:00Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_pub_date("yesterday-ish").is_none());
    }

    #[tokio::test]
    async fn empty_channel_yields_no_leads() {
        let xml = r#"<rss version="2.0"><channel><title>x</title></channel></rss>"#;
        let p = RssProvider::new(
            vec![RssFeed::from_fixture("TMZ", LeadType::Story, xml)],
            2,
            Scorer::default(),
        );
        let out = p.fetch_latest().await.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn feed_budget_stays_below_adapter_budget() {
        let adapter = Duration::from_secs(8);
        assert!(feed_budget(adapter) < adapter);
        assert_eq!(feed_budget(adapter), Duration::from_secs(6));
    }
}

// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod scheduler;
pub mod scoring;
pub mod types;

use crate::ingest::config::HarvestConfig;
use crate::ingest::providers::{
    rss::RssProvider, social::SimulatedSocialProvider, trends::TrendsProvider,
};
use crate::ingest::scoring::Scorer;
use crate::ingest::types::{HarvestReport, ProviderOutcome, SourceProvider};
use crate::lead::LeadDraft;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("harvest_runs_total", "Aggregator runs.");
        describe_counter!(
            "harvest_leads_total",
            "Leads returned after dedup and ranking."
        );
        describe_counter!(
            "harvest_dedup_total",
            "Leads dropped by title containment dedup."
        );
        describe_counter!(
            "harvest_source_errors_total",
            "Provider fetch/parse errors and timeouts."
        );
        describe_histogram!("harvest_fetch_ms", "Provider fetch time in milliseconds.");
        describe_gauge!("harvest_last_run_ts", "Unix ts when the aggregator last ran.");
    });
}

/// Normalize text: collapse whitespace, trim, strip markup.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 500 chars (snippets only need a teaser)
    if out.chars().count() > 500 {
        out = out.chars().take(500).collect();
    }

    out
}

pub fn is_whitelisted<S: AsRef<str>>(source: S, whitelist: &[String]) -> bool {
    let s = source.as_ref();
    whitelist.iter().any(|w| w.eq_ignore_ascii_case(s))
}

/// Dedup key: lower-cased title with every non `[a-z0-9]` character removed.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Drop every lead whose normalized title contains, or is contained in, the
/// normalized title of an already accepted lead. First seen wins.
///
/// Known limitation: containment is not similarity. A short key ("ai") collides
/// with any longer title that embeds it, and a title that normalizes to the
/// empty string collides with everything.
pub fn dedup_by_containment(leads: Vec<LeadDraft>) -> (Vec<LeadDraft>, usize) {
    let mut accepted_keys: Vec<String> = Vec::with_capacity(leads.len());
    let mut keep = Vec::with_capacity(leads.len());
    let mut dropped = 0usize;

    for lead in leads {
        let key = normalize_title(&lead.title);
        let clash = accepted_keys
            .iter()
            .any(|seen| seen.contains(key.as_str()) || key.contains(seen.as_str()));
        if clash {
            dropped += 1;
            continue;
        }
        accepted_keys.push(key);
        keep.push(lead);
    }

    (keep, dropped)
}

/// Stable sort by score, highest first. Ties keep their incoming order.
pub fn rank_by_score(leads: &mut [LeadDraft]) {
    leads.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Fans out to every provider, then merges, dedups and ranks.
/// Persisting the result is the caller's job.
pub struct Aggregator {
    providers: Vec<Arc<dyn SourceProvider>>,
    timeout: Duration,
}

impl Aggregator {
    /// Providers are listed in merge priority: earlier providers win dedup ties.
    pub fn new(providers: Vec<Arc<dyn SourceProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Production wiring: trends first, then social, then RSS.
    pub fn from_config(cfg: &HarvestConfig) -> Self {
        let scorer = Scorer::new(cfg.authority_sources.clone());
        let providers: Vec<Arc<dyn SourceProvider>> = vec![
            Arc::new(TrendsProvider::from_config(cfg)),
            Arc::new(SimulatedSocialProvider::new(cfg.social_delay())),
            Arc::new(RssProvider::from_config(cfg, scorer)),
        ];
        Self::new(providers, cfg.adapter_timeout())
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run every provider concurrently and wait for all of them to settle.
    /// A failing, panicking or timed-out provider contributes nothing.
    pub async fn run_once(&self) -> (Vec<LeadDraft>, HarvestReport) {
        ensure_metrics_described();

        let n = self.providers.len();
        let mut set = JoinSet::new();
        for (idx, p) in self.providers.iter().enumerate() {
            let p = Arc::clone(p);
            let limit = self.timeout;
            set.spawn(async move {
                let t0 = Instant::now();
                let res = tokio::time::timeout(limit, p.fetch_latest()).await;
                (idx, res, t0.elapsed())
            });
        }

        let mut slots: Vec<Option<(Vec<LeadDraft>, ProviderOutcome)>> = vec![None; n];
        while let Some(joined) = set.join_next().await {
            let (idx, res, elapsed) = match joined {
                Ok(v) => v,
                Err(e) => {
                    // Slot stays empty; reported as failed below.
                    tracing::warn!(target: "harvest", error = %e, "provider task aborted");
                    continue;
                }
            };
            let provider = self.providers[idx].name();
            histogram!("harvest_fetch_ms").record(elapsed.as_secs_f64() * 1_000.0);

            let settled = match res {
                Ok(Ok(leads)) => {
                    let outcome = ProviderOutcome::Ok {
                        provider: provider.to_string(),
                        leads: leads.len(),
                    };
                    (leads, outcome)
                }
                Ok(Err(e)) => {
                    tracing::warn!(target: "harvest", error = ?e, provider, "provider error");
                    counter!("harvest_source_errors_total").increment(1);
                    let outcome = ProviderOutcome::Failed {
                        provider: provider.to_string(),
                        error: format!("{e:#}"),
                    };
                    (Vec::new(), outcome)
                }
                Err(_) => {
                    tracing::warn!(
                        target: "harvest",
                        provider,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "provider timed out"
                    );
                    counter!("harvest_source_errors_total").increment(1);
                    let outcome = ProviderOutcome::TimedOut {
                        provider: provider.to_string(),
                    };
                    (Vec::new(), outcome)
                }
            };
            slots[idx] = Some(settled);
        }

        let mut raw = Vec::new();
        let mut outcomes = Vec::with_capacity(n);
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some((mut leads, outcome)) => {
                    raw.append(&mut leads);
                    outcomes.push(outcome);
                }
                None => {
                    counter!("harvest_source_errors_total").increment(1);
                    outcomes.push(ProviderOutcome::Failed {
                        provider: self.providers[idx].name().to_string(),
                        error: "provider task panicked".to_string(),
                    });
                }
            }
        }

        let fetched = raw.len();
        let (mut kept, dedup_dropped) = dedup_by_containment(raw);
        rank_by_score(&mut kept);

        // Telemetry
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        counter!("harvest_runs_total").increment(1);
        counter!("harvest_leads_total").increment(kept.len() as u64);
        counter!("harvest_dedup_total").increment(dedup_dropped as u64);
        gauge!("harvest_last_run_ts").set(now as f64);

        let report = HarvestReport {
            outcomes,
            fetched,
            dedup_dropped,
        };
        (kept, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{LeadMetrics, LeadType};

    fn draft(title: &str, score: u8) -> LeadDraft {
        LeadDraft {
            title: title.into(),
            kind: LeadType::Story,
            source: "TMZ".into(),
            score,
            estimated_traffic: "2K+".into(),
            evidence: vec![],
            metrics: LeadMetrics::default(),
        }
    }

    #[test]
    fn normalize_text_decodes_and_collapses() {
        let s = "  <p>Hello,&nbsp;&nbsp; &ldquo;world&rdquo;</p>  ";
        assert_eq!(normalize_text(s), r#"Hello, "world""#);
    }

    #[test]
    fn whitelist_matching_is_case_insensitive() {
        let wl = vec!["TMZ".to_string(), "Google News (Entertainment)".into()];
        assert!(is_whitelisted("tmz", &wl));
        assert!(is_whitelisted("GOOGLE NEWS (ENTERTAINMENT)", &wl));
        assert!(!is_whitelisted("Page Six", &wl));
    }

    #[test]
    fn normalize_title_keeps_ascii_alphanumerics() {
        assert_eq!(
            normalize_title("Zendaya's Vintage Versace Moment!"),
            "zendayasvintageversacemoment"
        );
        assert_eq!(normalize_title("BTS — 2025 Tour"), "bts2025tour");
    }

    #[test]
    fn containment_is_symmetric_and_first_seen_wins() {
        let (kept, dropped) = dedup_by_containment(vec![
            draft("Taylor Swift Engaged", 70),
            draft("BREAKING: Taylor Swift engaged to Travis Kelce", 95),
            draft("Swift", 80),
            draft("Met Gala Looks", 60),
        ]);
        assert_eq!(dropped, 2);
        let titles: Vec<_> = kept.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Taylor Swift Engaged", "Met Gala Looks"]);
    }

    #[test]
    fn rank_is_stable_for_ties() {
        let mut v = vec![draft("a", 70), draft("b", 90), draft("c", 70), draft("d", 90)];
        rank_by_score(&mut v);
        let titles: Vec<_> = v.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "d", "a", "c"]);
    }
}

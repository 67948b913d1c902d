//! Viral-potential heuristic for harvested items.
//!
//! score = 60 (base)
//!       + recency bonus (+30 under 2h, +20 under 6h, +10 under 12h)
//!       + 10 if the source is on the authority allowlist
//!       + jitter in [0, 10)
//! clamped to 100.
//!
//! This is a hand-tuned heuristic, not a fitted model. The jitter is part of the
//! observed behaviour, so two items with identical inputs may rank differently.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::ingest::is_whitelisted;

pub const BASE_SCORE: u32 = 60;
pub const AUTHORITY_BONUS: u32 = 10;
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    authority: Vec<String>,
}

impl Scorer {
    pub fn new(authority: Vec<String>) -> Self {
        Self { authority }
    }

    pub fn is_authority(&self, source: &str) -> bool {
        is_whitelisted(source, &self.authority)
    }

    /// Score against the wall clock with a fresh random jitter.
    pub fn score(&self, published: Option<DateTime<Utc>>, source: &str) -> u8 {
        let jitter = rand::rng().random_range(0..10u8);
        self.score_with_jitter(Utc::now(), published, source, jitter)
    }

    /// Deterministic core. A missing timestamp earns no recency bonus.
    pub fn score_with_jitter(
        &self,
        now: DateTime<Utc>,
        published: Option<DateTime<Utc>>,
        source: &str,
        jitter: u8,
    ) -> u8 {
        let mut score = BASE_SCORE;
        if let Some(ts) = published {
            score += recency_bonus(now, ts);
        }
        if self.is_authority(source) {
            score += AUTHORITY_BONUS;
        }
        score += u32::from(jitter.min(9));
        score.min(u32::from(MAX_SCORE)) as u8
    }
}

fn recency_bonus(now: DateTime<Utc>, published: DateTime<Utc>) -> u32 {
    let hours_ago = (now - published).num_seconds() as f64 / 3600.0;
    if hours_ago < 2.0 {
        30
    } else if hours_ago < 6.0 {
        20
    } else if hours_ago < 12.0 {
        10
    } else {
        0
    }
}

/// Display-only traffic estimate derived from the score band.
pub fn traffic_estimate(score: u8) -> String {
    match score {
        90..=u8::MAX => "50K+".to_string(),
        80..=89 => "20K+".to_string(),
        70..=79 => "10K+".to_string(),
        _ => "2K+".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn scorer() -> Scorer {
        Scorer::new(vec!["TMZ".into(), "Google News (Entertainment)".into()])
    }

    #[test]
    fn recency_bands_and_authority_bonus() {
        let s = scorer();
        let now = Utc::now();
        let at = |h: i64| Some(now - Duration::hours(h));

        assert_eq!(s.score_with_jitter(now, at(1), "Page Six", 0), 90);
        assert_eq!(s.score_with_jitter(now, at(3), "Page Six", 0), 80);
        assert_eq!(s.score_with_jitter(now, at(8), "Page Six", 0), 70);
        assert_eq!(s.score_with_jitter(now, at(30), "Page Six", 0), 60);
        assert_eq!(s.score_with_jitter(now, at(30), "TMZ", 0), 70);
        assert_eq!(s.score_with_jitter(now, None, "Page Six", 4), 64);
    }

    #[test]
    fn clamps_to_one_hundred() {
        let s = scorer();
        let now = Utc::now();
        assert_eq!(s.score_with_jitter(now, Some(now), "TMZ", 9), 100);
    }

    #[test]
    fn random_scores_stay_in_range() {
        let s = scorer();
        let now = Utc::now();
        for h in [0, 1, 5, 11, 48] {
            for src in ["TMZ", "E! News"] {
                let v = s.score(Some(now - Duration::hours(h)), src);
                assert!((60..=100).contains(&v), "score {v} out of range");
            }
        }
    }

    #[test]
    fn traffic_estimate_follows_score_band() {
        assert_eq!(traffic_estimate(99), "50K+");
        assert_eq!(traffic_estimate(85), "20K+");
        assert_eq!(traffic_estimate(61), "2K+");
    }
}

//! Lead record: a harvested story candidate plus its editorial workflow state.
//!
//! Two fields are guarded behind accessors instead of being public:
//! - `score` is fixed by the scorer at harvest time and never recomputed.
//! - `provenance` is append-only; entries are added through [`Lead::record`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Editorial category of a lead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LeadType {
    Story,
    Seo,
    Sponsor,
}

/// Workflow state of a lead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Claimed,
    Drafted,
    Published,
    Rejected,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Claimed => "claimed",
            LeadStatus::Drafted => "drafted",
            LeadStatus::Published => "published",
            LeadStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Published | LeadStatus::Rejected)
    }

    /// Constrained editorial workflow:
    /// `new -> {claimed, rejected}`, `claimed -> {drafted, rejected}`,
    /// `drafted -> {published, rejected}`. Same-state moves are no-ops and allowed.
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        use LeadStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (*self, next),
            (New, Claimed)
                | (New, Rejected)
                | (Claimed, Drafted)
                | (Claimed, Rejected)
                | (Drafted, Published)
                | (Drafted, Rejected)
        )
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "claimed" => Ok(LeadStatus::Claimed),
            "drafted" => Ok(LeadStatus::Drafted),
            "published" => Ok(LeadStatus::Published),
            "rejected" => Ok(LeadStatus::Rejected),
            other => Err(format!("unknown lead status: {other}")),
        }
    }
}

/// Supporting citation for a lead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub source: String,
    pub url: Option<String>,
    pub snippet: String,
    pub timestamp: DateTime<Utc>,
}

/// Descriptive traffic numbers; not read by the scorer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub trend_velocity: f32,
}

/// Structured article draft produced by the recipe generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecipe {
    pub title: String,
    pub excerpt: String,
    pub body: String,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceAction {
    Harvested,
    StatusChange,
    AiGenerated,
}

/// One audit-trail entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvenanceEntry {
    pub action: ProvenanceAction,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub details: Option<String>,
}

/// Normalized output of a source adapter, before it becomes a stored [`Lead`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: LeadType,
    pub source: String,
    pub score: u8,
    pub estimated_traffic: String,
    pub evidence: Vec<Evidence>,
    pub metrics: LeadMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: LeadType,
    pub source: String,
    score: u8,
    pub estimated_traffic: String,
    pub status: LeadStatus,
    pub assigned_editor: Option<String>,
    pub evidence: Vec<Evidence>,
    pub metrics: LeadMetrics,
    pub content_recipe: Option<ContentRecipe>,
    provenance: Vec<ProvenanceEntry>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Turn a harvested draft into a stored lead with its first provenance entry.
    pub fn from_draft(draft: LeadDraft, harvested_by: &str, now: DateTime<Utc>) -> Self {
        let mut lead = Self {
            id: Uuid::new_v4(),
            title: draft.title,
            kind: draft.kind,
            source: draft.source,
            score: draft.score.min(100),
            estimated_traffic: draft.estimated_traffic,
            status: LeadStatus::New,
            assigned_editor: None,
            evidence: draft.evidence,
            metrics: draft.metrics,
            content_recipe: None,
            provenance: Vec::new(),
            created_at: now,
        };
        lead.record(ProvenanceAction::Harvested, harvested_by, None, now);
        lead
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn provenance(&self) -> &[ProvenanceEntry] {
        &self.provenance
    }

    pub fn record(
        &mut self,
        action: ProvenanceAction,
        user: &str,
        details: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.provenance.push(ProvenanceEntry {
            action,
            user: user.to_string(),
            timestamp: now,
            details,
        });
    }
}

//! Typed errors surfaced by the lead desk.
//!
//! Adapter failures never appear here: they are absorbed by the aggregator and
//! reported through `HarvestReport::failed_sources` instead.

use uuid::Uuid;

use crate::lead::LeadStatus;

#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("lead {0} not found")]
    NotFound(Uuid),

    #[error("status transition {from} -> {to} is not allowed")]
    InvalidTransition { from: LeadStatus, to: LeadStatus },

    #[error("recipe generation failed: {0}")]
    GenerationFailed(String),

    #[error("lead store error: {0}")]
    Storage(String),
}

impl LeadError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LeadError::GenerationFailed(_) | LeadError::Storage(_))
    }
}

pub type LeadResult<T> = Result<T, LeadError>;

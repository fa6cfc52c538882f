//! crates/recruitment_forms_core/src/ports.rs
//!
//! Defines the service contracts (traits) the forms engine talks to.
//! These traits form the boundary of the hexagonal architecture: storage of
//! applications and publication of form definitions are injected, so a real
//! backend can replace the in-memory adapters without touching the engine.

use async_trait::async_trait;

use crate::domain::{FormDefinition, NormalizedRecord, PublishedForm};
use crate::filter::CandidateFilter;
use crate::token::AddressToken;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The collaborator refused the request; nothing was applied.
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Receives validated applications. A record is either accepted whole or not
/// at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionService: Send + Sync {
    async fn submit_application(&self, record: &NormalizedRecord) -> PortResult<()>;
}

/// Stores campaign form drafts and the definitions published from them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormPublishingService: Send + Sync {
    // --- Publications ---
    async fn publish(&self, form: &PublishedForm) -> PortResult<()>;

    async fn get_published(&self, token: &AddressToken) -> PortResult<PublishedForm>;

    /// All publications of a campaign, oldest first.
    async fn list_published(&self, campaign_id: &str) -> PortResult<Vec<PublishedForm>>;

    // --- Working drafts ---
    async fn get_draft(&self, campaign_id: &str) -> PortResult<Option<FormDefinition>>;

    async fn save_draft(&self, campaign_id: &str, definition: &FormDefinition) -> PortResult<()>;
}

/// Read side of the received applications, used by recruiters to screen them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationDirectory: Send + Sync {
    /// Applications received through any of `tokens` that match `filter`,
    /// oldest first.
    async fn list_applications(
        &self,
        tokens: &[AddressToken],
        filter: &CandidateFilter,
    ) -> PortResult<Vec<NormalizedRecord>>;
}

//! crates/book_scout_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete catalog API and completion backend.

use crate::domain::{
    BookPlanSpec, CatalogItem, CatalogPage, InterestTag, PlannedStep, ReadingSpeedModel,
};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The external service failed or returned a non-success status.
    #[error("Upstream service error: {0}")]
    Upstream(String),
    /// The external service answered, but not in the expected structure.
    #[error("Malformed upstream output: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The external book catalog, queried in pages.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetches one page of results for `query`, mapped to `CatalogItem`s
    /// at the boundary. `start_index` is the catalog row offset.
    async fn search_volumes(
        &self,
        query: &str,
        start_index: u32,
        max_results: u32,
    ) -> PortResult<CatalogPage>;
}

/// Delegated text-completion help for query understanding. Every caller
/// carries a deterministic fallback, so implementations may fail freely.
#[async_trait]
pub trait QueryRefinementService: Send + Sync {
    /// Extracts up to ten catalog search keywords from a user message.
    /// `interests` is only consulted for generic requests; for specific
    /// requests the stored interests must be ignored entirely.
    async fn extract_keywords(
        &self,
        message: &str,
        interests: &[InterestTag],
        is_generic: bool,
    ) -> PortResult<String>;

    /// Infers a short topic phrase from an ambiguous book mention, used to
    /// ask the user for confirmation instead of searching immediately.
    async fn infer_topic(&self, message: &str) -> PortResult<String>;
}

/// Generates the per-result "why this book" explanation.
#[async_trait]
pub trait ReasonGenerationService: Send + Sync {
    async fn recommendation_reason(
        &self,
        item: &CatalogItem,
        interests: &[InterestTag],
    ) -> PortResult<String>;
}

/// Generates a structured reading-plan step list for a book.
#[async_trait]
pub trait PlanGenerationService: Send + Sync {
    async fn generate_steps(
        &self,
        book: &BookPlanSpec,
        model: &ReadingSpeedModel,
    ) -> PortResult<Vec<PlannedStep>>;
}

//! crates/book_scout_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any HTTP framework or catalog API;
//! serde derives exist only because they cross the service boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fixed onboarding interest tag chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestTag {
    Fantasy,
    Scifi,
    Romance,
    Mystery,
    Thriller,
    History,
    Biography,
    Psychology,
    Business,
    Selfhelp,
    Poetry,
    Adventure,
}

/// Self-reported reading level from onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ReaderLevel {
    /// Estimated reading speed in pages per minute.
    pub fn pages_per_minute(self) -> u32 {
        match self {
            ReaderLevel::Beginner => 1,
            ReaderLevel::Intermediate => 2,
            ReaderLevel::Advanced => 3,
        }
    }
}

/// Immutable per-request snapshot of the user's onboarding answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingProfile {
    #[serde(default)]
    pub interests: Vec<InterestTag>,
    pub daily_reading_minutes: u32,
    pub reader_level: ReaderLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the conversation. Only the most recent user turn drives
/// intent classification and query extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// The catalog search string derived from one user turn. Request-scoped,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub is_generic_request: bool,
    pub used_interest_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub amount: f64,
    pub currency_code: String,
}

/// A single book result, produced once at the catalog boundary and passed
/// by value through the rest of the pipeline. `id` is the catalog-assigned
/// identity used for deduplication and exclusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub matches_interests: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
}

/// One page of raw catalog results, already mapped to `CatalogItem`.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    /// Total result count reported by the catalog for the whole query.
    pub total_items: u32,
    pub items: Vec<CatalogItem>,
}

/// The outcome of one aggregation pass over the catalog.
#[derive(Debug, Clone)]
pub struct AggregatedResults {
    pub items: Vec<CatalogItem>,
    pub has_more: bool,
    pub total_items: u32,
    /// Offset of the first catalog row not yet consumed by this pass.
    /// Feeding it back as the next `start_index` guarantees no overlap.
    pub next_offset: u32,
}

/// Input to the reading-plan segmenter. `total_pages` must be positive;
/// callers validate before invoking the segmenter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPlanSpec {
    pub title: String,
    pub author: String,
    pub total_pages: u32,
}

/// One step of a generated reading plan. Created in a batch by the
/// segmenter; only `completed`/`completed_at` are mutated afterwards,
/// by the external store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPlanStep {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inclusive page range in "start-end" form.
    pub page_range: String,
    pub estimated_minutes: u32,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A step as returned by the delegated planner, before normalization.
/// Everything except the page range is optional because the backend
/// routinely omits fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStep {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Page range in "start-end" (or bare "start") form.
    pub pages: String,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
}

/// Derived reading-speed figures for one (profile, book) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingSpeedModel {
    pub pages_per_minute: u32,
    pub pages_per_session: u32,
    pub estimated_days: u32,
    pub minutes_per_session: u32,
}

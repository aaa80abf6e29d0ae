//! crates/book_scout_core/src/pipeline.rs
//!
//! Wires the intent gate, query extractor, aggregator, ranker, annotator
//! and segmenter into the three operations the service exposes. The
//! pipeline holds no state between requests: profile and exclusion ids
//! arrive per call and are discarded with the response.

use crate::aggregator::{AggregatorConfig, CatalogAggregator};
use crate::annotator::RecommendationAnnotator;
use crate::domain::{
    BookPlanSpec, CatalogItem, ChatRole, ChatTurn, OnboardingProfile, ReadingPlanStep, SearchQuery,
};
use crate::intent::{IntentClass, IntentConfig, IntentGate};
use crate::planner::ReadingPlanSegmenter;
use crate::ports::{
    CatalogService, PlanGenerationService, QueryRefinementService, ReasonGenerationService,
};
use crate::query::{QueryConfig, QueryExtractor};
use crate::ranker::ResultRanker;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

const REPLY_NOT_A_SEARCH: &str = "Puedo ayudarte a encontrar libros: cuéntame qué te gustaría \
     leer o pídeme una recomendación.";
const REPLY_NO_RESULTS: &str =
    "No encontré libros para esa búsqueda. Prueba con otras palabras o con otro tema.";

/// Hard ceiling on the page count a plan can be requested for. The longest
/// real books run to a few thousand pages; anything beyond this is garbage
/// input, not a book.
const MAX_PLAN_PAGES: u32 = 20_000;

/// Request-level failures. Everything else degrades to a fallback so the
/// user always receives a response.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),
}

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub messages: Vec<ChatTurn>,
    pub onboarding: Option<OnboardingProfile>,
    pub excluded_ids: Vec<String>,
    /// Pending-confirmation token from a previous `needs_confirmation`
    /// response, echoed back by the caller.
    pub pending_topic: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// Empty when books are returned: the result cards are the response.
    pub reply: String,
    pub books: Vec<CatalogItem>,
    pub search_terms: Option<String>,
    pub has_more_books: bool,
    pub total_items: u32,
    pub next_start_index: u32,
    pub needs_confirmation: bool,
    pub inferred_topic: Option<String>,
}

impl SearchResponse {
    fn conversational(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            books: Vec::new(),
            search_terms: None,
            has_more_books: false,
            total_items: 0,
            next_start_index: 0,
            needs_confirmation: false,
            inferred_topic: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadMoreRequest {
    pub search_terms: String,
    pub start_index: u32,
    pub onboarding: Option<OnboardingProfile>,
    pub excluded_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoadMoreResponse {
    pub books: Vec<CatalogItem>,
    pub has_more: bool,
    pub total_items: u32,
    pub next_start_index: u32,
}

/// Everything the pipeline needs. Only the catalog is mandatory; the
/// completion-backed ports are optional and their absence activates the
/// deterministic fallbacks.
pub struct DiscoveryPipeline {
    catalog: Arc<dyn CatalogService>,
    refinement: Option<Arc<dyn QueryRefinementService>>,
    gate: IntentGate,
    extractor: QueryExtractor,
    aggregator: CatalogAggregator,
    annotator: RecommendationAnnotator,
    segmenter: ReadingPlanSegmenter,
}

impl DiscoveryPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        refinement: Option<Arc<dyn QueryRefinementService>>,
        reasons: Option<Arc<dyn ReasonGenerationService>>,
        planner: Option<Arc<dyn PlanGenerationService>>,
    ) -> Self {
        Self {
            catalog,
            refinement,
            gate: IntentGate::new(IntentConfig::default()),
            extractor: QueryExtractor::new(QueryConfig::default()),
            aggregator: CatalogAggregator::new(AggregatorConfig::default()),
            annotator: RecommendationAnnotator::new(reasons),
            segmenter: ReadingPlanSegmenter::new(planner),
        }
    }

    /// Handles one conversational search turn.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, PipelineError> {
        let message = latest_user_text(&request.messages)
            .ok_or_else(|| PipelineError::InvalidInput("no user message in request".into()))?;

        let interests = request
            .onboarding
            .as_ref()
            .map(|p| p.interests.as_slice())
            .unwrap_or_default();

        // A pending confirmation resolves before any classification.
        if let Some(pending) = request.pending_topic.as_deref() {
            if let Some(topic) = self.gate.confirmed_topic(message, pending) {
                debug!("pending topic '{topic}' confirmed, searching directly");
                let query = SearchQuery {
                    text: topic,
                    is_generic_request: false,
                    used_interest_fallback: false,
                };
                return Ok(self.run_search(query, &request).await);
            }
        }

        let query = match self.gate.classify(message) {
            IntentClass::NotBookSearch => {
                return Ok(SearchResponse::conversational(REPLY_NOT_A_SEARCH));
            }
            IntentClass::AmbiguousBookMention => {
                if let Some(topic) = self.infer_topic(message).await {
                    info!("ambiguous book mention, asking to confirm topic '{topic}'");
                    let mut response = SearchResponse::conversational(&format!(
                        "¿Te gustaría ver libros sobre {topic}?"
                    ));
                    response.needs_confirmation = true;
                    response.inferred_topic = Some(topic);
                    return Ok(response);
                }
                // No usable topic: treat like a plain recommendation request.
                let mut query = self
                    .extractor
                    .build_generic(message, interests, self.refinement.as_deref())
                    .await;
                self.extractor.correct_generic(&mut query, interests);
                query
            }
            IntentClass::GenericBookSearch => {
                let mut query = self
                    .extractor
                    .build_generic(message, interests, self.refinement.as_deref())
                    .await;
                self.extractor.correct_generic(&mut query, interests);
                query
            }
            IntentClass::SpecificBookSearch => {
                self.extractor
                    .build_specific(message, self.refinement.as_deref())
                    .await
            }
        };

        Ok(self.run_search(query, &request).await)
    }

    /// Fetches the next batch for a query issued earlier, with the same
    /// filter and exclusion logic as the first batch.
    pub async fn load_more(
        &self,
        request: LoadMoreRequest,
    ) -> Result<LoadMoreResponse, PipelineError> {
        if request.search_terms.trim().is_empty() {
            return Err(PipelineError::InvalidInput("searchTerms is required".into()));
        }
        let excluded: HashSet<String> = request.excluded_ids.iter().cloned().collect();
        let aggregated = self
            .aggregator
            .aggregate(
                self.catalog.as_ref(),
                &request.search_terms,
                request.onboarding.as_ref(),
                &excluded,
                request.start_index,
            )
            .await;

        let mut books = aggregated.items;
        if let Some(profile) = &request.onboarding {
            // Pagination has no intent class; interest ordering applies
            // whenever the profile carries interests.
            let query = SearchQuery {
                text: request.search_terms.clone(),
                is_generic_request: true,
                used_interest_fallback: false,
            };
            ResultRanker::rank(&mut books, &query, &profile.interests);
        }

        Ok(LoadMoreResponse {
            books,
            has_more: aggregated.has_more,
            total_items: aggregated.total_items,
            next_start_index: aggregated.next_offset,
        })
    }

    /// Generates the reading plan for a chosen book.
    pub async fn generate_plan(
        &self,
        book: &BookPlanSpec,
        onboarding: Option<&OnboardingProfile>,
    ) -> Result<Vec<ReadingPlanStep>, PipelineError> {
        if book.total_pages == 0 || book.total_pages > MAX_PLAN_PAGES {
            return Err(PipelineError::InvalidInput(format!(
                "book.totalPages must be between 1 and {MAX_PLAN_PAGES}"
            )));
        }
        Ok(self.segmenter.segment(book, onboarding).await)
    }

    async fn run_search(&self, query: SearchQuery, request: &SearchRequest) -> SearchResponse {
        let interests = request
            .onboarding
            .as_ref()
            .map(|p| p.interests.as_slice())
            .unwrap_or_default();
        let excluded: HashSet<String> = request.excluded_ids.iter().cloned().collect();

        let aggregated = self
            .aggregator
            .aggregate(
                self.catalog.as_ref(),
                &query.text,
                request.onboarding.as_ref(),
                &excluded,
                0,
            )
            .await;

        let mut books = aggregated.items;
        ResultRanker::rank(&mut books, &query, interests);
        self.annotator.annotate(&mut books, interests).await;

        let reply = if books.is_empty() {
            REPLY_NO_RESULTS.to_string()
        } else {
            String::new()
        };

        SearchResponse {
            reply,
            books,
            search_terms: Some(query.text),
            has_more_books: aggregated.has_more,
            total_items: aggregated.total_items,
            next_start_index: aggregated.next_offset,
            needs_confirmation: false,
            inferred_topic: None,
        }
    }

    async fn infer_topic(&self, message: &str) -> Option<String> {
        let refinement = self.refinement.as_ref()?;
        match refinement.infer_topic(message).await {
            Ok(topic) => {
                let topic = topic.trim().trim_matches('"').to_string();
                self.gate.topic_is_usable(&topic).then_some(topic)
            }
            Err(e) => {
                debug!("topic inference failed: {e}");
                None
            }
        }
    }
}

fn latest_user_text(messages: &[ChatTurn]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::User)
        .map(|m| m.text.trim())
        .filter(|t| !t.is_empty())
}

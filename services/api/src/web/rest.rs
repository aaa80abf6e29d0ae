//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use book_scout_core::{
    BookPlanSpec, CatalogItem, ChatRole, ChatTurn, LoadMoreRequest, OnboardingProfile,
    PipelineError, ReadingPlanStep, SearchRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        search_handler,
        load_more_handler,
        generate_plan_handler,
    ),
    components(
        schemas(
            SearchPayload,
            SearchResponsePayload,
            LoadMorePayload,
            LoadMoreResponsePayload,
            GeneratePlanPayload,
            GeneratePlanResponsePayload,
            ChatMessagePayload,
            BookPayload,
        )
    ),
    tags(
        (name = "Book Scout API", description = "API endpoints for conversational book discovery and reading plans.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Payload Structs
//=========================================================================================

/// One chat turn as sent by the client.
#[derive(Deserialize, ToSchema)]
pub struct ChatMessagePayload {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// The conversational search request.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    pub messages: Vec<ChatMessagePayload>,
    #[schema(value_type = Option<Object>)]
    pub onboarding: Option<OnboardingProfile>,
    /// Ids of books already saved or scheduled, never re-surfaced.
    #[serde(default)]
    pub excluded_ids: Vec<String>,
    /// Confirmation token from a previous `needsConfirmation` response.
    #[serde(default)]
    pub pending_topic: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadMorePayload {
    pub search_terms: String,
    #[serde(default)]
    pub start_index: u32,
    #[schema(value_type = Option<Object>)]
    pub onboarding: Option<OnboardingProfile>,
    #[serde(default)]
    pub excluded_ids: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub total_pages: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanPayload {
    pub book: BookPayload,
    #[schema(value_type = Option<Object>)]
    pub onboarding: Option<OnboardingProfile>,
}

/// The search response. When `books` is non-empty, `reply` is empty: the
/// result cards are the response, not prose.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponsePayload {
    pub reply: String,
    #[schema(value_type = Vec<Object>)]
    pub books: Vec<CatalogItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more_books: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_start_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_confirmation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inferred_topic: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadMoreResponsePayload {
    #[schema(value_type = Vec<Object>)]
    pub books: Vec<CatalogItem>,
    pub has_more: bool,
    pub total_items: u32,
    pub next_start_index: u32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanResponsePayload {
    #[schema(value_type = Vec<Object>)]
    pub steps: Vec<ReadingPlanStep>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Run one conversational search turn.
///
/// Classifies the latest user message, derives a catalog query, and returns
/// a bounded, deduplicated, ranked batch of books — or a confirmation
/// question when the request is too vague to search on.
#[utoipa::path(
    post,
    path = "/chat/search",
    request_body = SearchPayload,
    responses(
        (status = 200, description = "Search executed (or confirmation requested)", body = SearchResponsePayload),
        (status = 400, description = "No user message in the request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SearchPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let request = SearchRequest {
        messages: payload.messages.into_iter().map(into_turn).collect(),
        onboarding: payload.onboarding,
        excluded_ids: payload.excluded_ids,
        pending_topic: payload.pending_topic,
    };

    let response = app_state
        .pipeline
        .search(request)
        .await
        .map_err(into_status)?;

    Ok(Json(SearchResponsePayload {
        reply: response.reply,
        search_terms: response.search_terms,
        has_more_books: Some(response.has_more_books),
        next_start_index: Some(response.next_start_index),
        needs_confirmation: response.needs_confirmation.then_some(true),
        inferred_topic: response.inferred_topic,
        books: response.books,
    }))
}

/// Fetch the next batch of results for a previous search.
///
/// Applies the identical filter and exclusion logic as the first batch, so
/// already-shown and already-saved books never reappear.
#[utoipa::path(
    post,
    path = "/books/load-more",
    request_body = LoadMorePayload,
    responses(
        (status = 200, description = "Next batch of books", body = LoadMoreResponsePayload),
        (status = 400, description = "searchTerms is missing"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn load_more_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LoadMorePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let response = app_state
        .pipeline
        .load_more(LoadMoreRequest {
            search_terms: payload.search_terms,
            start_index: payload.start_index,
            onboarding: payload.onboarding,
            excluded_ids: payload.excluded_ids,
        })
        .await
        .map_err(into_status)?;

    Ok(Json(LoadMoreResponsePayload {
        books: response.books,
        has_more: response.has_more,
        total_items: response.total_items,
        next_start_index: response.next_start_index,
    }))
}

/// Generate a time-budgeted reading plan for a chosen book.
#[utoipa::path(
    post,
    path = "/reading-plan/generate",
    request_body = GeneratePlanPayload,
    responses(
        (status = 200, description = "Ordered reading steps", body = GeneratePlanResponsePayload),
        (status = 400, description = "book.totalPages is missing or zero"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GeneratePlanPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let total_pages = payload.book.total_pages.unwrap_or(0);
    if total_pages == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "book.totalPages is required".to_string(),
        ));
    }
    let book = BookPlanSpec {
        title: payload.book.title,
        author: payload.book.author,
        total_pages,
    };

    let steps = app_state
        .pipeline
        .generate_plan(&book, payload.onboarding.as_ref())
        .await
        .map_err(into_status)?;

    Ok(Json(GeneratePlanResponsePayload { steps }))
}

fn into_turn(message: ChatMessagePayload) -> ChatTurn {
    let role = if message.role.eq_ignore_ascii_case("assistant") {
        ChatRole::Assistant
    } else {
        ChatRole::User
    };
    ChatTurn {
        role,
        text: message.content,
    }
}

fn into_status(err: PipelineError) -> (StatusCode, String) {
    match err {
        PipelineError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        PipelineError::MissingConfiguration(msg) => {
            error!("missing configuration: {msg}");
            (StatusCode::INTERNAL_SERVER_ERROR, msg)
        }
    }
}

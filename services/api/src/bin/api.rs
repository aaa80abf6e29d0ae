//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        CompletionPlanAdapter, CompletionQueryAdapter, CompletionReasonAdapter, GoogleBooksAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        generate_plan_handler, load_more_handler, rest::ApiDoc, search_handler, state::AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::post,
    Router,
};
use book_scout_core::{
    DiscoveryPipeline, PlanGenerationService, QueryRefinementService, ReasonGenerationService,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            config.log_level.to_string(),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Catalog Adapter ---
    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let catalog = Arc::new(GoogleBooksAdapter::new(
        http_client,
        config.books_api_base_url.clone(),
        config.catalog_language.clone(),
    ));

    // --- 3. Initialize the Completion Adapters (optional) ---
    // Without a key the pipeline still serves every request through its
    // deterministic fallbacks.
    let mut refinement: Option<Arc<dyn QueryRefinementService>> = None;
    let mut reasons: Option<Arc<dyn ReasonGenerationService>> = None;
    let mut planner: Option<Arc<dyn PlanGenerationService>> = None;
    match &config.completion_api_key {
        Some(api_key) => {
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(&config.completion_base_url);
            let completion_client = Client::with_config(openai_config);
            refinement = Some(Arc::new(CompletionQueryAdapter::new(
                completion_client.clone(),
                config.chat_model.clone(),
            )));
            reasons = Some(Arc::new(CompletionReasonAdapter::new(
                completion_client.clone(),
                config.chat_model.clone(),
            )));
            planner = Some(Arc::new(CompletionPlanAdapter::new(
                completion_client,
                config.plan_model.clone(),
            )));
        }
        None => {
            warn!("GROQ_API_KEY not set: running with deterministic fallbacks only");
        }
    }

    // --- 4. Build the Shared AppState ---
    let pipeline = DiscoveryPipeline::new(catalog, refinement, reasons, planner);
    let app_state = Arc::new(AppState {
        pipeline,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/chat/search", post(search_handler))
        .route("/books/load-more", post(load_more_handler))
        .route("/reading-plan/generate", post(generate_plan_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

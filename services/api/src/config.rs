//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Key for the OpenAI-compatible completion backend. Optional: without
    /// it the pipeline runs on its deterministic fallbacks.
    pub completion_api_key: Option<String>,
    pub completion_base_url: String,
    pub chat_model: String,
    pub plan_model: String,
    pub books_api_base_url: String,
    /// Language the catalog is restricted to (`langRestrict`).
    pub catalog_language: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure
    /// tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Completion backend (optional) ---
        let completion_api_key = std::env::var("GROQ_API_KEY").ok();
        let completion_base_url = std::env::var("GROQ_BASE_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string());
        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "llama-3.1-8b-instant".to_string());
        let plan_model =
            std::env::var("PLAN_MODEL").unwrap_or_else(|_| "llama-3.1-8b-instant".to_string());

        // --- Catalog settings ---
        let books_api_base_url = std::env::var("BOOKS_API_BASE_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com/books/v1".to_string());
        let catalog_language =
            std::env::var("CATALOG_LANGUAGE").unwrap_or_else(|_| "es".to_string());

        Ok(Self {
            bind_address,
            log_level,
            completion_api_key,
            completion_base_url,
            chat_model,
            plan_model,
            books_api_base_url,
            catalog_language,
        })
    }
}

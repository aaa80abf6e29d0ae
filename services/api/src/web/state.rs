//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use book_scout_core::DiscoveryPipeline;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The pipeline itself is stateless between requests; everything
/// request-specific arrives in the payload.
pub struct AppState {
    pub pipeline: DiscoveryPipeline,
    pub config: Arc<Config>,
}

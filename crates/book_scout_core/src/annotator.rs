//! crates/book_scout_core/src/annotator.rs
//!
//! Produces the short personalized "why this book" line for each result.
//! The delegated backend writes the good version; a deterministic template
//! covers backend absence and every failure mode. Annotation never errors.

use crate::domain::{CatalogItem, InterestTag};
use crate::interests::InterestVocabulary;
use crate::ports::ReasonGenerationService;
use std::sync::Arc;
use tracing::warn;

pub struct RecommendationAnnotator {
    backend: Option<Arc<dyn ReasonGenerationService>>,
}

impl RecommendationAnnotator {
    pub fn new(backend: Option<Arc<dyn ReasonGenerationService>>) -> Self {
        Self { backend }
    }

    /// Fills `recommendation_reason` on every item, degrading to the
    /// deterministic template per item on any backend failure.
    pub async fn annotate(&self, items: &mut [CatalogItem], interests: &[InterestTag]) {
        for item in items.iter_mut() {
            let reason = match &self.backend {
                Some(backend) => match backend.recommendation_reason(item, interests).await {
                    Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                    Ok(_) => fallback_reason(item, interests),
                    Err(e) => {
                        warn!("reason generation failed for '{}': {e}", item.title);
                        fallback_reason(item, interests)
                    }
                },
                None => fallback_reason(item, interests),
            };
            item.recommendation_reason = Some(reason);
        }
    }
}

/// Deterministic template: interest-matching items name the matched
/// interests, the rest get a generic encouragement.
fn fallback_reason(item: &CatalogItem, interests: &[InterestTag]) -> String {
    if item.matches_interests {
        let matched: Vec<&str> = interests
            .iter()
            .copied()
            .filter(|&tag| {
                item.genre
                    .as_deref()
                    .is_some_and(|g| InterestVocabulary::matches_category(g, &[tag]))
            })
            .map(InterestVocabulary::term)
            .collect();
        if !matched.is_empty() {
            return format!(
                "Coincide con tu interés en {} y encaja con tu perfil de lectura.",
                matched.join(", ")
            );
        }
    }
    "Una buena opción para descubrir algo nuevo fuera de tus lecturas habituales.".to_string()
}

//! crates/book_scout_core/src/query.rs
//!
//! Derives the catalog search string for one user turn. Deterministic
//! stop-word stripping always works; a delegated keyword extractor can
//! refine it, and a validation pass corrects known extractor drift.

use crate::domain::{InterestTag, SearchQuery};
use crate::interests::InterestVocabulary;
use crate::ports::QueryRefinementService;
use crate::text::{collapse_whitespace, contains_word, remove_word};
use tracing::warn;

/// Stop-word and correction data for the extractor. Defaults cover the
/// Spanish/Portuguese/English phrasings the intent gate accepts.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Articles, politeness phrases and generic nouns stripped from
    /// specific requests before searching.
    pub stop_words: Vec<String>,
    /// Known-bad tokens the delegated extractor leaks from its own
    /// instructions.
    pub denylist: Vec<String>,
    /// Message length (chars) above which the delegated extractor is
    /// worth calling.
    pub extraction_threshold: usize,
    /// Connectives that mark a message as having specific characteristics.
    pub marker_connectives: Vec<String>,
    /// Whether a generic query that lost every interest term to extractor
    /// drift is force-rebuilt from interests. The override never applies
    /// to specific requests.
    pub enforce_interest_terms: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let v = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            stop_words: v(&[
                "quiero",
                "quero",
                "me gusta",
                "me gustaría",
                "buscar",
                "busca",
                "recomendar",
                "recomienda",
                "recomiéndame",
                "recomendación",
                "recomendaciones",
                "recommend",
                "comprar",
                "libro",
                "libros",
                "livro",
                "livros",
                "book",
                "books",
                "sobre",
                "about",
                "de",
                "del",
                "el",
                "la",
                "los",
                "las",
                "un",
                "una",
                "unos",
                "unas",
                "por favor",
                "puedes",
                "podrías",
                "leer",
            ]),
            denylist: v(&["criticism", "critique", "crítica literaria"]),
            extraction_threshold: 20,
            marker_connectives: v(&[
                "con",
                "sobre",
                "que tenga",
                "que tengan",
                "about",
                "with",
                "that has",
            ]),
            enforce_interest_terms: true,
        }
    }
}

pub struct QueryExtractor {
    config: QueryConfig,
}

impl QueryExtractor {
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    /// Builds the catalog query for a specific request.
    ///
    /// The stop-word-stripped message is always computed as the baseline;
    /// the delegated extractor only replaces it when it is configured, the
    /// message shows specific-characteristics markers, and it returns a
    /// non-empty result.
    pub async fn build_specific(
        &self,
        message: &str,
        refinement: Option<&dyn QueryRefinementService>,
    ) -> SearchQuery {
        let mut text = self.strip_stop_words(message);
        if text.is_empty() {
            text = message.trim().to_string();
        }

        if let Some(refinement) = refinement {
            if self.has_specific_markers(message) {
                match refinement.extract_keywords(message, &[], false).await {
                    Ok(extracted) => {
                        let extracted = collapse_whitespace(&extracted);
                        if !extracted.is_empty() {
                            text = extracted;
                        }
                    }
                    Err(e) => warn!("keyword extraction failed, using stripped text: {e}"),
                }
            }
        }

        let text = self.scrub_denylist(&text);
        let text = if text.is_empty() {
            self.strip_stop_words(message)
        } else {
            text
        };

        SearchQuery {
            text,
            is_generic_request: false,
            used_interest_fallback: false,
        }
    }

    /// Builds the catalog query for a generic request.
    ///
    /// With a non-empty interest set this is the OR-join of interest terms
    /// and never calls the delegated extractor. Without interests it falls
    /// back to the specific-request treatment of the message, then
    /// re-verifies the result post hoc when an extractor was involved.
    pub async fn build_generic(
        &self,
        message: &str,
        interests: &[InterestTag],
        refinement: Option<&dyn QueryRefinementService>,
    ) -> SearchQuery {
        if !interests.is_empty() {
            return SearchQuery {
                text: InterestVocabulary::query_for(interests),
                is_generic_request: true,
                used_interest_fallback: true,
            };
        }

        let mut text = self.strip_stop_words(message);
        if let Some(refinement) = refinement {
            match refinement.extract_keywords(message, interests, true).await {
                Ok(extracted) => {
                    let extracted = collapse_whitespace(&extracted);
                    if !extracted.is_empty() {
                        text = extracted;
                    }
                }
                Err(e) => warn!("keyword extraction failed, using stripped text: {e}"),
            }
        }

        if self.denylist_hit(&text) {
            // Nothing to rebuild from without interests; scrub instead.
            text = self.scrub_denylist(&text);
        }
        if text.is_empty() {
            text = message.trim().to_string();
        }

        SearchQuery {
            text,
            is_generic_request: true,
            used_interest_fallback: false,
        }
    }

    /// Post-hoc safety net for generic queries built from interests: if the
    /// final text no longer contains a single interest term (extractor
    /// drift), force-overwrite with the interest-only query.
    pub fn correct_generic(&self, query: &mut SearchQuery, interests: &[InterestTag]) {
        if !self.config.enforce_interest_terms
            || !query.is_generic_request
            || interests.is_empty()
        {
            return;
        }
        let lower = query.text.to_lowercase();
        let keeps_a_term = InterestVocabulary::terms_for(interests)
            .iter()
            .any(|term| lower.contains(term));
        if !keeps_a_term || self.denylist_hit(&query.text) {
            warn!(
                "generic query '{}' lost its interest terms, rebuilding",
                query.text
            );
            query.text = InterestVocabulary::query_for(interests);
            query.used_interest_fallback = true;
        }
    }

    /// Strips the stop-word list with word-boundary matching and collapses
    /// whitespace. Operates on lowercased text.
    pub fn strip_stop_words(&self, message: &str) -> String {
        let mut text = message.to_lowercase();
        for word in &self.config.stop_words {
            text = remove_word(&text, word);
        }
        collapse_whitespace(&text)
    }

    /// Connectives, vocabulary topic words, or raw length mark a message
    /// as specific enough to justify a completion call.
    pub fn has_specific_markers(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.config
            .marker_connectives
            .iter()
            .any(|c| contains_word(&lower, c))
            || InterestVocabulary::all_terms().any(|t| lower.contains(t))
            || message.chars().count() > self.config.extraction_threshold
    }

    fn denylist_hit(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.config
            .denylist
            .iter()
            .any(|bad| contains_word(&lower, bad))
    }

    fn scrub_denylist(&self, text: &str) -> String {
        let mut out = text.to_lowercase();
        for bad in &self.config.denylist {
            out = remove_word(&out, bad);
        }
        collapse_whitespace(&out)
    }
}

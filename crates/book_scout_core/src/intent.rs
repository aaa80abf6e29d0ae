//! crates/book_scout_core/src/intent.rs
//!
//! Decides whether a user turn is a book-search request, and how specific
//! it is. Keyword lists and thresholds are configuration data so the
//! multilingual variants of the original heuristics are parameterizations
//! of one strategy, not separate code paths.

use crate::text::{collapse_whitespace, contains_word};

/// The gate's verdict for one user turn. Topic inference for the
/// `AmbiguousBookMention` case is delegated by the pipeline, which turns a
/// usable topic into a confirmation question instead of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentClass {
    /// Not a book request at all; answer conversationally.
    NotBookSearch,
    /// "Recommend me something" — driven by stored interests.
    GenericBookSearch,
    /// Carries enough detail to search on its own merits.
    SpecificBookSearch,
    /// Mentions books without a searchable payload; worth one
    /// confirmation round-trip before committing a catalog call.
    AmbiguousBookMention,
}

/// Keyword lists and thresholds driving classification. The default covers
/// Spanish, Portuguese and English phrasings.
#[derive(Debug, Clone)]
pub struct IntentConfig {
    /// Words that merely mention books.
    pub mention_keywords: Vec<String>,
    /// Recommend/search/buy/want-to-read phrasings.
    pub request_keywords: Vec<String>,
    /// Whole messages that are a bare recommendation request.
    pub bare_request_patterns: Vec<String>,
    /// Connectives that qualify a request ("con", "sobre", "that has").
    pub qualifying_connectives: Vec<String>,
    /// Message length (chars) above which a request counts as specific.
    pub specificity_threshold: usize,
    /// Words introducing a topic in a confirmation follow-up.
    pub topic_markers: Vec<String>,
    /// Affirmative one-word replies accepted for a pending confirmation.
    pub affirmations: Vec<String>,
    /// Words that mark a follow-up as declining, overriding any topic
    /// mention in the same message.
    pub negations: Vec<String>,
}

impl Default for IntentConfig {
    fn default() -> Self {
        let v = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            mention_keywords: v(&["libro", "libros", "livro", "livros", "book", "books"]),
            request_keywords: v(&[
                "recomendar",
                "recomienda",
                "recomiéndame",
                "recomendación",
                "recomendaciones",
                "recommend",
                "buscar libro",
                "buscar libros",
                "comprar libro",
                "comprar libros",
                "quiero leer",
                "quero ler",
                "sugerir",
                "sugiere",
            ]),
            bare_request_patterns: v(&[
                "recomendar un libro",
                "recomendar libro",
                "recomiéndame un libro",
                "recomienda un libro",
                "recommend a book",
                "recomendar um livro",
            ]),
            qualifying_connectives: v(&[
                "con",
                "sobre",
                "que tenga",
                "que tengan",
                "acerca de",
                "with",
                "about",
                "that has",
            ]),
            specificity_threshold: 30,
            topic_markers: v(&["sobre", "about", "de"]),
            affirmations: v(&["sí", "si", "sim", "yes", "claro", "vale", "ok", "dale"]),
            negations: v(&["no", "não", "nao", "not", "tampoco", "nunca", "jamás"]),
        }
    }
}

pub struct IntentGate {
    config: IntentConfig,
}

impl IntentGate {
    pub fn new(config: IntentConfig) -> Self {
        Self { config }
    }

    /// Classifies a user message.
    ///
    /// 1. No book keyword at all → `NotBookSearch`.
    /// 2. A bare recommendation sentence → `GenericBookSearch`.
    /// 3. Qualifying connectives or length above the threshold →
    ///    `SpecificBookSearch`.
    /// 4. A request keyword without specificity → `GenericBookSearch`;
    ///    a mere book mention → `AmbiguousBookMention`.
    pub fn classify(&self, message: &str) -> IntentClass {
        let lower = message.to_lowercase();

        let mentions = self
            .config
            .mention_keywords
            .iter()
            .any(|k| lower.contains(k.as_str()));
        let requests = self
            .config
            .request_keywords
            .iter()
            .any(|k| lower.contains(k.as_str()));
        if !mentions && !requests {
            return IntentClass::NotBookSearch;
        }

        let bare = collapse_whitespace(
            lower.trim_matches(|c: char| c.is_whitespace() || ".,!?¡¿".contains(c)),
        );
        if self
            .config
            .bare_request_patterns
            .iter()
            .any(|p| bare == *p)
        {
            return IntentClass::GenericBookSearch;
        }

        let has_connective = self
            .config
            .qualifying_connectives
            .iter()
            .any(|c| contains_word(&lower, c));
        if has_connective || message.chars().count() > self.config.specificity_threshold {
            return IntentClass::SpecificBookSearch;
        }

        if requests {
            IntentClass::GenericBookSearch
        } else {
            IntentClass::AmbiguousBookMention
        }
    }

    /// Resolves a pending-confirmation token against the follow-up turn.
    ///
    /// The topic is confirmed by a bare affirmation, by echoing the topic
    /// on its own, or by a book request carrying a topic-marker phrase
    /// ("libros sobre {topic}"). A negation word anywhere in the message
    /// declines, even when the topic is mentioned alongside it. The
    /// confirmed topic becomes the search query verbatim, bypassing
    /// extraction.
    pub fn confirmed_topic(&self, message: &str, pending_topic: &str) -> Option<String> {
        let topic = pending_topic.trim();
        if topic.is_empty() {
            return None;
        }
        let lower = message.to_lowercase();
        let topic_lower = topic.to_lowercase();
        let bare = collapse_whitespace(
            lower.trim_matches(|c: char| c.is_whitespace() || ".,!?¡¿".contains(c)),
        );
        if bare == topic_lower || self.config.affirmations.iter().any(|a| bare == *a) {
            return Some(topic.to_string());
        }
        if self.config.negations.iter().any(|n| contains_word(&lower, n)) {
            return None;
        }
        let mentions_books = self
            .config
            .mention_keywords
            .iter()
            .chain(self.config.request_keywords.iter())
            .any(|k| lower.contains(k.as_str()));
        let marker_hit = self
            .config
            .topic_markers
            .iter()
            .any(|m| contains_word(&lower, &format!("{m} {topic_lower}")));
        (mentions_books && marker_hit).then(|| topic.to_string())
    }

    /// Whether a topic phrase returned by the delegated extractor is worth
    /// a confirmation question: short, non-empty, not a refusal.
    pub fn topic_is_usable(&self, topic: &str) -> bool {
        let topic = topic.trim();
        !topic.is_empty() && topic.split_whitespace().count() <= 6 && topic.chars().count() <= 60
    }
}

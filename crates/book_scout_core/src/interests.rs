//! crates/book_scout_core/src/interests.rs
//!
//! Static mapping from onboarding interest tags to the Spanish vocabulary
//! the catalog is actually searched with.

use crate::domain::InterestTag;

const VOCABULARY: &[(InterestTag, &str)] = &[
    (InterestTag::Fantasy, "fantasía"),
    (InterestTag::Scifi, "ciencia ficción"),
    (InterestTag::Romance, "romance"),
    (InterestTag::Mystery, "misterio"),
    (InterestTag::Thriller, "thriller"),
    (InterestTag::History, "historia"),
    (InterestTag::Biography, "biografía"),
    (InterestTag::Psychology, "psicología"),
    (InterestTag::Business, "negocios"),
    (InterestTag::Selfhelp, "autoayuda"),
    (InterestTag::Poetry, "poesía"),
    (InterestTag::Adventure, "aventura"),
];

pub struct InterestVocabulary;

impl InterestVocabulary {
    /// The catalog search term for one interest tag.
    pub fn term(tag: InterestTag) -> &'static str {
        VOCABULARY
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, term)| *term)
            .unwrap_or_default()
    }

    /// Catalog search terms for a set of interests, in selection order.
    pub fn terms_for(interests: &[InterestTag]) -> Vec<&'static str> {
        interests.iter().map(|&t| Self::term(t)).collect()
    }

    /// Every term in the vocabulary, used as topic markers by the
    /// query extractor.
    pub fn all_terms() -> impl Iterator<Item = &'static str> {
        VOCABULARY.iter().map(|(_, term)| *term)
    }

    /// The OR-joined catalog query for a set of interests,
    /// e.g. `"fantasía OR misterio"`.
    pub fn query_for(interests: &[InterestTag]) -> String {
        Self::terms_for(interests).join(" OR ")
    }

    /// Whether a catalog category string matches any of the user's
    /// interests. Matching is a bidirectional substring test on
    /// lowercased text, mirroring how loosely the catalog categorizes.
    pub fn matches_category(category: &str, interests: &[InterestTag]) -> bool {
        let category = category.to_lowercase();
        if category.is_empty() {
            return false;
        }
        Self::terms_for(interests)
            .iter()
            .any(|term| category.contains(term) || term.contains(category.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_joins_terms_with_or() {
        let q = InterestVocabulary::query_for(&[InterestTag::Fantasy, InterestTag::Mystery]);
        assert_eq!(q, "fantasía OR misterio");
    }

    #[test]
    fn category_matching_is_bidirectional() {
        let interests = [InterestTag::Fantasy];
        assert!(InterestVocabulary::matches_category(
            "Fantasía épica",
            &interests
        ));
        // category shorter than the term
        assert!(InterestVocabulary::matches_category("fanta", &interests));
        assert!(!InterestVocabulary::matches_category(
            "Cocina",
            &interests
        ));
        assert!(!InterestVocabulary::matches_category("", &interests));
    }
}

//! crates/book_scout_core/src/ranker.rs
//!
//! Orders aggregated results so interest-matching items come first.

use crate::domain::{CatalogItem, InterestTag, SearchQuery};

pub struct ResultRanker;

impl ResultRanker {
    /// Stable partition: interest-matching items move before the rest,
    /// relative order within each group preserved. Only applied to generic
    /// requests from a profile with interests; a specific request is
    /// served in catalog order.
    pub fn rank(items: &mut [CatalogItem], query: &SearchQuery, interests: &[InterestTag]) {
        if !query.is_generic_request || interests.is_empty() {
            return;
        }
        items.sort_by_key(|item| !item.matches_interests);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, matches: bool) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: id.to_string(),
            author: String::new(),
            description: None,
            cover_url: None,
            genre: None,
            page_count: None,
            published_date: None,
            rating: None,
            price: None,
            buy_url: None,
            preview_url: None,
            matches_interests: matches,
            recommendation_reason: None,
        }
    }

    fn generic_query() -> SearchQuery {
        SearchQuery {
            text: "fantasía".to_string(),
            is_generic_request: true,
            used_interest_fallback: true,
        }
    }

    #[test]
    fn partition_is_stable_within_each_group() {
        let mut items = vec![
            item("a", false),
            item("b", true),
            item("c", false),
            item("d", true),
            item("e", false),
        ];
        ResultRanker::rank(&mut items, &generic_query(), &[InterestTag::Fantasy]);
        let order: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn specific_requests_keep_catalog_order() {
        let mut items = vec![item("a", false), item("b", true)];
        let query = SearchQuery {
            is_generic_request: false,
            ..generic_query()
        };
        ResultRanker::rank(&mut items, &query, &[InterestTag::Fantasy]);
        let order: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn empty_interest_set_keeps_catalog_order() {
        let mut items = vec![item("a", false), item("b", true)];
        ResultRanker::rank(&mut items, &generic_query(), &[]);
        let order: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }
}

//! crates/book_scout_core/src/aggregator.rs
//!
//! Fetches candidate results from the catalog in pages, filters and
//! deduplicates them, and keeps fetching until a target count is reached
//! or the fetch budget is spent. Aggregation is best-effort: a failed page
//! fetch truncates the loop instead of failing the request.

use crate::domain::{AggregatedResults, CatalogItem, OnboardingProfile, ReaderLevel};
use crate::interests::InterestVocabulary;
use crate::ports::CatalogService;
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// How many results one batch should contain.
    pub target_count: usize,
    /// Page size of the first fetch.
    pub initial_page_size: u32,
    /// Follow-up fetches request `target_count * follow_up_factor` rows.
    pub follow_up_factor: u32,
    /// Budget of additional fetches after the first page.
    pub max_additional_fetches: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            target_count: 5,
            initial_page_size: 10,
            follow_up_factor: 2,
            max_additional_fetches: 5,
        }
    }
}

pub struct CatalogAggregator {
    config: AggregatorConfig,
}

impl CatalogAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Runs one aggregation pass starting at `start_offset`. The same pass,
    /// seeded with the `next_offset` of a previous call, backs the
    /// load-more operation with identical filter and exclusion logic.
    pub async fn aggregate(
        &self,
        catalog: &dyn CatalogService,
        query: &str,
        profile: Option<&OnboardingProfile>,
        excluded_ids: &HashSet<String>,
        start_offset: u32,
    ) -> AggregatedResults {
        let target = self.config.target_count;
        let mut collected: Vec<CatalogItem> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut consumed = start_offset;
        let mut total_items = 0u32;

        let first = catalog
            .search_volumes(query, start_offset, self.config.initial_page_size)
            .await;
        match first {
            Ok(page) => {
                total_items = page.total_items;
                let raw_count = page.items.len() as u32;
                consumed += raw_count;
                self.absorb(page.items, profile, excluded_ids, &mut seen_ids, &mut collected);
                if raw_count == 0 {
                    return finish(collected, target, total_items, consumed);
                }
            }
            Err(e) => {
                warn!("catalog fetch failed for '{query}': {e}");
                return finish(collected, target, total_items, consumed);
            }
        }

        let mut additional_fetches = 0;
        while collected.len() < target
            && consumed < total_items
            && additional_fetches < self.config.max_additional_fetches
        {
            let page_size = self.config.target_count as u32 * self.config.follow_up_factor;
            match catalog.search_volumes(query, consumed, page_size).await {
                Ok(page) => {
                    total_items = page.total_items;
                    let raw_count = page.items.len() as u32;
                    self.absorb(page.items, profile, excluded_ids, &mut seen_ids, &mut collected);
                    consumed += raw_count;
                    additional_fetches += 1;
                    if raw_count == 0 {
                        break;
                    }
                }
                Err(e) => {
                    warn!("catalog follow-up fetch failed for '{query}': {e}");
                    break;
                }
            }
        }

        debug!(
            query,
            collected = collected.len(),
            consumed,
            total_items,
            "aggregation pass finished"
        );
        finish(collected, target, total_items, consumed)
    }

    /// Applies the per-item filter chain: reading-level fit, exclusion set,
    /// cross-page dedup; computes `matches_interests` on survivors.
    fn absorb(
        &self,
        items: Vec<CatalogItem>,
        profile: Option<&OnboardingProfile>,
        excluded_ids: &HashSet<String>,
        seen_ids: &mut HashSet<String>,
        collected: &mut Vec<CatalogItem>,
    ) {
        for mut item in items {
            if excluded_ids.contains(&item.id) || !seen_ids.insert(item.id.clone()) {
                continue;
            }
            if let Some(profile) = profile {
                if !level_fits(profile.reader_level, item.page_count) {
                    continue;
                }
                item.matches_interests = item
                    .genre
                    .as_deref()
                    .is_some_and(|g| InterestVocabulary::matches_category(g, &profile.interests));
            }
            collected.push(item);
        }
    }
}

/// Whether a book's length suits the reader's level. Unknown page counts
/// always pass.
fn level_fits(level: ReaderLevel, page_count: Option<u32>) -> bool {
    let Some(pages) = page_count.filter(|&p| p > 0) else {
        return true;
    };
    match level {
        ReaderLevel::Beginner => pages <= 300,
        ReaderLevel::Intermediate => (150..=600).contains(&pages),
        ReaderLevel::Advanced => pages >= 300,
    }
}

fn finish(
    mut collected: Vec<CatalogItem>,
    target: usize,
    total_items: u32,
    consumed: u32,
) -> AggregatedResults {
    let leftover = collected.len() > target;
    collected.truncate(target);
    AggregatedResults {
        has_more: consumed < total_items || leftover,
        total_items,
        next_offset: consumed,
        items: collected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogPage, InterestTag};
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn item(id: &str, genre: &str, pages: u32) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: format!("Título {id}"),
            author: "Autor".to_string(),
            description: None,
            cover_url: None,
            genre: (!genre.is_empty()).then(|| genre.to_string()),
            page_count: (pages > 0).then_some(pages),
            published_date: None,
            rating: None,
            price: None,
            buy_url: None,
            preview_url: None,
            matches_interests: false,
            recommendation_reason: None,
        }
    }

    fn profile(interests: &[InterestTag], level: ReaderLevel) -> OnboardingProfile {
        OnboardingProfile {
            interests: interests.to_vec(),
            daily_reading_minutes: 30,
            reader_level: level,
        }
    }

    /// A catalog backed by a fixed row list, serving slices by offset.
    struct FixedCatalog {
        rows: Vec<CatalogItem>,
        calls: Mutex<Vec<(u32, u32)>>,
    }

    impl FixedCatalog {
        fn new(rows: Vec<CatalogItem>) -> Self {
            Self {
                rows,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CatalogService for FixedCatalog {
        async fn search_volumes(
            &self,
            _query: &str,
            start_index: u32,
            max_results: u32,
        ) -> PortResult<CatalogPage> {
            self.calls.lock().unwrap().push((start_index, max_results));
            let start = start_index as usize;
            let items = self
                .rows
                .iter()
                .skip(start)
                .take(max_results as usize)
                .cloned()
                .collect();
            Ok(CatalogPage {
                total_items: self.rows.len() as u32,
                items,
            })
        }
    }

    /// A catalog that fails after serving its first page.
    struct FlakyCatalog {
        first: Vec<CatalogItem>,
    }

    #[async_trait]
    impl CatalogService for FlakyCatalog {
        async fn search_volumes(
            &self,
            _query: &str,
            start_index: u32,
            _max_results: u32,
        ) -> PortResult<CatalogPage> {
            if start_index == 0 {
                Ok(CatalogPage {
                    total_items: 100,
                    items: self.first.clone(),
                })
            } else {
                Err(PortError::Upstream("HTTP 503".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn excluded_ids_never_appear_in_results() {
        let rows: Vec<_> = (0..10).map(|i| item(&format!("b{i}"), "", 0)).collect();
        let catalog = FixedCatalog::new(rows);
        let excluded: HashSet<String> = ["b0".to_string(), "b3".to_string()].into();
        let agg = CatalogAggregator::new(AggregatorConfig::default());

        let out = agg.aggregate(&catalog, "q", None, &excluded, 0).await;
        assert_eq!(out.items.len(), 5);
        assert!(out.items.iter().all(|b| !excluded.contains(&b.id)));
    }

    #[tokio::test]
    async fn results_are_pairwise_distinct_across_pages() {
        // Duplicate ids across the first and second page.
        let mut rows: Vec<_> = (0..10).map(|i| item(&format!("b{i}"), "", 0)).collect();
        rows.extend((5..15).map(|i| item(&format!("b{i}"), "", 0)));
        let catalog = FixedCatalog::new(rows);
        let agg = CatalogAggregator::new(AggregatorConfig::default());
        let excluded: HashSet<String> =
            (0..8).map(|i| format!("b{i}")).collect();

        let out = agg.aggregate(&catalog, "q", None, &excluded, 0).await;
        let mut ids: Vec<_> = out.items.iter().map(|b| b.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), out.items.len());
    }

    #[tokio::test]
    async fn keeps_fetching_until_target_reached() {
        let rows: Vec<_> = (0..40).map(|i| item(&format!("b{i}"), "", 0)).collect();
        let catalog = FixedCatalog::new(rows);
        // Exclude the entire first page so a follow-up fetch is required.
        let excluded: HashSet<String> = (0..10).map(|i| format!("b{i}")).collect();
        let agg = CatalogAggregator::new(AggregatorConfig::default());

        let out = agg.aggregate(&catalog, "q", None, &excluded, 0).await;
        assert_eq!(out.items.len(), 5);
        let calls = catalog.calls.lock().unwrap().clone();
        assert_eq!(calls[0], (0, 10));
        assert_eq!(calls[1], (10, 10));
    }

    #[tokio::test]
    async fn fetch_budget_bounds_the_loop() {
        // Every row excluded: the loop can never fill the target.
        let rows: Vec<_> = (0..200).map(|i| item(&format!("b{i}"), "", 0)).collect();
        let excluded: HashSet<String> = rows.iter().map(|b| b.id.clone()).collect();
        let catalog = FixedCatalog::new(rows);
        let agg = CatalogAggregator::new(AggregatorConfig::default());

        let out = agg.aggregate(&catalog, "q", None, &excluded, 0).await;
        assert!(out.items.is_empty());
        // One initial fetch plus at most five additional ones.
        assert_eq!(catalog.calls.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn failed_follow_up_returns_what_was_collected() {
        let first: Vec<_> = (0..4).map(|i| item(&format!("b{i}"), "", 0)).collect();
        let catalog = FlakyCatalog { first };
        let agg = CatalogAggregator::new(AggregatorConfig::default());

        let out = agg
            .aggregate(&catalog, "q", None, &HashSet::new(), 0)
            .await;
        assert_eq!(out.items.len(), 4);
        assert!(out.has_more);
    }

    #[tokio::test]
    async fn load_more_with_next_offset_never_repeats_results() {
        let rows: Vec<_> = (0..30).map(|i| item(&format!("b{i}"), "", 0)).collect();
        let catalog = FixedCatalog::new(rows);
        let agg = CatalogAggregator::new(AggregatorConfig::default());
        let excluded = HashSet::new();

        let first = agg.aggregate(&catalog, "q", None, &excluded, 0).await;
        let second = agg
            .aggregate(&catalog, "q", None, &excluded, first.next_offset)
            .await;

        let first_ids: HashSet<_> = first.items.iter().map(|b| b.id.clone()).collect();
        assert!(second.items.iter().all(|b| !first_ids.contains(&b.id)));
        assert!(!second.items.is_empty());
    }

    #[tokio::test]
    async fn reading_level_filter_drops_unsuitable_lengths() {
        let rows = vec![
            item("short", "", 90),
            item("fits", "", 250),
            item("long", "", 700),
            item("unknown", "", 0),
        ];
        let catalog = FixedCatalog::new(rows);
        let agg = CatalogAggregator::new(AggregatorConfig::default());
        let p = profile(&[], ReaderLevel::Intermediate);

        let out = agg
            .aggregate(&catalog, "q", Some(&p), &HashSet::new(), 0)
            .await;
        let ids: Vec<_> = out.items.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["fits", "unknown"]);
    }

    #[tokio::test]
    async fn interest_match_is_computed_from_the_genre() {
        let rows = vec![item("a", "Fantasía épica", 200), item("b", "Cocina", 200)];
        let catalog = FixedCatalog::new(rows);
        let agg = CatalogAggregator::new(AggregatorConfig::default());
        let p = profile(&[InterestTag::Fantasy], ReaderLevel::Intermediate);

        let out = agg
            .aggregate(&catalog, "q", Some(&p), &HashSet::new(), 0)
            .await;
        assert!(out.items[0].matches_interests);
        assert!(!out.items[1].matches_interests);
    }

    #[tokio::test]
    async fn has_more_reflects_unconsumed_catalog_rows() {
        let rows: Vec<_> = (0..8).map(|i| item(&format!("b{i}"), "", 0)).collect();
        let catalog = FixedCatalog::new(rows);
        let agg = CatalogAggregator::new(AggregatorConfig::default());

        let out = agg
            .aggregate(&catalog, "q", None, &HashSet::new(), 0)
            .await;
        assert_eq!(out.items.len(), 5);
        // All 8 rows were consumed by the 10-wide first page, but 3
        // filtered-but-unused items remain beyond the truncation.
        assert!(out.has_more);
        assert_eq!(out.total_items, 8);
    }
}

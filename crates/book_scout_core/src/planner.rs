//! crates/book_scout_core/src/planner.rs
//!
//! Turns a book's page count and the user's daily time budget into an
//! ordered sequence of reading steps. A delegated planner produces the
//! chapter-aware version; a deterministic even split covers planner
//! absence, failure, and any output that breaks the coverage invariant.

use crate::domain::{
    BookPlanSpec, OnboardingProfile, PlannedStep, ReaderLevel, ReadingPlanStep, ReadingSpeedModel,
};
use crate::ports::PlanGenerationService;
use std::sync::Arc;
use tracing::warn;

/// Defaults applied when the request carries no onboarding profile.
const DEFAULT_DAILY_MINUTES: u32 = 30;
const DEFAULT_LEVEL: ReaderLevel = ReaderLevel::Intermediate;

impl ReadingSpeedModel {
    /// Derives the speed figures for one (profile, book) pairing.
    pub fn derive(profile: Option<&OnboardingProfile>, total_pages: u32) -> Self {
        let (daily_minutes, level) = match profile {
            Some(p) => (p.daily_reading_minutes.max(1), p.reader_level),
            None => (DEFAULT_DAILY_MINUTES, DEFAULT_LEVEL),
        };
        let pages_per_minute = level.pages_per_minute();
        let pages_per_session = (daily_minutes * pages_per_minute).max(1);
        let estimated_days = total_pages.div_ceil(pages_per_session).max(1);
        Self {
            pages_per_minute,
            pages_per_session,
            estimated_days,
            minutes_per_session: pages_per_session.div_ceil(pages_per_minute),
        }
    }
}

pub struct ReadingPlanSegmenter {
    planner: Option<Arc<dyn PlanGenerationService>>,
}

impl ReadingPlanSegmenter {
    pub fn new(planner: Option<Arc<dyn PlanGenerationService>>) -> Self {
        Self { planner }
    }

    /// Produces the ordered step list for a book. `total_pages` must be
    /// positive; callers reject zero before invoking the segmenter.
    pub async fn segment(
        &self,
        book: &BookPlanSpec,
        profile: Option<&OnboardingProfile>,
    ) -> Vec<ReadingPlanStep> {
        let model = ReadingSpeedModel::derive(profile, book.total_pages);

        if let Some(planner) = &self.planner {
            match planner.generate_steps(book, &model).await {
                Ok(raw) => match normalize_steps(raw, &model, book.total_pages) {
                    Some(steps) => return steps,
                    None => warn!(
                        "planner output for '{}' broke the coverage invariant, using even split",
                        book.title
                    ),
                },
                Err(e) => warn!("plan generation failed for '{}': {e}", book.title),
            }
        }

        even_split(book.total_pages, &model)
    }
}

/// Normalizes delegated planner output into final steps, filling omitted
/// ids, titles and time estimates. Returns `None` when the ranges do not
/// partition `[1, total_pages]` in ascending order.
fn normalize_steps(
    raw: Vec<PlannedStep>,
    model: &ReadingSpeedModel,
    total_pages: u32,
) -> Option<Vec<ReadingPlanStep>> {
    if raw.is_empty() {
        return None;
    }
    let mut steps = Vec::with_capacity(raw.len());
    let mut expected_start = 1u32;
    for (index, step) in raw.into_iter().enumerate() {
        let (start, end) = parse_page_range(&step.pages)?;
        if start != expected_start || end < start || end > total_pages {
            return None;
        }
        expected_start = end.checked_add(1)?;

        let width = end - start + 1;
        let estimated_minutes = step
            .estimated_minutes
            .filter(|&m| m > 0)
            .unwrap_or_else(|| width.div_ceil(model.pages_per_minute));

        steps.push(ReadingPlanStep {
            id: step
                .id
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| format!("step_{}", index + 1)),
            title: step
                .title
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| format!("Etapa {}", index + 1)),
            description: step.description.filter(|s| !s.trim().is_empty()),
            page_range: format!("{start}-{end}"),
            estimated_minutes,
            completed: false,
            completed_at: None,
        });
    }
    (expected_start == total_pages + 1).then_some(steps)
}

/// Parses "start-end" or a bare "start" into an inclusive page range.
fn parse_page_range(pages: &str) -> Option<(u32, u32)> {
    let pages = pages.trim();
    let (start, end) = match pages.split_once('-') {
        Some((a, b)) => (a.trim().parse().ok()?, b.trim().parse().ok()?),
        None => {
            let p = pages.parse().ok()?;
            (p, p)
        }
    };
    (start >= 1).then_some((start, end))
}

/// Deterministic fallback: equal-width consecutive ranges sized to one
/// reading session, the last one absorbing the remainder.
fn even_split(total_pages: u32, model: &ReadingSpeedModel) -> Vec<ReadingPlanStep> {
    // Range arithmetic in u64: the products can exceed u32 near the top of
    // the page-count range even when every page number itself fits.
    let per_step = u64::from(model.pages_per_session);
    let total = u64::from(total_pages);
    let step_count = total.div_ceil(per_step);
    (0..step_count)
        .map(|i| {
            let start = i * per_step + 1;
            let end = ((i + 1) * per_step).min(total);
            let width = (end - start + 1) as u32;
            ReadingPlanStep {
                id: format!("step_{}", i + 1),
                title: format!("Etapa {}", i + 1),
                description: Some(format!("Lee las páginas {start} a {end}")),
                page_range: format!("{start}-{end}"),
                estimated_minutes: width.div_ceil(model.pages_per_minute),
                completed: false,
                completed_at: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InterestTag;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;

    fn profile(minutes: u32, level: ReaderLevel) -> OnboardingProfile {
        OnboardingProfile {
            interests: vec![InterestTag::Fantasy],
            daily_reading_minutes: minutes,
            reader_level: level,
        }
    }

    fn book(total_pages: u32) -> BookPlanSpec {
        BookPlanSpec {
            title: "El Nombre del Viento".to_string(),
            author: "Patrick Rothfuss".to_string(),
            total_pages,
        }
    }

    fn assert_partition(steps: &[ReadingPlanStep], total_pages: u32) {
        let mut expected_start = 1;
        for step in steps {
            let (start, end) = parse_page_range(&step.page_range).unwrap();
            assert_eq!(start, expected_start, "gap or overlap at {}", step.page_range);
            assert!(end >= start);
            expected_start = end + 1;
        }
        assert_eq!(expected_start, total_pages + 1, "plan does not end at the last page");
    }

    struct FixedPlanner {
        steps: Vec<PlannedStep>,
    }

    #[async_trait]
    impl PlanGenerationService for FixedPlanner {
        async fn generate_steps(
            &self,
            _book: &BookPlanSpec,
            _model: &ReadingSpeedModel,
        ) -> PortResult<Vec<PlannedStep>> {
            Ok(self.steps.clone())
        }
    }

    struct BrokenPlanner;

    #[async_trait]
    impl PlanGenerationService for BrokenPlanner {
        async fn generate_steps(
            &self,
            _book: &BookPlanSpec,
            _model: &ReadingSpeedModel,
        ) -> PortResult<Vec<PlannedStep>> {
            Err(PortError::Malformed("not json".into()))
        }
    }

    #[test]
    fn speed_model_matches_the_level_table() {
        let m = ReadingSpeedModel::derive(Some(&profile(30, ReaderLevel::Intermediate)), 300);
        assert_eq!(m.pages_per_minute, 2);
        assert_eq!(m.pages_per_session, 60);
        assert_eq!(m.estimated_days, 5);

        let m = ReadingSpeedModel::derive(Some(&profile(20, ReaderLevel::Beginner)), 300);
        assert_eq!(m.pages_per_minute, 1);
        assert_eq!(m.pages_per_session, 20);
        assert_eq!(m.estimated_days, 15);
    }

    #[test]
    fn missing_profile_uses_the_defaults() {
        let m = ReadingSpeedModel::derive(None, 300);
        assert_eq!(m.pages_per_minute, 2);
        assert_eq!(m.pages_per_session, 60);
    }

    #[tokio::test]
    async fn fallback_produces_the_expected_even_split() {
        // 300 pages, 30 min/day, intermediate: five 60-page steps of 30 min.
        let segmenter = ReadingPlanSegmenter::new(None);
        let steps = segmenter
            .segment(&book(300), Some(&profile(30, ReaderLevel::Intermediate)))
            .await;

        assert_eq!(steps.len(), 5);
        let ranges: Vec<_> = steps.iter().map(|s| s.page_range.as_str()).collect();
        assert_eq!(ranges, vec!["1-60", "61-120", "121-180", "181-240", "241-300"]);
        assert!(steps.iter().all(|s| s.estimated_minutes == 30));
        assert!(steps.iter().all(|s| !s.completed && s.completed_at.is_none()));
    }

    #[tokio::test]
    async fn fallback_last_step_absorbs_the_remainder() {
        let segmenter = ReadingPlanSegmenter::new(None);
        let steps = segmenter
            .segment(&book(130), Some(&profile(30, ReaderLevel::Intermediate)))
            .await;

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].page_range, "121-130");
        assert_eq!(steps[2].estimated_minutes, 5);
        assert_partition(&steps, 130);
    }

    #[tokio::test]
    async fn fallback_partitions_for_awkward_sizes() {
        for total in [1, 7, 59, 60, 61, 299, 301] {
            let segmenter = ReadingPlanSegmenter::new(None);
            let steps = segmenter
                .segment(&book(total), Some(&profile(30, ReaderLevel::Intermediate)))
                .await;
            assert_partition(&steps, total);
            let total_minutes: u32 = steps.iter().map(|s| s.estimated_minutes).sum();
            // Within rounding tolerance of total_pages / pages_per_minute.
            assert!(total_minutes >= total.div_ceil(2));
            assert!(total_minutes <= total.div_ceil(2) + steps.len() as u32);
        }
    }

    #[tokio::test]
    async fn planner_steps_are_normalized_and_kept() {
        let planner = FixedPlanner {
            steps: vec![
                PlannedStep {
                    id: Some("step_1".into()),
                    title: Some("Introducción".into()),
                    description: Some("Los primeros capítulos".into()),
                    pages: "1-70".into(),
                    estimated_minutes: None,
                },
                PlannedStep {
                    id: None,
                    title: None,
                    description: None,
                    pages: "71-120".into(),
                    estimated_minutes: Some(25),
                },
            ],
        };
        let segmenter = ReadingPlanSegmenter::new(Some(Arc::new(planner)));
        let steps = segmenter
            .segment(&book(120), Some(&profile(30, ReaderLevel::Intermediate)))
            .await;

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].title, "Introducción");
        // 70 pages at 2 pages/minute.
        assert_eq!(steps[0].estimated_minutes, 35);
        assert_eq!(steps[1].id, "step_2");
        assert_eq!(steps[1].title, "Etapa 2");
        assert_eq!(steps[1].estimated_minutes, 25);
        assert_partition(&steps, 120);
    }

    #[tokio::test]
    async fn gapped_planner_output_is_replaced_by_the_fallback() {
        let planner = FixedPlanner {
            steps: vec![
                PlannedStep {
                    id: None,
                    title: None,
                    description: None,
                    pages: "1-50".into(),
                    estimated_minutes: None,
                },
                // Gap: pages 51-59 are missing.
                PlannedStep {
                    id: None,
                    title: None,
                    description: None,
                    pages: "60-120".into(),
                    estimated_minutes: None,
                },
            ],
        };
        let segmenter = ReadingPlanSegmenter::new(Some(Arc::new(planner)));
        let steps = segmenter
            .segment(&book(120), Some(&profile(30, ReaderLevel::Intermediate)))
            .await;
        assert_partition(&steps, 120);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].page_range, "1-60");
    }

    #[tokio::test]
    async fn oversized_planner_range_is_replaced_by_the_fallback() {
        // A range far past the last page must never panic the normalizer.
        let planner = FixedPlanner {
            steps: vec![PlannedStep {
                id: None,
                title: None,
                description: None,
                pages: format!("1-{}", u32::MAX),
                estimated_minutes: None,
            }],
        };
        let segmenter = ReadingPlanSegmenter::new(Some(Arc::new(planner)));
        let steps = segmenter
            .segment(&book(300), Some(&profile(30, ReaderLevel::Intermediate)))
            .await;
        assert_partition(&steps, 300);
        assert_eq!(steps.len(), 5);
    }

    #[tokio::test]
    async fn fallback_handles_the_largest_allowed_book() {
        let segmenter = ReadingPlanSegmenter::new(None);
        let steps = segmenter
            .segment(&book(20_000), Some(&profile(30, ReaderLevel::Intermediate)))
            .await;
        assert_partition(&steps, 20_000);
        assert_eq!(steps.len(), 334);
    }

    #[tokio::test]
    async fn planner_failure_degrades_to_the_fallback() {
        let segmenter = ReadingPlanSegmenter::new(Some(Arc::new(BrokenPlanner)));
        let steps = segmenter
            .segment(&book(300), Some(&profile(30, ReaderLevel::Intermediate)))
            .await;
        assert_eq!(steps.len(), 5);
        assert_partition(&steps, 300);
    }
}

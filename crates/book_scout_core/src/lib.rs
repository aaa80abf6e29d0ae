pub mod aggregator;
pub mod annotator;
pub mod domain;
pub mod intent;
pub mod interests;
pub mod pipeline;
pub mod planner;
pub mod ports;
pub mod query;
pub mod ranker;
mod text;

pub use domain::{
    AggregatedResults, BookPlanSpec, CatalogItem, CatalogPage, ChatRole, ChatTurn, InterestTag,
    OnboardingProfile, PlannedStep, Price, ReaderLevel, ReadingPlanStep, ReadingSpeedModel,
    SearchQuery,
};
pub use pipeline::{
    DiscoveryPipeline, LoadMoreRequest, LoadMoreResponse, PipelineError, SearchRequest,
    SearchResponse,
};
pub use ports::{
    CatalogService, PlanGenerationService, PortError, PortResult, QueryRefinementService,
    ReasonGenerationService,
};

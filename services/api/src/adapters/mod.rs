pub mod catalog;
pub mod plan_llm;
pub mod query_llm;
pub mod reason_llm;

pub use catalog::GoogleBooksAdapter;
pub use plan_llm::CompletionPlanAdapter;
pub use query_llm::CompletionQueryAdapter;
pub use reason_llm::CompletionReasonAdapter;

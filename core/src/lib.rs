pub mod concurrent_map;
pub mod config;
pub mod dedup;
pub mod document;
pub mod error;
pub mod index;
pub mod process_queries;
pub mod query;
pub mod ranking;
pub mod request_queue;
pub mod search;
pub mod tokenizer;

pub use concurrent_map::ConcurrentMap;
pub use config::{SearchConfig, MAX_RESULT_DOCUMENT_COUNT};
pub use dedup::remove_duplicates;
pub use document::{Document, DocumentStatus};
pub use error::{Result, SearchError};
pub use index::{InvertedIndex, WordFrequencies};
pub use process_queries::{process_queries, process_queries_joined};
pub use request_queue::RequestQueue;
pub use search::{MatchResult, SearchServer};

/// Caller-assigned document identifier. Valid ids are non-negative.
pub type DocId = i32;

/// How an operation spreads its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    /// Fan out over the rayon thread pool.
    Parallel,
}

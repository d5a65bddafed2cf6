//! Collector module for continuous search collection
//!
//! This module contains the core collection logic, including:
//! - Sliding-window rate limiting over the shared query ledger
//! - Term catalog loading and lowest-score term scheduling
//! - Query construction and the HTTP search client
//! - Appending results and overall loop coordination

mod catalog;
mod coordinator;
mod query;
mod rate_limit;
mod scheduler;
mod search;
mod sink;

pub use catalog::{CatalogError, ConfigCatalog, FileCatalog, StaticCatalog, TermCatalog};
pub use coordinator::{run_collection, CollectionStats, Coordinator, FetchLog, LoopState, Tick};
pub use query::QueryBuilder;
pub use rate_limit::{format_timestamp, parse_timestamp, RateLimiter};
pub use scheduler::TermScheduler;
pub use search::{
    build_http_client, parse_search_response, HttpSearchClient, SearchClient, SearchError,
    SearchItem,
};
pub use sink::{append_results, encode_result, TERM_FIELD};

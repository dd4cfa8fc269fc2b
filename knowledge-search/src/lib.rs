//! C8 Search & Navigation Service (spec.md §4.8): a thin orchestrator over
//! C4's `SearchBackend` implementing hybrid retrieval, chunk dedup/boost,
//! optional cross-encoder reranking, personalization, and structural
//! navigation.

pub mod dedup;
pub mod error;
pub mod navigate;
pub mod personalize;
pub mod request;
pub mod service;

pub use error::SearchError;
pub use navigate::{Direction, NavigateRequest, NavigateResponse, NavigationMeta, NavigationService, Scope};
pub use request::{RankedHit, SearchRequest, SearchResponse};
pub use service::SearchService;

//! The search backend as consumed by this crate.
//!
//! Transport is left to implementors; the crate only builds request objects
//! and interprets responses.

use crate::search::planner::{MultiSearchRequest, Pagination, SuggestionQuery};
use crate::types::SearchResponse;
use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("search backend unreachable: {0}")]
    Transport(String),
    #[error("search backend returned {code}: {message}")]
    Status { code: u16, message: String },
    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A search engine answering suggestion lookups and unioned result searches.
pub trait SearchBackend: Send + Sync {
    /// Single-collection search used for suggestions.
    fn search(
        &self,
        query: &SuggestionQuery,
    ) -> impl Future<Output = Result<SearchResponse, BackendError>> + Send;

    /// Multi-search whose results the backend unions, removing duplicates.
    fn multi_search(
        &self,
        request: &MultiSearchRequest,
        pagination: Pagination,
    ) -> impl Future<Output = Result<SearchResponse, BackendError>> + Send;
}

/// Decode a raw JSON response body.
pub fn decode_response(body: &str) -> Result<SearchResponse, BackendError> {
    Ok(serde_json::from_str(body)?)
}

//! Search-side logic: turning backend hits into tag suggestions and the tag
//! store into backend requests.
//!
//! Resolution and ranking work on single suggestion responses; the filter
//! compiler and planner build result searches; the debouncer coalesces
//! keystroke-driven lookups.

pub mod debounce;
pub mod filter;
pub mod planner;
pub mod resolve;
pub mod suggest;

pub use debounce::Debouncer;
pub use filter::CompiledFilter;
pub use planner::{MultiSearchRequest, PageWindow, Pagination, SearchRequest, SuggestionQuery};
pub use suggest::{SuggestContext, SuggestionCandidate};

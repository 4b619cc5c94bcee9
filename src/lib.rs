pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod guide;
pub mod search;
pub mod server;
pub mod state;
pub mod tracing;
pub mod types;

pub use backend::{BackendError, SearchBackend};
pub use config::Config;
pub use dispatch::{Dispatcher, ResultsPage, ResultsView, Suggester};
pub use search::{
    CompiledFilter, Debouncer, MultiSearchRequest, PageWindow, Pagination, SearchRequest,
    SuggestionCandidate, SuggestionQuery,
};
pub use state::{Command, SearchState, TagGroup};
pub use types::{FieldMode, FieldType, GameDocument, SearchHit, SearchResponse, Tag, TagId};

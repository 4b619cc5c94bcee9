//! Error handling types and utilities.

use crate::backend::BackendError;
use crate::types::{ParseTagIdError, TagId};

/// A specialized Result type for facet-mcp operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Invalid input to a tool call.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(
        "unknown field '{0}' (expected one of: title, developer, publisher, genres, supportedOperatingSystems, none)"
    )]
    UnknownField(String),
    #[error("'{0}' has no AND/OR mode; only genres and supportedOperatingSystems do")]
    NoFieldMode(String),
    #[error(transparent)]
    InvalidTagId(#[from] ParseTagIdError),
    #[error("no tag with id {0}")]
    UnknownTag(TagId),
    #[error("invalid search response: {0}")]
    InvalidResponse(#[from] BackendError),
}

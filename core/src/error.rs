use crate::DocId;
use thiserror::Error;

/// Errors surfaced by index and query operations.
///
/// A failing call never mutates the index: it is left exactly as it was before
/// the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("document {0} is not in the index")]
    OutOfRange(DocId),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SearchError::InvalidArgument(msg.into())
    }
}
